use crate::api::{BackendKind, GenerateRequest};
use crate::backend::http_common::{build_client, check_http_status, read_json, transport_error};
use crate::config::resolve_credential;
use crate::error::{DispatchError, Result};
use crate::traits::{BackendAdapter, BackendHandle};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires `max_tokens`; this is the value used when the
/// request leaves it unset.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Adapter for the [Anthropic Messages API](https://docs.anthropic.com/en/api/messages).
///
/// Requires the `ANTHROPIC_API_KEY` environment variable.
#[derive(Default)]
pub struct RemoteClaudeAdapter;

impl RemoteClaudeAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackendAdapter for RemoteClaudeAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Claude
    }

    async fn probe(&self) -> bool {
        crate::config::credential_configured("ANTHROPIC_API_KEY")
    }

    async fn setup(&self) -> Result<Arc<dyn BackendHandle>> {
        let api_key = resolve_credential("ANTHROPIC_API_KEY")?;
        let client = build_client("Claude")?;
        Ok(Arc::new(ClaudeHandle { client, api_key }))
    }
}

struct ClaudeHandle {
    client: Client,
    api_key: String,
}

/// Build the messages request body. The system instruction is a top-level
/// field (not a message role), and entries in the `extra` bag land at the
/// top level.
fn build_messages_payload(model: &str, request: &GenerateRequest) -> serde_json::Value {
    let mut body = json!({
        "model": model,
        "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        "messages": [{ "role": "user", "content": request.prompt }],
    });

    if let Some(system) = &request.system {
        body["system"] = json!(system);
    }
    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    for (key, value) in &request.extra {
        body[key.as_str()] = value.clone();
    }

    body
}

#[async_trait]
impl BackendHandle for ClaudeHandle {
    async fn invoke(&self, request: &GenerateRequest) -> Result<String> {
        let model = request.model_for(BackendKind::Claude);
        let body = build_messages_payload(model, request);

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Claude", e))?;

        let body = read_json("Claude", check_http_status("Claude", response).await?).await?;

        body.get("content")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|item| item.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DispatchError::Upstream("Claude response missing content text".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_defaults_max_tokens_to_1024() {
        let body = build_messages_payload("claude-3-5-sonnet-20241022", &GenerateRequest::new("hi"));
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn payload_uses_explicit_max_tokens() {
        let mut req = GenerateRequest::new("hi");
        req.max_tokens = Some(512);
        let body = build_messages_payload("claude-3-5-sonnet-20241022", &req);
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn system_is_a_top_level_field_not_a_message() {
        let mut req = GenerateRequest::new("question");
        req.system = Some("be terse".to_string());
        let body = build_messages_payload("claude-3-5-sonnet-20241022", &req);

        assert_eq!(body["system"], "be terse");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn payload_omits_system_when_unset() {
        let body = build_messages_payload("claude-3-5-sonnet-20241022", &GenerateRequest::new("hi"));
        assert!(body.get("system").is_none());
    }

    #[test]
    fn extra_bag_is_forwarded_at_top_level() {
        let mut req = GenerateRequest::new("hi");
        req.extra.insert("top_k".to_string(), json!(40));
        let body = build_messages_payload("claude-3-5-sonnet-20241022", &req);
        assert_eq!(body["top_k"], json!(40));
    }
}
