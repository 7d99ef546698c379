use crate::api::{BackendKind, GenerateRequest};
use crate::backend::http_common::{build_client, check_http_status, read_json, transport_error};
use crate::config::resolve_credential;
use crate::error::{DispatchError, Result};
use crate::traits::{BackendAdapter, BackendHandle};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Adapter for the [OpenAI chat completions API](https://platform.openai.com/docs/api-reference/chat).
///
/// Requires the `OPENAI_API_KEY` environment variable.
#[derive(Default)]
pub struct RemoteOpenAIAdapter;

impl RemoteOpenAIAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackendAdapter for RemoteOpenAIAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::OpenAi
    }

    async fn probe(&self) -> bool {
        crate::config::credential_configured("OPENAI_API_KEY")
    }

    async fn setup(&self) -> Result<Arc<dyn BackendHandle>> {
        let api_key = resolve_credential("OPENAI_API_KEY")?;
        let client = build_client("OpenAI")?;
        Ok(Arc::new(OpenAIHandle { client, api_key }))
    }
}

struct OpenAIHandle {
    client: Client,
    api_key: String,
}

/// Build the chat-completions request body. Entries in the request's `extra`
/// bag land at the top level, as native API parameters.
fn build_chat_payload(model: &str, request: &GenerateRequest) -> serde_json::Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(temperature) = request.temperature {
        body["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = request.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    for (key, value) in &request.extra {
        body[key.as_str()] = value.clone();
    }

    body
}

#[async_trait]
impl BackendHandle for OpenAIHandle {
    async fn invoke(&self, request: &GenerateRequest) -> Result<String> {
        let model = request.model_for(BackendKind::OpenAi);
        let body = build_chat_payload(model, request);

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", e))?;

        let body = read_json("OpenAI", check_http_status("OpenAI", response).await?).await?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DispatchError::Upstream("OpenAI response missing message content".to_string())
            })
    }
}
