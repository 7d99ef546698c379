use crate::api::{BackendKind, GenerateRequest};
use crate::backend::http_common::{build_client, check_http_status, read_json, transport_error};
use crate::config::resolve_credential;
use crate::error::{DispatchError, Result};
use crate::traits::{BackendAdapter, BackendHandle};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

/// Adapter for the [Google Gemini API](https://ai.google.dev/api) `generateContent`
/// endpoint.
///
/// Requires the `GOOGLE_API_KEY` environment variable.
#[derive(Default)]
pub struct RemoteGeminiAdapter;

impl RemoteGeminiAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BackendAdapter for RemoteGeminiAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    async fn probe(&self) -> bool {
        crate::config::credential_configured("GOOGLE_API_KEY")
    }

    async fn setup(&self) -> Result<Arc<dyn BackendHandle>> {
        let api_key = resolve_credential("GOOGLE_API_KEY")?;
        let client = build_client("Gemini")?;
        Ok(Arc::new(GeminiHandle { client, api_key }))
    }
}

struct GeminiHandle {
    client: Client,
    api_key: String,
}

/// Build the generateContent request body. The system instruction maps to
/// `systemInstruction`, sampling fields to `generationConfig`, and entries in
/// the `extra` bag are merged into `generationConfig` as native keys.
fn build_generate_payload(request: &GenerateRequest) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    payload.insert(
        "contents".to_string(),
        json!([{ "role": "user", "parts": [{ "text": request.prompt }] }]),
    );

    if let Some(system) = &request.system {
        payload.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": system }] }),
        );
    }

    let mut generation_config = serde_json::Map::new();
    if let Some(temperature) = request.temperature {
        generation_config.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = request.max_tokens {
        generation_config.insert("maxOutputTokens".to_string(), json!(max_tokens));
    }
    for (key, value) in &request.extra {
        generation_config.insert(key.clone(), value.clone());
    }
    if !generation_config.is_empty() {
        payload.insert(
            "generationConfig".to_string(),
            serde_json::Value::Object(generation_config),
        );
    }

    serde_json::Value::Object(payload)
}

#[async_trait]
impl BackendHandle for GeminiHandle {
    async fn invoke(&self, request: &GenerateRequest) -> Result<String> {
        let model = request.model_for(BackendKind::Gemini);
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            model, self.api_key
        );
        let payload = build_generate_payload(request);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("Gemini", e))?;

        let body = read_json("Gemini", check_http_status("Gemini", response).await?).await?;

        body.get("candidates")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .and_then(|arr| arr.first())
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DispatchError::Upstream("Gemini response missing candidate text".to_string())
            })
    }
}
