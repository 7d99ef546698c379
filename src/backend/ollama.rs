use crate::api::{BackendKind, GenerateRequest};
use crate::backend::http_common::{
    PROBE_CONNECT_TIMEOUT, build_client, check_http_status, read_json, transport_error,
};
use crate::error::{DispatchError, Result};
use crate::traits::{BackendAdapter, BackendHandle};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Adapter for a local [Ollama](https://ollama.com) server.
///
/// The base URL comes from the `OLLAMA_HOST` environment variable when set
/// (scheme optional, `http://` assumed), otherwise `http://localhost:11434`.
/// Availability is a liveness check against the list-models endpoint
/// (`GET /api/tags`), so an unreachable server marks the kind unavailable
/// rather than failing the probe.
pub struct LocalOllamaAdapter {
    base_url: String,
}

impl Default for LocalOllamaAdapter {
    fn default() -> Self {
        Self {
            base_url: resolve_base_url(),
        }
    }
}

impl LocalOllamaAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the adapter at a non-default server address.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
        }
    }
}

fn resolve_base_url() -> String {
    match std::env::var("OLLAMA_HOST") {
        Ok(host) if !host.trim().is_empty() => normalize_base_url(&host),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

/// `OLLAMA_HOST` conventionally accepts bare `host:port` values.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl BackendAdapter for LocalOllamaAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn probe(&self) -> bool {
        let Ok(client) = Client::builder()
            .connect_timeout(PROBE_CONNECT_TIMEOUT)
            .timeout(PROBE_CONNECT_TIMEOUT * 2)
            .build()
        else {
            return false;
        };

        match client.get(format!("{}/api/tags", self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn setup(&self) -> Result<Arc<dyn BackendHandle>> {
        let client = build_client("Ollama")?;
        Ok(Arc::new(OllamaHandle {
            client,
            base_url: self.base_url.clone(),
        }))
    }
}

struct OllamaHandle {
    client: Client,
    base_url: String,
}

/// Build the `/api/chat` request body. Sampling fields and the `extra` bag
/// go into the `options` object, matching Ollama's native parameter names
/// (`num_predict` for the output length cap). Streaming is disabled — this
/// layer normalizes a single request/response exchange.
fn build_chat_payload(model: &str, request: &GenerateRequest) -> serde_json::Value {
    let mut messages = Vec::new();
    if let Some(system) = &request.system {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    let mut options = serde_json::Map::new();
    if let Some(temperature) = request.temperature {
        options.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = request.max_tokens {
        options.insert("num_predict".to_string(), json!(max_tokens));
    }
    for (key, value) in &request.extra {
        options.insert(key.clone(), value.clone());
    }

    let mut body = json!({
        "model": model,
        "messages": messages,
        "stream": false,
    });
    if !options.is_empty() {
        body["options"] = serde_json::Value::Object(options);
    }

    body
}

#[async_trait]
impl BackendHandle for OllamaHandle {
    async fn invoke(&self, request: &GenerateRequest) -> Result<String> {
        let model = request.model_for(BackendKind::Ollama);
        let body = build_chat_payload(model, request);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("Ollama", e))?;

        let body = read_json("Ollama", check_http_status("Ollama", response).await?).await?;

        body.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DispatchError::Upstream("Ollama response missing message content".to_string())
            })
    }
}
