//! Shared utilities for the HTTP backend adapters: client construction and
//! HTTP status mapping.

use crate::error::{DispatchError, Result};
use reqwest::Client;
use std::time::Duration;

/// Longest error-body excerpt carried into a [`DispatchError::Upstream`]
/// message.
const DETAIL_LIMIT: usize = 512;

/// Connect timeout for availability probes, so an absent local runtime
/// answers "unavailable" quickly instead of hanging.
pub(crate) const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Build the reusable HTTP client for a backend handle.
///
/// Client construction only fails when the TLS stack cannot be initialized,
/// which is the statically-linked analogue of a missing client library.
pub(crate) fn build_client(backend: &str) -> Result<Client> {
    Client::builder().build().map_err(|e| {
        DispatchError::DependencyMissing(format!("{} HTTP client: {}", backend, e))
    })
}

/// Map a reqwest transport error on the invoke path to an upstream failure.
pub(crate) fn transport_error(backend: &str, e: reqwest::Error) -> DispatchError {
    DispatchError::Upstream(format!("{} request failed: {}", backend, e))
}

/// Check a response status, consuming the body for detail on failure.
/// Returns `Ok(response)` when the status is 2xx.
pub(crate) async fn check_http_status(
    backend: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail: String = body.chars().take(DETAIL_LIMIT).collect();
    let detail = detail.trim();

    let msg = match status.as_u16() {
        429 => format!("{} rate limited (429): {}", backend, detail),
        401 | 403 => format!("{} rejected credentials ({}): {}", backend, status.as_u16(), detail),
        500..=599 => format!("{} unavailable ({}): {}", backend, status.as_u16(), detail),
        code => format!("{} API error ({}): {}", backend, code, detail),
    };
    Err(DispatchError::Upstream(msg))
}

/// Parse a response body as JSON, mapping decode failures to upstream errors.
pub(crate) async fn read_json(
    backend: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value> {
    response
        .json()
        .await
        .map_err(|e| DispatchError::Upstream(format!("{} returned invalid JSON: {}", backend, e)))
}
