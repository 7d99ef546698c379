//! Unified dispatch layer for local and cloud text-generation backends.
//!
//! llm-relay routes one normalized "generate text" request to exactly one of
//! several interchangeable backends: a locally hosted Ollama server, or the
//! OpenAI, Anthropic Claude, or Google Gemini APIs.
//!
//! # Key concepts
//!
//! - **[`Dispatcher`](dispatcher::Dispatcher)** — the caller facade that owns
//!   the active [`Mode`](api::Mode), probes which backends are usable, and
//!   selects exactly one backend per call by a deterministic priority policy.
//! - **[`BackendKind`](api::BackendKind)** — one interchangeable backend
//!   identity, described by a static [`BackendDescriptor`](api::BackendDescriptor)
//!   (default model, required credential, priority rank).
//! - **Adapters** — per-kind implementations of
//!   [`BackendAdapter`](traits::BackendAdapter) that translate a
//!   [`GenerateRequest`](api::GenerateRequest) into the backend's native call
//!   and normalize the response or failure.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use llm_relay::api::{GenerateRequest, Mode};
//! use llm_relay::dispatcher::Dispatcher;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Dispatcher::connect(Mode::Cloud, None).await?;
//!
//! let mut request = GenerateRequest::new("Name three rivers.");
//! request.system = Some("You are a helpful assistant.".into());
//! request.temperature = Some(0.7);
//!
//! let text = dispatcher.call(&request, None).await?;
//! println!("{text}");
//! # Ok(())
//! # }
//! ```
//!
//! Selection is deterministic: an explicit per-call preference wins (and
//! fails rather than falling back when unavailable), then the
//! construction-time preference, then the best priority rank among available
//! backends. At most one backend is attempted per call, so failures are
//! always attributable.

pub mod api;
pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod traits;

#[cfg(test)]
mod mock;
