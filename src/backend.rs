//! Backend adapter implementations, one per [`BackendKind`](crate::api::BackendKind).
//!
//! | Module | Kind | API |
//! |--------|------|-----|
//! | `ollama` | `ollama` | local Ollama server (`/api/chat`) |
//! | `openai` | `openai` | OpenAI chat completions |
//! | `claude` | `claude` | Anthropic messages |
//! | `gemini` | `gemini` | Google Gemini generateContent |
//!
//! Each adapter translates the normalized [`GenerateRequest`](crate::api::GenerateRequest)
//! into its backend's native HTTP shape and normalizes the response or
//! failure. Payload construction is kept in pure functions so the wire
//! shapes are unit-testable without a network.

pub(crate) mod http_common;

pub mod claude;
pub mod gemini;
pub mod ollama;
pub mod openai;

// Re-exports (same order as module declarations above).
pub use claude::RemoteClaudeAdapter;
pub use gemini::RemoteGeminiAdapter;
pub use ollama::LocalOllamaAdapter;
pub use openai::RemoteOpenAIAdapter;
