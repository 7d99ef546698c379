//! Error types for the llm-relay dispatch layer.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Unified error type covering configuration, backend selection, and upstream
/// failures.
///
/// Variants are the failure *kinds* callers are expected to match on — they
/// distinguish "fix your config" from "backend rejected your request" from
/// "backend totally unavailable" without leaking per-backend detail into the
/// type itself.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// A required credential is absent or a placeholder, or the request
    /// itself is invalid (e.g. empty prompt).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The client stack for a backend could not be instantiated.
    #[error("Dependency missing: {0}")]
    DependencyMissing(String),

    /// After probing, zero backends are usable for the active mode.
    #[error("No provider configured: {0}")]
    NoProviderConfigured(String),

    /// An explicitly named backend is not in the current availability set.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The selected backend was reached but returned an error (bad request,
    /// rate limit, auth rejection, malformed response).
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl DispatchError {
    /// Returns `true` for errors the caller can only fix by changing their
    /// configuration: [`Config`](Self::Config),
    /// [`DependencyMissing`](Self::DependencyMissing), and
    /// [`NoProviderConfigured`](Self::NoProviderConfigured).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::DependencyMissing(_) | Self::NoProviderConfigured(_)
        )
    }
}
