//! Credential resolution from the environment, including detection of
//! documented placeholder values.

use crate::error::{DispatchError, Result};

/// Returns `true` when `value` is one of the documented "not really
/// configured" shapes: empty, a truncated example ending in `...`, or the
/// `.env` template form `your_*_here`.
///
/// This is deliberately a narrow, exact predicate — a real key that happens
/// to contain `your` must not be rejected.
pub fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.ends_with("...")
        || (trimmed.starts_with("your_") && trimmed.ends_with("_here"))
}

/// Returns `true` when `env_var` is set to a real (non-placeholder) value.
///
/// This is the probe-time form of [`resolve_credential`]: same predicate,
/// boolean answer, no error construction.
pub fn credential_configured(env_var: &str) -> bool {
    std::env::var(env_var).is_ok_and(|v| !is_placeholder(&v))
}

/// Read a credential from `env_var`, failing with
/// [`DispatchError::Config`] when it is unset or a placeholder.
pub fn resolve_credential(env_var: &str) -> Result<String> {
    match std::env::var(env_var) {
        Ok(value) if !is_placeholder(&value) => Ok(value),
        Ok(_) => Err(DispatchError::Config(format!(
            "{} is set to a placeholder value",
            env_var
        ))),
        Err(_) => Err(DispatchError::Config(format!("{} env var not set", env_var))),
    }
}
