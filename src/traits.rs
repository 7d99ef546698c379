//! Core traits every backend adapter must satisfy.

use crate::api::{BackendKind, GenerateRequest};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A per-backend translation layer between normalized requests and one
/// backend's native call convention.
///
/// Adapters are registered with
/// [`DispatcherBuilder::register_adapter`](crate::dispatcher::DispatcherBuilder::register_adapter)
/// and keyed by their [`kind`](BackendAdapter::kind). The dispatcher calls
/// [`probe`](BackendAdapter::probe) during construction and mode switches,
/// and [`setup`](BackendAdapter::setup) at most once per handle lifetime on
/// first use.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// The backend kind this adapter serves.
    fn kind(&self) -> BackendKind;

    /// Is this backend currently usable? Credential presence for cloud
    /// kinds, a liveness check for the local kind. Must never fail — an
    /// unreachable or misconfigured backend answers `false`.
    async fn probe(&self) -> bool;

    /// Construct the reusable client/session handle for this backend.
    ///
    /// Reads configuration through the kind's
    /// [`BackendDescriptor`](crate::api::BackendDescriptor). Fails with
    /// [`DispatchError::Config`](crate::error::DispatchError::Config) when a
    /// required credential is absent or a placeholder, or
    /// [`DispatchError::DependencyMissing`](crate::error::DispatchError::DependencyMissing)
    /// when the underlying client stack cannot be instantiated.
    async fn setup(&self) -> Result<Arc<dyn BackendHandle>>;
}

/// The constructed, reusable session for one backend kind.
///
/// A handle performs exactly one request/response exchange per
/// [`invoke`](BackendHandle::invoke) and holds no mutable per-call state, so
/// concurrent invocations on the same handle are safe.
#[async_trait]
pub trait BackendHandle: Send + Sync {
    /// Perform one generate exchange, returning the generated text.
    ///
    /// Unknown entries in the request's `extra` bag are forwarded as
    /// backend-native parameters; if the backend rejects them the rejection
    /// surfaces as [`DispatchError::Upstream`](crate::error::DispatchError::Upstream)
    /// with the backend's detail.
    async fn invoke(&self, request: &GenerateRequest) -> Result<String>;
}
