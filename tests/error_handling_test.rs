//! Tests for error variant coverage and propagation

use llm_relay::api::{BackendKind, GenerateRequest, Mode};
use llm_relay::dispatcher::Dispatcher;
use llm_relay::error::DispatchError;

mod common;
use common::mock_support::MockAdapter;

#[test]
fn test_error_display_config() {
    let err = DispatchError::Config("OPENAI_API_KEY env var not set".to_string());
    assert_eq!(
        err.to_string(),
        "Configuration error: OPENAI_API_KEY env var not set"
    );
}

#[test]
fn test_error_display_dependency_missing() {
    let err = DispatchError::DependencyMissing("OpenAI HTTP client: tls init".to_string());
    assert_eq!(
        err.to_string(),
        "Dependency missing: OpenAI HTTP client: tls init"
    );
}

#[test]
fn test_error_display_no_provider_configured() {
    let err = DispatchError::NoProviderConfigured("nothing usable".to_string());
    assert_eq!(err.to_string(), "No provider configured: nothing usable");
}

#[test]
fn test_error_display_provider_unavailable() {
    let err = DispatchError::ProviderUnavailable("openai".to_string());
    assert_eq!(err.to_string(), "Provider unavailable: openai");
}

#[test]
fn test_error_display_upstream() {
    let err = DispatchError::Upstream("Claude rate limited (429)".to_string());
    assert_eq!(err.to_string(), "Upstream error: Claude rate limited (429)");
}

#[test]
fn test_is_config_classification() {
    assert!(DispatchError::Config("x".to_string()).is_config());
    assert!(DispatchError::DependencyMissing("x".to_string()).is_config());
    assert!(DispatchError::NoProviderConfigured("x".to_string()).is_config());
    assert!(!DispatchError::ProviderUnavailable("x".to_string()).is_config());
    assert!(!DispatchError::Upstream("x".to_string()).is_config());
}

#[test]
fn test_error_is_debug() {
    let err = DispatchError::Config("test".to_string());
    let debug_str = format!("{:?}", err);
    assert!(debug_str.contains("Config"));
}

#[tokio::test]
async fn setup_failure_propagates_unchanged_in_kind() {
    let dispatcher = Dispatcher::builder()
        .register_adapter(MockAdapter::new(BackendKind::OpenAi).with_setup_failure())
        .mode(Mode::Cloud)
        .build()
        .await
        .unwrap();

    let err = dispatcher
        .call(&GenerateRequest::new("hi"), None)
        .await
        .unwrap_err();

    match err {
        DispatchError::Config(msg) => assert!(msg.contains("mock setup failure")),
        other => panic!("expected Config, got {other:?}"),
    }
}

#[tokio::test]
async fn invoke_failure_propagates_unchanged_in_kind() {
    let dispatcher = Dispatcher::builder()
        .register_adapter(
            MockAdapter::new(BackendKind::Claude)
                .with_invoke_error("Claude unavailable (503): overloaded"),
        )
        .mode(Mode::Cloud)
        .build()
        .await
        .unwrap();

    let err = dispatcher
        .call(&GenerateRequest::new("hi"), None)
        .await
        .unwrap_err();

    match err {
        DispatchError::Upstream(msg) => assert!(msg.contains("overloaded")),
        other => panic!("expected Upstream, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_call_is_not_retried_on_the_same_backend() {
    let invokes = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
    let dispatcher = Dispatcher::builder()
        .register_adapter(
            MockAdapter::new(BackendKind::OpenAi)
                .with_invoke_error("boom")
                .with_invoke_tracker(invokes.clone()),
        )
        .mode(Mode::Cloud)
        .build()
        .await
        .unwrap();

    let _ = dispatcher.call(&GenerateRequest::new("hi"), None).await;
    assert_eq!(invokes.load(std::sync::atomic::Ordering::SeqCst), 1);
}
