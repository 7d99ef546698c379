#![allow(dead_code)]

//! Mock backend adapter shared by the integration test suite.

use async_trait::async_trait;
use llm_relay::api::{BackendKind, GenerateRequest};
use llm_relay::error::{DispatchError, Result};
use llm_relay::traits::{BackendAdapter, BackendHandle};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Mock adapter with configurable availability, setup behavior, and invoke
/// behavior. Counters are shared `Arc`s so tests can observe them after the
/// adapter has been moved into a dispatcher.
pub struct MockAdapter {
    kind: BackendKind,
    available: Arc<AtomicBool>,
    fail_on_setup: bool,
    invoke_error: Option<String>,
    response: String,
    setup_count: Arc<AtomicU32>,
    invoke_count: Arc<AtomicU32>,
    request_log: Arc<StdMutex<Vec<GenerateRequest>>>,
}

impl MockAdapter {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            available: Arc::new(AtomicBool::new(true)),
            fail_on_setup: false,
            invoke_error: None,
            response: "mock response".to_string(),
            setup_count: Arc::new(AtomicU32::new(0)),
            invoke_count: Arc::new(AtomicU32::new(0)),
            request_log: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    pub fn with_setup_failure(mut self) -> Self {
        self.fail_on_setup = true;
        self
    }

    pub fn with_invoke_error(mut self, message: impl Into<String>) -> Self {
        self.invoke_error = Some(message.into());
        self
    }

    pub fn with_response(mut self, text: impl Into<String>) -> Self {
        self.response = text.into();
        self
    }

    pub fn with_setup_tracker(mut self, tracker: Arc<AtomicU32>) -> Self {
        self.setup_count = tracker;
        self
    }

    pub fn with_invoke_tracker(mut self, tracker: Arc<AtomicU32>) -> Self {
        self.invoke_count = tracker;
        self
    }

    pub fn with_request_log(mut self, log: Arc<StdMutex<Vec<GenerateRequest>>>) -> Self {
        self.request_log = log;
        self
    }

    /// Shared availability flag, for flipping reachability after the
    /// adapter has been handed to a dispatcher.
    pub fn availability_flag(&self) -> Arc<AtomicBool> {
        self.available.clone()
    }
}

#[async_trait]
impl BackendAdapter for MockAdapter {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn probe(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn setup(&self) -> Result<Arc<dyn BackendHandle>> {
        self.setup_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_on_setup {
            return Err(DispatchError::Config(format!(
                "mock setup failure for '{}'",
                self.kind
            )));
        }

        Ok(Arc::new(MockHandle {
            invoke_error: self.invoke_error.clone(),
            response: self.response.clone(),
            invoke_count: self.invoke_count.clone(),
            request_log: self.request_log.clone(),
        }))
    }
}

struct MockHandle {
    invoke_error: Option<String>,
    response: String,
    invoke_count: Arc<AtomicU32>,
    request_log: Arc<StdMutex<Vec<GenerateRequest>>>,
}

#[async_trait]
impl BackendHandle for MockHandle {
    async fn invoke(&self, request: &GenerateRequest) -> Result<String> {
        self.invoke_count.fetch_add(1, Ordering::SeqCst);
        self.request_log.lock().unwrap().push(request.clone());

        if let Some(message) = &self.invoke_error {
            return Err(DispatchError::Upstream(message.clone()));
        }

        Ok(self.response.clone())
    }
}
