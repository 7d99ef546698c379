//! The caller facade: owns the active mode, the availability set, and the
//! lazily-constructed backend handles, and routes each call to exactly one
//! backend.

use crate::api::{BackendKind, GenerateRequest, Mode};
use crate::error::{DispatchError, Result};
use crate::traits::{BackendAdapter, BackendHandle};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Unified dispatch over interchangeable text-generation backends.
///
/// Obtain an instance via [`Dispatcher::connect`] (the four built-in
/// adapters) or [`Dispatcher::builder`] (explicit adapter registration).
/// Construction probes availability for the requested [`Mode`] and is
/// all-or-nothing: a dispatcher with zero usable backends does not exist.
///
/// Backend handles are built lazily on first use, exactly once per handle
/// lifetime, and cached until the next [`switch_mode`](Self::switch_mode).
pub struct Dispatcher {
    adapters: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    preferred: Option<BackendKind>,
    state: RwLock<DispatchState>,
    handles: RwLock<HashMap<BackendKind, Arc<dyn BackendHandle>>>,
    /// Per-kind in-flight setup slots: concurrent first calls queue on the
    /// slot and share the one outcome, success or failure.
    setup_flights: Mutex<HashMap<BackendKind, Arc<SetupSlot>>>,
}

/// Outcome slot for one setup burst. `None` until the loader finishes; every
/// caller queued on the slot reads the stored result instead of re-running
/// `setup()`.
type SetupSlot = Mutex<Option<Result<Arc<dyn BackendHandle>>>>;

/// Mode plus the availability set probed for it. Always replaced together so
/// the set can never disagree with the mode.
struct DispatchState {
    mode: Mode,
    availability: HashMap<BackendKind, bool>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("preferred", &self.preferred)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a new [`DispatcherBuilder`].
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Construct a dispatcher with the four built-in adapters.
    ///
    /// `preferred` is a backend identifier (`"ollama"`, `"openai"`,
    /// `"claude"`, `"gemini"`), matched case-sensitively.
    pub async fn connect(mode: Mode, preferred: Option<&str>) -> Result<Arc<Self>> {
        let mut builder = Self::builder()
            .register_adapter(crate::backend::LocalOllamaAdapter::new())
            .register_adapter(crate::backend::RemoteOpenAIAdapter::new())
            .register_adapter(crate::backend::RemoteClaudeAdapter::new())
            .register_adapter(crate::backend::RemoteGeminiAdapter::new())
            .mode(mode);
        if let Some(name) = preferred {
            builder = builder.preferred(name.parse()?);
        }
        builder.build().await
    }

    /// The currently active mode.
    pub async fn mode(&self) -> Mode {
        self.state.read().await.mode
    }

    /// Available backends for the current mode, in priority order.
    /// Read-only; no side effects.
    pub async fn list_available(&self) -> Vec<BackendKind> {
        let state = self.state.read().await;
        let mut kinds: Vec<BackendKind> = state
            .availability
            .iter()
            .filter(|&(_, &available)| available)
            .map(|(&kind, _)| kind)
            .collect();
        kinds.sort_by_key(|kind| kind.descriptor().priority);
        kinds
    }

    /// Switch between local and cloud mode, re-probing availability.
    ///
    /// Fails with [`DispatchError::NoProviderConfigured`] when the new mode
    /// has zero usable backends; the dispatcher then keeps its previous
    /// mode, availability set, and handles. On success the handle cache is
    /// cleared — handles are mode-specific and must not be reused across a
    /// switch. In-flight calls hold their own handle references and are not
    /// torn down.
    pub async fn switch_mode(&self, new_mode: Mode) -> Result<()> {
        let availability = probe_availability(&self.adapters, new_mode).await;
        ensure_any_available(new_mode, &self.adapters, &availability)?;

        {
            let mut state = self.state.write().await;
            state.mode = new_mode;
            state.availability = availability;
        }
        {
            let mut handles = self.handles.write().await;
            handles.clear();
        }

        tracing::info!(mode = %new_mode, "Switched dispatch mode");
        Ok(())
    }

    /// Route one normalized request to exactly one backend and return the
    /// generated text.
    ///
    /// Selection, first match wins: the `preferred` argument (must be
    /// available, else [`DispatchError::ProviderUnavailable`] — no silent
    /// fallback); the construction-time preference, if available; the
    /// available kind with the best priority rank. A failure from the
    /// selected backend's setup or invoke propagates unchanged in kind —
    /// at most one backend is attempted per call.
    pub async fn call(
        &self,
        request: &GenerateRequest,
        preferred: Option<BackendKind>,
    ) -> Result<String> {
        request.validate()?;

        let kind = {
            let state = self.state.read().await;
            self.select_backend(&state, preferred)?
        };

        let handle = self.ensure_handle(kind).await?;

        tracing::info!(backend = %kind, "Dispatching generate call");
        let start = std::time::Instant::now();
        let result = handle.invoke(request).await;
        metrics::histogram!("dispatch.duration_seconds", "backend" => kind.id())
            .record(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => {
                metrics::counter!("dispatch.calls", "backend" => kind.id(), "status" => "success")
                    .increment(1);
            }
            Err(e) => {
                metrics::counter!("dispatch.calls", "backend" => kind.id(), "status" => "failure")
                    .increment(1);
                tracing::error!(backend = %kind, error = %e, "Generate call failed");
            }
        }

        result
    }

    fn select_backend(
        &self,
        state: &DispatchState,
        per_call: Option<BackendKind>,
    ) -> Result<BackendKind> {
        let is_available =
            |kind: BackendKind| state.availability.get(&kind).copied().unwrap_or(false);

        if let Some(kind) = per_call {
            return if is_available(kind) {
                Ok(kind)
            } else {
                Err(DispatchError::ProviderUnavailable(format!(
                    "Backend '{}' is not available in {} mode",
                    kind, state.mode
                )))
            };
        }

        if let Some(preferred) = self.preferred
            && is_available(preferred)
        {
            return Ok(preferred);
        }

        state
            .availability
            .iter()
            .filter(|&(_, &available)| available)
            .map(|(&kind, _)| kind)
            .min_by_key(|kind| kind.descriptor().priority)
            .ok_or_else(|| {
                DispatchError::NoProviderConfigured(no_provider_message(
                    state.mode,
                    &self.adapters,
                ))
            })
    }

    /// Return the cached handle for `kind`, building it on first use.
    /// Concurrent first calls queue on a per-kind slot: exactly one runs
    /// `setup()` and the rest read its outcome, success or failure. The slot
    /// is retired once the loader finishes, so a later, non-concurrent call
    /// after a failure starts a fresh attempt.
    async fn ensure_handle(&self, kind: BackendKind) -> Result<Arc<dyn BackendHandle>> {
        // Fast path: already built
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(&kind) {
                return Ok(handle.clone());
            }
        }

        let slot = {
            let mut flights = self.setup_flights.lock().await;
            flights
                .entry(kind)
                .or_insert_with(|| Arc::new(Mutex::new(None)))
                .clone()
        };

        let mut outcome = slot.lock().await;
        if let Some(result) = outcome.as_ref() {
            // A concurrent first call already ran setup for this burst.
            return result.clone();
        }

        // Double-check after acquiring the slot: an earlier burst may have
        // published a handle between our fast-path miss and now.
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(&kind) {
                let result = Ok(handle.clone());
                *outcome = Some(result.clone());
                let mut flights = self.setup_flights.lock().await;
                flights.remove(&kind);
                return result;
            }
        }

        let result = match self.adapters.get(&kind) {
            None => Err(DispatchError::ProviderUnavailable(format!(
                "No adapter registered for '{}'",
                kind
            ))),
            Some(adapter) => {
                tracing::info!(backend = %kind, "Setting up backend handle");
                let start = std::time::Instant::now();
                let result = adapter.setup().await;
                metrics::histogram!("backend_setup.duration_seconds", "backend" => kind.id())
                    .record(start.elapsed().as_secs_f64());

                match result {
                    Ok(handle) => {
                        metrics::counter!("backend_setup.total", "status" => "success")
                            .increment(1);
                        let mut handles = self.handles.write().await;
                        handles.insert(kind, handle.clone());
                        Ok(handle)
                    }
                    Err(e) => {
                        metrics::counter!("backend_setup.total", "status" => "failure")
                            .increment(1);
                        tracing::error!(backend = %kind, error = %e, "Backend setup failed");
                        Err(e)
                    }
                }
            }
        };

        // Publish the outcome for callers queued on this slot, then retire
        // the slot so later calls start a fresh attempt. The flights map is
        // only ever locked briefly and never across a slot acquisition, so
        // taking it while holding the slot cannot deadlock.
        *outcome = Some(result.clone());
        {
            let mut flights = self.setup_flights.lock().await;
            flights.remove(&kind);
        }

        result
    }
}

/// Probe every registered adapter, returning a complete availability set:
/// kinds ineligible under `mode` are present and `false`.
async fn probe_availability(
    adapters: &HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    mode: Mode,
) -> HashMap<BackendKind, bool> {
    let mut availability = HashMap::new();
    for (&kind, adapter) in adapters {
        let available = kind.mode() == mode && adapter.probe().await;
        tracing::debug!(backend = %kind, available, "Probed backend");
        availability.insert(kind, available);
    }
    availability
}

fn ensure_any_available(
    mode: Mode,
    adapters: &HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    availability: &HashMap<BackendKind, bool>,
) -> Result<()> {
    if availability.values().any(|&available| available) {
        Ok(())
    } else {
        Err(DispatchError::NoProviderConfigured(no_provider_message(
            mode, adapters,
        )))
    }
}

fn no_provider_message(
    mode: Mode,
    adapters: &HashMap<BackendKind, Arc<dyn BackendAdapter>>,
) -> String {
    let mut eligible: Vec<BackendKind> = adapters
        .keys()
        .copied()
        .filter(|kind| kind.mode() == mode)
        .collect();
    eligible.sort_by_key(|kind| kind.descriptor().priority);

    match mode {
        Mode::Local => format!(
            "No local backend reachable ({})",
            eligible
                .iter()
                .map(|k| k.id())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Mode::Cloud => {
            let keys: Vec<&str> = eligible
                .iter()
                .filter_map(|kind| kind.descriptor().credential_env)
                .collect();
            format!(
                "No cloud backend configured; set at least one of: {}",
                keys.join(", ")
            )
        }
    }
}

/// Builder for a [`Dispatcher`] with registered adapters, a mode, and an
/// optional construction-time preference.
#[derive(Default)]
pub struct DispatcherBuilder {
    adapters: HashMap<BackendKind, Arc<dyn BackendAdapter>>,
    mode: Option<Mode>,
    preferred: Option<BackendKind>,
}

impl DispatcherBuilder {
    /// Register an adapter. Its [`kind`](BackendAdapter::kind) is the lookup
    /// key; registering a second adapter for the same kind replaces the
    /// first.
    pub fn register_adapter<A: BackendAdapter + 'static>(mut self, adapter: A) -> Self {
        self.adapters.insert(adapter.kind(), Arc::new(adapter));
        self
    }

    /// Set the dispatch mode. Defaults to [`Mode::Local`].
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Set the construction-time preferred backend. Used by selection only
    /// when it is available; an unavailable preference falls through to the
    /// priority order rather than failing construction.
    pub fn preferred(mut self, kind: BackendKind) -> Self {
        self.preferred = Some(kind);
        self
    }

    /// Probe availability for the configured mode and return the
    /// constructed dispatcher.
    ///
    /// Fails with [`DispatchError::NoProviderConfigured`] when no backend
    /// is usable — misconfiguration surfaces here, not on first call.
    pub async fn build(self) -> Result<Arc<Dispatcher>> {
        let mode = self.mode.unwrap_or(Mode::Local);
        let availability = probe_availability(&self.adapters, mode).await;
        ensure_any_available(mode, &self.adapters, &availability)?;

        tracing::info!(
            mode = %mode,
            available = ?availability
                .iter()
                .filter(|&(_, &a)| a)
                .map(|(k, _)| k.id())
                .collect::<Vec<_>>(),
            "Dispatcher constructed"
        );

        Ok(Arc::new(Dispatcher {
            adapters: self.adapters,
            preferred: self.preferred,
            state: RwLock::new(DispatchState { mode, availability }),
            handles: RwLock::new(HashMap::new()),
            setup_flights: Mutex::new(HashMap::new()),
        }))
    }
}
