//! Public API types: modes, backend kinds, the static backend descriptor
//! table, and the normalized request envelope.

use crate::error::{DispatchError, Result};
use serde::{Deserialize, Serialize};

/// The top-level choice between the local-runtime backend and cloud-API
/// backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Route to a locally hosted model server (Ollama).
    Local,
    /// Route to a cloud text-generation API (OpenAI, Claude, or Gemini).
    Cloud,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Cloud => write!(f, "cloud"),
        }
    }
}

/// One specific interchangeable backend.
///
/// Each kind belongs to exactly one [`Mode`]: [`Ollama`](Self::Ollama) is the
/// sole local kind; the other three are cloud kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local Ollama server.
    Ollama,
    /// OpenAI chat completions API.
    OpenAi,
    /// Anthropic Claude messages API.
    Claude,
    /// Google Gemini generateContent API.
    Gemini,
}

/// Every backend kind, in descriptor-table order.
pub const ALL_BACKENDS: [BackendKind; 4] = [
    BackendKind::Ollama,
    BackendKind::OpenAi,
    BackendKind::Claude,
    BackendKind::Gemini,
];

/// Immutable per-kind record: identifier, default model, required credential,
/// and the priority rank used for default selection.
///
/// This table is the extensibility seam — adding a backend means adding one
/// entry here plus one adapter; the dispatcher and prober need no changes.
#[derive(Debug, Clone, Copy)]
pub struct BackendDescriptor {
    /// Stable identifier string, matched case-sensitively when parsing.
    pub id: &'static str,
    /// The mode this kind is eligible under.
    pub mode: Mode,
    /// Model used when the request carries no explicit override.
    pub default_model: &'static str,
    /// Env var holding the credential. `None` for the local kind, whose
    /// availability is a liveness check rather than a config check.
    pub credential_env: Option<&'static str>,
    /// Default-selection tie-breaker; lower wins.
    pub priority: u8,
}

static DESCRIPTORS: [BackendDescriptor; 4] = [
    BackendDescriptor {
        id: "ollama",
        mode: Mode::Local,
        default_model: "qwen2.5",
        credential_env: None,
        priority: 0,
    },
    BackendDescriptor {
        id: "openai",
        mode: Mode::Cloud,
        default_model: "gpt-4o-mini",
        credential_env: Some("OPENAI_API_KEY"),
        priority: 0,
    },
    BackendDescriptor {
        id: "claude",
        mode: Mode::Cloud,
        default_model: "claude-3-5-sonnet-20241022",
        credential_env: Some("ANTHROPIC_API_KEY"),
        priority: 1,
    },
    BackendDescriptor {
        id: "gemini",
        mode: Mode::Cloud,
        default_model: "gemini-2.5-flash-lite",
        credential_env: Some("GOOGLE_API_KEY"),
        priority: 2,
    },
];

impl BackendKind {
    /// Look up this kind's [`BackendDescriptor`].
    pub fn descriptor(&self) -> &'static BackendDescriptor {
        match self {
            Self::Ollama => &DESCRIPTORS[0],
            Self::OpenAi => &DESCRIPTORS[1],
            Self::Claude => &DESCRIPTORS[2],
            Self::Gemini => &DESCRIPTORS[3],
        }
    }

    /// The stable identifier string (e.g. `"openai"`).
    pub fn id(&self) -> &'static str {
        self.descriptor().id
    }

    /// The mode this kind is eligible under.
    pub fn mode(&self) -> Mode {
        self.descriptor().mode
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = DispatchError;

    /// Parse a kind from its identifier string, matched case-sensitively.
    fn from_str(s: &str) -> Result<Self> {
        ALL_BACKENDS
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| DispatchError::Config(format!("Unknown backend '{}'", s)))
    }
}

/// The backend-agnostic request envelope: prompt in, text out.
///
/// Fields beyond `prompt` are optional; adapters fall back to backend
/// defaults when they are unset. `extra` is an open bag of backend-specific
/// parameters forwarded verbatim to the selected adapter — the dispatcher
/// does not validate or strip them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The user prompt. Must be non-empty.
    pub prompt: String,
    /// Optional system instruction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature. Conventionally in [0, 2]; not enforced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Explicit model identifier, overriding the descriptor default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Backend-specific parameters passed through without interpretation
    /// (e.g. `{"top_p": 0.9}`).
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    /// Build a request from a prompt alone, all other fields unset.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Resolve the model to use for `kind`: the explicit override if present,
    /// otherwise the descriptor default.
    pub fn model_for(&self, kind: BackendKind) -> &str {
        self.model
            .as_deref()
            .unwrap_or(kind.descriptor().default_model)
    }

    /// Validate invariants: the prompt must be non-empty and `max_tokens`
    /// positive when set.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(DispatchError::Config("Prompt cannot be empty".to_string()));
        }
        if self.max_tokens == Some(0) {
            return Err(DispatchError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
