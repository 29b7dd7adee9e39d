use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `pressgate`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains at the HTTP and storage edges.
///
/// Note that an exhausted gate cycle is NOT an error: it returns
/// [`crate::gate::GateStatus::Failed`] so batch callers can log it and keep
/// processing other subjects.
#[derive(Debug, Error)]
pub enum PressgateError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Generation provider ─────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Experiment tracking ─────────────────────────────────────────────
    #[error("experiment: {0}")]
    Experiment(#[from] ExperimentError),

    // ── Experiment persistence ──────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Generation provider errors ──────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider {provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("provider {provider} API key not set")]
    MissingApiKey { provider: String },

    #[error("provider {provider} response decode failed: {message}")]
    Decode { provider: String, message: String },
}

// ─── Experiment errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("experiment already exists for subject {subject}")]
    DuplicateExperiment { subject: String },

    #[error("no experiment for subject {subject}")]
    UnknownExperiment { subject: String },

    #[error("variant {variant_id} not in experiment for subject {subject}")]
    UnknownVariant { subject: String, variant_id: String },
}

// ─── Store errors ────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("open: {0}")]
    Open(String),

    #[error("query: {0}")]
    Query(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err.to_string())
    }
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PressgateError>;
