use thiserror::Error;

/// Errors that can arise while driving the stat/economy engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Referencing something that was never created (unknown item ids,
    /// mostly; players are auto-created on first touch).
    #[error("not found: {0}")]
    NotFound(String),

    /// Energy, coins, or inventory quantity too low for the requested action.
    #[error("insufficient {resource}: have {have}, need {need}")]
    InsufficientResource {
        resource: &'static str,
        have: i64,
        need: i64,
    },

    /// Non-positive amounts, unknown stat names, out-of-range values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Action attempted before its gate elapsed.
    #[error("cooldown active for {action}: {remaining_seconds}s remaining")]
    CooldownActive {
        action: String,
        remaining_seconds: i64,
    },

    /// Wrapper around IO errors from the snapshot file.
    #[error("persistence io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapper around snapshot serialization and deserialization errors.
    #[error("persistence serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// True when the error is a persistence failure rather than a rule
    /// violation. Callers use this to decide whether in-memory state moved.
    pub fn is_persistence(&self) -> bool {
        matches!(self, EngineError::Io(_) | EngineError::Json(_))
    }
}
