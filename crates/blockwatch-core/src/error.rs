//! Error types for Blockwatch

/// Result type alias using Blockwatch's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Blockwatch operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Synchronous creation-time refusals (missing content, self-target, nested reply)
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced content/user missing or not available to the caller
    #[error("not found: {0}")]
    NotFound(String),

    /// Bearer-credential verification failures
    #[error("authentication error: {0}")]
    Auth(String),

    /// Classifier execution errors
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Moderation-state machine violations (e.g. conflicting verdicts)
    #[error("invalid state transition: {0}")]
    State(String),

    /// Repository/blob storage errors
    #[error("storage error: {0}")]
    Storage(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout errors
    #[error("operation timed out")]
    Timeout,
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new classifier error
    pub fn classifier(msg: impl Into<String>) -> Self {
        Self::Classifier(msg.into())
    }

    /// Create a new state-transition error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
