use thiserror::Error;

/// Core error types for intop model operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid resource reference: {0}")]
    InvalidResourceSpec(String),

    #[error("Invalid label selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid priority label {value:?} on kit {kit}")]
    InvalidPriority { kit: String, value: String },

    #[error("Invalid health check payload: {0}")]
    InvalidHealthCheck(#[source] serde_json::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CoreError {
    /// Create a new InvalidResourceSpec error
    pub fn invalid_resource_spec(spec: impl Into<String>) -> Self {
        Self::InvalidResourceSpec(spec.into())
    }

    /// Create a new InvalidSelector error
    pub fn invalid_selector(message: impl Into<String>) -> Self {
        Self::InvalidSelector(message.into())
    }

    /// Create a new InvalidPriority error
    pub fn invalid_priority(kit: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidPriority {
            kit: kit.into(),
            value: value.into(),
        }
    }

    /// Check if this error was caused by user supplied data
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidResourceSpec(_) | Self::InvalidPriority { .. } | Self::InvalidSelector(_)
        )
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
