//! Error types for the process engine

use thiserror::Error;

/// Result type alias using ProcessEngineError
pub type Result<T> = std::result::Result<T, ProcessEngineError>;

/// Errors that can occur in the process engine
///
/// Validation findings are not errors; they are returned as data in a
/// `ValidationReport`. Only conditions that leave no usable diagram surface here.
#[derive(Debug, Error)]
pub enum ProcessEngineError {
    /// The diagram document could not be parsed
    #[error("Failed to load diagram: {0}")]
    DiagramLoad(String),

    /// No diagram has been imported yet
    #[error("No diagram loaded")]
    NotReady,

    /// Element lookup failed
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A rule failed to run
    #[error("Rule '{rule_id}' failed: {message}")]
    RuleFailed { rule_id: String, message: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessEngineError {
    /// Create a rule failure for the given rule
    pub fn rule_failed(rule_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::RuleFailed {
            rule_id: rule_id.into(),
            message: msg.into(),
        }
    }
}
