//! Core Error Types
//!
//! Defines the foundational error types used across the Rigour workspace.
//! These error types are dependency-free (only thiserror + std) so every
//! other crate can use them without pulling in provider or runtime deps.

use thiserror::Error;

/// Core error type for the Rigour workspace.
///
/// Provider-specific failures (HTTP status handling, subprocess lifecycle)
/// live in `rigour-llm`'s `ProviderError` and are converted into `Provider`
/// variants at the orchestrator boundary.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Inference provider errors (setup, analyze, disposal)
    #[error("Provider error: {0}")]
    Provider(String),

    /// A provider call or setup exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Parse errors (model output, manifests)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert CoreError to a string
impl From<CoreError> for String {
    fn from(err: CoreError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::config("missing vendor");
        assert_eq!(err.to_string(), "Configuration error: missing vendor");
    }

    #[test]
    fn test_provider_error_display() {
        let err = CoreError::provider("sidecar binary not found");
        assert!(err.to_string().contains("Provider error"));
    }

    #[test]
    fn test_timeout_error_display() {
        let err = CoreError::timeout("setup exceeded 120s");
        assert!(err.to_string().starts_with("Timed out"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Io(_)));
    }

    #[test]
    fn test_error_conversion_to_string() {
        let err = CoreError::parse("truncated response");
        let msg: String = err.into();
        assert!(msg.contains("Parse error"));
    }
}
