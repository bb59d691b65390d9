//! Inference Provider Trait
//!
//! Defines the common interface satisfied by the local sidecar and every
//! cloud vendor. Backends differ wildly (subprocess vs. HTTP) but the
//! orchestrator only ever sees this contract.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use rigour_core::{CoreError, ProgressFn};

/// Error types for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Authentication failed (missing/invalid API key)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Setup failed (binary/model unavailable, vendor handshake failure)
    #[error("Setup failed: {0}")]
    Setup(String),

    /// A call exceeded its timeout and was aborted
    #[error("Analysis call timed out after {0:?}")]
    Timeout(Duration),

    /// The call succeeded at the protocol level but carried no text.
    /// Surfaced as an error so a failed call is never mistaken for a
    /// clean "no findings" result.
    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// HTTP-level error from a cloud vendor
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Subprocess error from the local sidecar
    #[error("Sidecar process error: {0}")]
    Process(String),

    /// File I/O error (model cache, managed install)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<ProviderError> for CoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(d) => CoreError::timeout(format!("provider call after {d:?}")),
            other => CoreError::provider(other.to_string()),
        }
    }
}

/// Map an HTTP error status to a provider error.
pub fn parse_http_error(status: u16, body: &str, vendor: &str) -> ProviderError {
    match status {
        401 => ProviderError::Auth(format!("{vendor}: invalid API key")),
        403 => ProviderError::Auth(format!("{vendor}: access denied")),
        429 => ProviderError::RateLimited(format!("{vendor}: {body}")),
        _ => ProviderError::Http {
            status,
            message: format!("{vendor}: {body}"),
        },
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Per-call options for `analyze`.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-call timeout, enforced by the provider (request abort or
    /// subprocess kill)
    pub timeout: Duration,
    /// Request constrained JSON output where the backend supports it
    pub json_mode: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.2,
            timeout: default_timeout(),
            json_mode: true,
        }
    }
}

/// Trait that all inference providers implement.
///
/// `setup` is idempotent and may perform network/filesystem side effects
/// (binary install, model download, vendor handshake), reporting progress
/// through the callback. `analyze` must not perform setup side effects.
/// `dispose` releases process/connection resources and is safe to call
/// multiple times.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for identification ("sidecar" or the vendor name).
    fn name(&self) -> &str;

    /// Cheap availability probe: no side effects, no downloads.
    async fn is_available(&self) -> bool;

    /// Prepare the provider for analysis calls.
    async fn setup(&mut self, on_progress: ProgressFn) -> ProviderResult<()>;

    /// Run one single-turn analysis call and return the raw model text.
    async fn analyze(&self, prompt: &str, options: &AnalyzeOptions) -> ProviderResult<String>;

    /// Release any held resources.
    async fn dispose(&mut self);
}

impl std::fmt::Debug for dyn InferenceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceProvider")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_error_auth() {
        let err = parse_http_error(401, "unauthorized", "openai");
        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(err.to_string().contains("openai"));

        let err = parse_http_error(403, "forbidden", "glm");
        assert!(matches!(err, ProviderError::Auth(_)));
    }

    #[test]
    fn test_parse_http_error_rate_limited() {
        let err = parse_http_error(429, "slow down", "deepseek");
        assert!(matches!(err, ProviderError::RateLimited(_)));
    }

    #[test]
    fn test_parse_http_error_server() {
        let err = parse_http_error(500, "boom", "openai");
        match err {
            ProviderError::Http { status, .. } => assert_eq!(status, 500),
            _ => panic!("expected Http"),
        }
    }

    #[test]
    fn test_analyze_options_default() {
        let options = AnalyzeOptions::default();
        assert_eq!(options.max_tokens, 2048);
        assert_eq!(options.timeout, Duration::from_secs(120));
        assert!(options.json_mode);
    }

    #[test]
    fn test_timeout_converts_to_core_timeout() {
        let err: CoreError = ProviderError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(err, CoreError::Timeout(_)));

        let err: CoreError = ProviderError::EmptyResponse.into();
        assert!(matches!(err, CoreError::Provider(_)));
    }
}
