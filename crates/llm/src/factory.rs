//! Provider Factory
//!
//! Turns a `DeepConfig` into a ready-to-setup provider instance plus the
//! per-call options derived from its overrides. The orchestrator calls
//! this once per worker so parallel cloud sessions never share state.

use std::time::Duration;

use rigour_core::{CoreResult, DeepConfig};

use crate::cloud::CloudProvider;
use crate::provider::{AnalyzeOptions, InferenceProvider};
use crate::sidecar::SidecarProvider;
use crate::tiers::ModelTier;

/// Build one provider instance for the configured backend.
pub fn build_provider(config: &DeepConfig) -> CoreResult<Box<dyn InferenceProvider>> {
    match &config.vendor {
        Some(vendor) => {
            let provider = CloudProvider::new(
                vendor,
                config.api_key.as_deref().unwrap_or(""),
                config.base_url.as_deref(),
                config.model.as_deref(),
            )?;
            Ok(Box::new(provider))
        }
        None => {
            let tier = ModelTier::parse_or_default(&config.tier);
            Ok(Box::new(SidecarProvider::with_default_paths(tier)?))
        }
    }
}

/// Per-call options with the config's overrides applied.
pub fn analyze_options(config: &DeepConfig) -> AnalyzeOptions {
    let mut options = AnalyzeOptions::default();
    if let Some(max_tokens) = config.max_tokens {
        options.max_tokens = max_tokens;
    }
    if let Some(temperature) = config.temperature {
        options.temperature = temperature;
    }
    if let Some(timeout_ms) = config.timeout_ms {
        options.timeout = Duration::from_millis(timeout_ms);
    }
    options
}
