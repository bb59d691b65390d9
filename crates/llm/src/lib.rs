//! Rigour LLM
//!
//! Inference providers for the deep analysis engine. One trait,
//! `InferenceProvider`, two families behind it: a local llama.cpp sidecar
//! (managed install, cached model weights) and hosted cloud vendors (one
//! Anthropic-native, the rest OpenAI-compatible).
//!
//! ## Module Organization
//!
//! - `provider` - The `InferenceProvider` trait, errors, per-call options
//! - `cloud` - Hosted vendors over HTTP
//! - `sidecar` - Local subprocess provider
//! - `vendors` - Static cloud vendor registry
//! - `tiers` - Local model tiers (standard/pro)
//! - `factory` - `DeepConfig` → provider construction

pub mod cloud;
pub mod factory;
pub mod provider;
pub mod sidecar;
pub mod tiers;
pub mod vendors;

// ── Provider contract ──
pub use provider::{
    parse_http_error, AnalyzeOptions, InferenceProvider, ProviderError, ProviderResult,
};

// ── Implementations ──
pub use cloud::CloudProvider;
pub use sidecar::{SidecarPaths, SidecarProvider};

// ── Configuration surface ──
pub use factory::{analyze_options, build_provider};
pub use tiers::ModelTier;
pub use vendors::{vendor_names, vendor_spec, Protocol, VendorSpec};
