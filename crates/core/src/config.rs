//! Deep Analysis Configuration
//!
//! Run-level options for the deep analysis engine. Loaded and validated by
//! the external config loader; read-only to the core pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Check categories the model can be asked to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckCategory {
    Architecture,
    ErrorHandling,
    Complexity,
    Naming,
    Duplication,
    Testing,
}

impl CheckCategory {
    /// All categories, in prompt order.
    pub fn all() -> [CheckCategory; 6] {
        [
            CheckCategory::Architecture,
            CheckCategory::ErrorHandling,
            CheckCategory::Complexity,
            CheckCategory::Naming,
            CheckCategory::Duplication,
            CheckCategory::Testing,
        ]
    }

    /// Stable identifier used as the enable-map key.
    pub fn id(&self) -> &'static str {
        match self {
            CheckCategory::Architecture => "architecture",
            CheckCategory::ErrorHandling => "error-handling",
            CheckCategory::Complexity => "complexity",
            CheckCategory::Naming => "naming",
            CheckCategory::Duplication => "duplication",
            CheckCategory::Testing => "testing",
        }
    }

    /// One-line instruction injected into the analysis prompt.
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            CheckCategory::Architecture => {
                "architecture: layering violations, god objects, circular dependencies"
            }
            CheckCategory::ErrorHandling => {
                "error-handling: swallowed errors, empty handlers, inconsistent strategies"
            }
            CheckCategory::Complexity => {
                "complexity: oversized or deeply nested functions, high branch counts"
            }
            CheckCategory::Naming => "naming: misleading or inconsistent identifiers",
            CheckCategory::Duplication => "duplication: structurally repeated logic across files",
            CheckCategory::Testing => "testing: untested modules, assertion-free test files",
        }
    }
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

fn default_workers() -> usize {
    1
}

fn default_tier() -> String {
    "standard".to_string()
}

/// Run-level options for the deep analysis gate.
///
/// `vendor == None` selects the local sidecar; otherwise the named cloud
/// vendor is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepConfig {
    /// Whether the deep pass runs at all
    #[serde(default)]
    pub enabled: bool,
    /// Local model tier ("standard" or "pro"); sidecar only
    #[serde(default = "default_tier")]
    pub tier: String,
    /// Cloud vendor name; None selects the local sidecar
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub vendor: Option<String>,
    /// API key for cloud vendors
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
    /// Base URL override
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,
    /// Model name override
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub model: Option<String>,
    /// Parallel worker count (cloud vendors only; sidecar is single-worker)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Max tokens override per analyze call
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_tokens: Option<u32>,
    /// Temperature override
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f32>,
    /// Per-call timeout override, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timeout_ms: Option<u64>,
    /// Per-check-category enable map, keyed by `CheckCategory::id()`.
    /// Categories absent from the map are enabled.
    #[serde(default)]
    pub checks: HashMap<String, bool>,
}

impl Default for DeepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tier: default_tier(),
            vendor: None,
            api_key: None,
            base_url: None,
            model: None,
            workers: default_workers(),
            max_tokens: None,
            temperature: None,
            timeout_ms: None,
            checks: HashMap::new(),
        }
    }
}

impl DeepConfig {
    /// Categories that are enabled for this run, in prompt order.
    pub fn enabled_checks(&self) -> Vec<CheckCategory> {
        CheckCategory::all()
            .into_iter()
            .filter(|c| self.checks.get(c.id()).copied().unwrap_or(true))
            .collect()
    }

    /// Whether a cloud vendor (rather than the local sidecar) is selected.
    pub fn uses_cloud(&self) -> bool {
        self.vendor.is_some()
    }
}
