//! Gate Framework Types
//!
//! Plain data records exchanged with the surrounding gate framework: the
//! execution context handed to a gate and the `Failure` records it returns.
//! The deep analysis engine treats both as opaque transport types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Severity of a failure or finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Parse a severity label, falling back to `Medium` for anything
    /// outside the five recognized levels.
    pub fn parse_or_default(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "critical" => Severity::Critical,
            "high" => Severity::High,
            "medium" => Severity::Medium,
            "low" => Severity::Low,
            "info" => Severity::Info,
            _ => Severity::Medium,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Execution context supplied by the gate framework.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateContext {
    /// Project root directory to analyze
    pub root: PathBuf,
    /// Ignore patterns (gitignore-style globs) supplied by the host
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Optional explicit file-path filter; when set, only these files
    /// (relative to `root`) are considered.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_filter: Option<Vec<String>>,
}

impl GateContext {
    /// Create a context for a project root with no ignores or filter.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore_patterns: Vec::new(),
            file_filter: None,
        }
    }
}

/// Provenance metadata attached to a failure for downstream
/// filtering and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureMetadata {
    /// Model confidence in [0, 1]
    pub confidence: f32,
    /// Whether the claim was corroborated against extracted facts
    pub verified: bool,
    /// Check category that produced this failure
    pub category: String,
}

/// A single failure record merged into the overall run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    /// Identifier of the gate that produced this failure
    pub gate: String,
    /// Short synthesized title
    pub title: String,
    /// Human-readable description of the issue
    pub message: String,
    /// Affected file(s), relative to the project root
    pub files: Vec<String>,
    /// Affected line, when the model supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Suggested fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Severity of the issue
    pub severity: Severity,
    /// Provenance metadata
    pub metadata: FailureMetadata,
}
