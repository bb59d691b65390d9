//! Finding Model
//!
//! What the model claims (`Finding`) and what survived corroboration
//! against extracted facts (`VerifiedFinding`). Only verified findings
//! ever become gate failures.

use serde::{Deserialize, Serialize};

use rigour_core::Severity;

/// One issue claimed by the model for a specific file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Check category, e.g. "complexity" or "error-handling"
    pub category: String,
    pub severity: Severity,
    /// File the claim is about, relative to the project root
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Model confidence in [0, 1]
    pub confidence: f32,
}

/// A finding that passed verification against the fact set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub verified: bool,
}
