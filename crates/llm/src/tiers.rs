//! Model Tiers
//!
//! The local sidecar runs one of two quantized models. Standard is small
//! enough for any machine; Pro trades a much larger download for better
//! findings.

use serde::{Deserialize, Serialize};

/// Which local model the sidecar loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    #[default]
    Standard,
    Pro,
}

impl ModelTier {
    /// Parse a configured tier string, falling back to Standard.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pro" => ModelTier::Pro,
            _ => ModelTier::Standard,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelTier::Standard => "standard",
            ModelTier::Pro => "pro",
        }
    }

    /// File name of the cached model weights.
    pub fn file_name(&self) -> &'static str {
        match self {
            ModelTier::Standard => "qwen2.5-coder-1.5b-instruct-q4_k_m.gguf",
            ModelTier::Pro => "qwen2.5-coder-7b-instruct-q4_k_m.gguf",
        }
    }

    /// Download URL for the model weights.
    pub fn url(&self) -> &'static str {
        match self {
            ModelTier::Standard => {
                "https://huggingface.co/Qwen/Qwen2.5-Coder-1.5B-Instruct-GGUF/resolve/main/qwen2.5-coder-1.5b-instruct-q4_k_m.gguf"
            }
            ModelTier::Pro => {
                "https://huggingface.co/Qwen/Qwen2.5-Coder-7B-Instruct-GGUF/resolve/main/qwen2.5-coder-7b-instruct-q4_k_m.gguf"
            }
        }
    }

    /// Approximate download size, for progress messaging.
    pub fn approx_size_bytes(&self) -> u64 {
        match self {
            ModelTier::Standard => 1_100_000_000,
            ModelTier::Pro => 4_700_000_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default() {
        assert_eq!(ModelTier::parse_or_default("pro"), ModelTier::Pro);
        assert_eq!(ModelTier::parse_or_default("PRO"), ModelTier::Pro);
        assert_eq!(ModelTier::parse_or_default("standard"), ModelTier::Standard);
        assert_eq!(ModelTier::parse_or_default("unknown"), ModelTier::Standard);
        assert_eq!(ModelTier::parse_or_default(""), ModelTier::Standard);
    }

    #[test]
    fn test_tier_files_differ() {
        assert_ne!(
            ModelTier::Standard.file_name(),
            ModelTier::Pro.file_name()
        );
        assert!(ModelTier::Pro.approx_size_bytes() > ModelTier::Standard.approx_size_bytes());
    }

    #[test]
    fn test_url_ends_with_file_name() {
        for tier in [ModelTier::Standard, ModelTier::Pro] {
            assert!(tier.url().ends_with(tier.file_name()));
        }
    }
}
