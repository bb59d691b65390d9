//! Cloud Vendor Registry
//!
//! Static table of supported hosted inference vendors. One vendor speaks
//! the Anthropic messages protocol natively; the rest expose OpenAI-style
//! chat completions, so a single request/response shape covers them all.

/// Wire protocol a vendor speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Anthropic messages API (`x-api-key` header, content blocks)
    Anthropic,
    /// OpenAI-style chat completions (`Authorization: Bearer`)
    OpenAiCompat,
}

/// Static description of one hosted vendor.
#[derive(Debug, Clone, Copy)]
pub struct VendorSpec {
    pub name: &'static str,
    pub protocol: Protocol,
    /// Full default endpoint URL, overridable per-run
    pub base_url: &'static str,
    /// Default model, overridable per-run
    pub default_model: &'static str,
}

const VENDORS: &[VendorSpec] = &[
    VendorSpec {
        name: "anthropic",
        protocol: Protocol::Anthropic,
        base_url: "https://api.anthropic.com/v1/messages",
        default_model: "claude-3-5-haiku-20241022",
    },
    VendorSpec {
        name: "openai",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.openai.com/v1/chat/completions",
        default_model: "gpt-4o-mini",
    },
    VendorSpec {
        name: "deepseek",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.deepseek.com/v1/chat/completions",
        default_model: "deepseek-chat",
    },
    VendorSpec {
        name: "glm",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://open.bigmodel.cn/api/paas/v4/chat/completions",
        default_model: "glm-4-flash",
    },
    VendorSpec {
        name: "qwen",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1/chat/completions",
        default_model: "qwen-turbo",
    },
    VendorSpec {
        name: "groq",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.groq.com/openai/v1/chat/completions",
        default_model: "llama-3.1-8b-instant",
    },
    VendorSpec {
        name: "mistral",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.mistral.ai/v1/chat/completions",
        default_model: "mistral-small-latest",
    },
    VendorSpec {
        name: "together",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.together.xyz/v1/chat/completions",
        default_model: "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo",
    },
    VendorSpec {
        name: "openrouter",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://openrouter.ai/api/v1/chat/completions",
        default_model: "openrouter/auto",
    },
    VendorSpec {
        name: "xai",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.x.ai/v1/chat/completions",
        default_model: "grok-2-latest",
    },
    VendorSpec {
        name: "moonshot",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.moonshot.cn/v1/chat/completions",
        default_model: "moonshot-v1-8k",
    },
    VendorSpec {
        name: "fireworks",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.fireworks.ai/inference/v1/chat/completions",
        default_model: "accounts/fireworks/models/llama-v3p1-8b-instruct",
    },
    VendorSpec {
        name: "perplexity",
        protocol: Protocol::OpenAiCompat,
        base_url: "https://api.perplexity.ai/chat/completions",
        default_model: "sonar",
    },
];

/// Look up a vendor by its configured name (case-insensitive).
pub fn vendor_spec(name: &str) -> Option<&'static VendorSpec> {
    let needle = name.trim().to_ascii_lowercase();
    VENDORS.iter().find(|v| v.name == needle)
}

/// All supported vendor names, for error messages.
pub fn vendor_names() -> Vec<&'static str> {
    VENDORS.iter().map(|v| v.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(vendor_spec("OpenAI").is_some());
        assert!(vendor_spec(" anthropic ").is_some());
        assert!(vendor_spec("nope").is_none());
    }

    #[test]
    fn test_anthropic_is_the_only_native_vendor() {
        let native: Vec<_> = VENDORS
            .iter()
            .filter(|v| v.protocol == Protocol::Anthropic)
            .collect();
        assert_eq!(native.len(), 1);
        assert_eq!(native[0].name, "anthropic");
    }

    #[test]
    fn test_registry_covers_more_than_ten_vendors() {
        assert!(vendor_names().len() > 10);
    }

    #[test]
    fn test_every_vendor_has_endpoint_and_model() {
        for vendor in VENDORS {
            assert!(vendor.base_url.starts_with("https://"), "{}", vendor.name);
            assert!(!vendor.default_model.is_empty(), "{}", vendor.name);
        }
    }
}
