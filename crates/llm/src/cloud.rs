//! Cloud Provider
//!
//! `InferenceProvider` backed by a hosted vendor. The registry in
//! `vendors` decides whether a vendor speaks the Anthropic messages
//! protocol or OpenAI-style chat completions; this module owns the two
//! request/response shapes and nothing else.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use rigour_core::{report_stage, ProgressFn};

use crate::provider::{
    parse_http_error, AnalyzeOptions, InferenceProvider, ProviderError, ProviderResult,
};
use crate::vendors::{vendor_names, vendor_spec, Protocol, VendorSpec};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Hosted inference over HTTP.
#[derive(Debug)]
pub struct CloudProvider {
    vendor: &'static VendorSpec,
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl CloudProvider {
    /// Build a provider for the named vendor. Fails fast on an unknown
    /// vendor or a missing API key rather than at the first request.
    pub fn new(
        vendor_name: &str,
        api_key: &str,
        base_url: Option<&str>,
        model: Option<&str>,
    ) -> ProviderResult<Self> {
        let vendor = vendor_spec(vendor_name).ok_or_else(|| {
            ProviderError::Setup(format!(
                "unknown vendor '{vendor_name}' (supported: {})",
                vendor_names().join(", ")
            ))
        })?;
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::Auth(format!(
                "{}: API key is required for cloud analysis",
                vendor.name
            )));
        }
        Ok(Self {
            vendor,
            api_key: api_key.to_string(),
            base_url: base_url
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(vendor.base_url)
                .to_string(),
            model: model
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or(vendor.default_model)
                .to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_body(&self, prompt: &str, options: &AnalyzeOptions) -> Value {
        match self.vendor.protocol {
            Protocol::Anthropic => json!({
                "model": self.model,
                "max_tokens": options.max_tokens,
                "temperature": options.temperature,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            Protocol::OpenAiCompat => {
                let mut body = json!({
                    "model": self.model,
                    "max_tokens": options.max_tokens,
                    "temperature": options.temperature,
                    "messages": [{ "role": "user", "content": prompt }],
                });
                if options.json_mode {
                    body["response_format"] = json!({ "type": "json_object" });
                }
                body
            }
        }
    }

    fn extract_text(&self, response: &Value) -> Option<String> {
        let text = match self.vendor.protocol {
            Protocol::Anthropic => response
                .get("content")?
                .get(0)?
                .get("text")?
                .as_str()?,
            Protocol::OpenAiCompat => response
                .get("choices")?
                .get(0)?
                .get("message")?
                .get("content")?
                .as_str()?,
        };
        Some(text.to_string())
    }

    /// Turn a successful HTTP payload into the final analysis text. A
    /// protocol-valid payload carrying no text is an error, never an
    /// empty success.
    fn finish(&self, payload: &Value) -> ProviderResult<String> {
        let text = self
            .extract_text(payload)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl InferenceProvider for CloudProvider {
    fn name(&self) -> &str {
        self.vendor.name
    }

    async fn is_available(&self) -> bool {
        // Construction already validated vendor and key; no network probe.
        !self.api_key.is_empty()
    }

    async fn setup(&mut self, on_progress: ProgressFn) -> ProviderResult<()> {
        report_stage(
            &on_progress,
            format!("Using {} ({})", self.vendor.name, self.model),
        );
        Ok(())
    }

    async fn analyze(&self, prompt: &str, options: &AnalyzeOptions) -> ProviderResult<String> {
        let body = self.build_body(prompt, options);

        let mut request = self
            .client
            .post(&self.base_url)
            .timeout(options.timeout)
            .json(&body);
        request = match self.vendor.protocol {
            Protocol::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Protocol::OpenAiCompat => request.bearer_auth(&self.api_key),
        };

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderError::Timeout(options.timeout)
            } else {
                ProviderError::Network(format!("{}: {err}", self.vendor.name))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_http_error(status.as_u16(), &body, self.vendor.name));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| ProviderError::Network(format!("{}: {err}", self.vendor.name)))?;
        self.finish(&payload)
    }

    async fn dispose(&mut self) {
        debug!(vendor = self.vendor.name, "disposing cloud provider");
    }
}
