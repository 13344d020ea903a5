//! Configuration for the upstream vision call.
//!
//! Everything the network side needs is carried in [`AnalysisConfig`], built
//! via its [`AnalysisConfigBuilder`]. The library never reads environment
//! variables; the API key arrives here explicitly (the CLI is the one place
//! that maps `GEMINI_API_KEY` onto it).
//!
//! The extraction core takes no configuration from this struct at all. Its
//! knobs (confidence, heading table, sampler) live on
//! [`crate::ExtractorBuilder`].

use crate::error::ItemLensError;
use std::fmt;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Base URL of the Gemini REST API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Cloud Vision `images:annotate` URL used for the OCR pre-pass.
pub const DEFAULT_OCR_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Configuration for one analysis request.
///
/// # Example
/// ```rust
/// use itemlens::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .api_key("test-key")
///     .model("gemini-1.5-pro")
///     .ocr(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gemini-1.5-pro");
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// API key sent with every upstream request. Required for [`crate::analyze`].
    pub api_key: Option<String>,

    /// Gemini model identifier. Default: `gemini-1.5-flash`.
    pub model: String,

    /// Gemini API base URL. Overridable for proxies and tests.
    pub endpoint: String,

    /// Cloud Vision annotate URL.
    pub ocr_endpoint: String,

    /// Run Cloud Vision text detection first and pass the text as context. Default: false.
    ///
    /// The OCR text also backfills `extracted_text` when the model's answer
    /// has no `Extracted Text:` section. A failed OCR call is logged and the
    /// analysis continues without it.
    pub ocr: bool,

    /// Sampling temperature. Range 0.0–2.0. Default: 0.4.
    pub temperature: f32,

    /// Top-k sampling. Default: 32.
    pub top_k: u32,

    /// Nucleus sampling. Range 0.0–1.0. Default: 1.0.
    pub top_p: f32,

    /// Maximum tokens in the answer. Default: 4096.
    ///
    /// The full template with every section runs to roughly 1 500 tokens;
    /// too low a cap truncates the trailing sections, which then read as
    /// missing.
    pub max_output_tokens: u32,

    /// Per-request timeout in seconds. Default: 60.
    pub timeout_secs: u64,

    /// Retries on a transient upstream failure. Default: 0.
    ///
    /// Only timeouts, 429 and 5xx responses are retried. Everything else
    /// (bad key, blocked prompt, malformed body) fails immediately.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Custom analysis prompt. If None, uses [`crate::prompts::DEFAULT_ANALYSIS_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            ocr_endpoint: DEFAULT_OCR_ENDPOINT.to_string(),
            ocr: false,
            temperature: 0.4,
            top_k: 32,
            top_p: 1.0,
            max_output_tokens: 4096,
            timeout_secs: 60,
            max_retries: 0,
            retry_backoff_ms: 500,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("ocr", &self.ocr)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("top_p", &self.top_p)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// The API key, or [`ItemLensError::MissingApiKey`] if unset or blank.
    pub fn require_api_key(&self) -> Result<&str, ItemLensError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ItemLensError::MissingApiKey)
    }

    /// The prompt actually sent to the model.
    pub fn prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_ANALYSIS_PROMPT)
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn ocr(mut self, v: bool) -> Self {
        self.config.ocr = v;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn top_k(mut self, k: u32) -> Self {
        self.config.top_k = k.max(1);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn max_output_tokens(mut self, n: u32) -> Self {
        self.config.max_output_tokens = n;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is not a build error: offline callers never need
    /// one. [`crate::analyze`] checks it before any network I/O.
    pub fn build(self) -> Result<AnalysisConfig, ItemLensError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ItemLensError::InvalidConfig("model must not be empty".into()));
        }
        for (name, url) in [("endpoint", &c.endpoint), ("ocr_endpoint", &c.ocr_endpoint)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ItemLensError::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if c.max_output_tokens == 0 {
            return Err(ItemLensError::InvalidConfig(
                "max_output_tokens must be ≥ 1".into(),
            ));
        }
        if c.timeout_secs == 0 {
            return Err(ItemLensError::InvalidConfig("timeout_secs must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
