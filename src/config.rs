//! Configuration types for receipt scanning.
//!
//! All pipeline behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share configs across calls, log them, and diff two runs to understand
//! why their outputs differ.
//!
//! The API credential never appears here: it is read from the environment by
//! the provider factory at resolution time and lives inside the provider
//! handle passed to the Structured Parser.

use crate::error::ScanError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a receipt scan.
///
/// Built via [`ScanConfig::builder()`] or using [`ScanConfig::default()`].
///
/// # Example
/// ```rust
/// use receipt2json::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .model("gpt-4o")
///     .max_retries(2)
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// LLM model identifier, e.g. "gpt-4o". If None, uses the provider
    /// default for the resolved provider.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from
    /// environment API keys.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the OCR text it was
    /// given — exactly what you want for extraction. Higher values introduce
    /// creativity that invents line items.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// A long grocery receipt with 60 line items fits comfortably in 1024
    /// output tokens. Setting this too low truncates the JSON object
    /// mid-array, which then fails extraction as unbalanced.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad API
    /// key, 400) surface after the retry budget regardless; there is no
    /// per-error classification in the provider trait.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Custom instruction template. If None, uses
    /// [`crate::prompts::DEFAULT_PROMPT_TEMPLATE`].
    ///
    /// The raw OCR text is appended to whatever template is in effect. An
    /// override that renames the contract fields (`total`, `business`,
    /// `items`, `transaction_timestamp`) will break any consumer of the
    /// typed record view.
    pub prompt_template: Option<String>,

    /// OCR engine executable. Default: "tesseract".
    ///
    /// Resolved through PATH like any spawned command; set an absolute path
    /// when the engine lives outside PATH.
    pub ocr_binary: String,

    /// Language hint passed to the OCR engine (`-l <lang>`). Default: None.
    ///
    /// None means the engine's own default. The pipeline deliberately sends
    /// no layout or confidence options — a single default-configuration call.
    pub ocr_language: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-LLM-attempt timeout in seconds. Default: 60.
    ///
    /// The LLM request is the only stage with externally-variable latency;
    /// without a timeout a stalled connection hangs the whole run.
    pub api_timeout_secs: u64,

    /// Optional progress callback for stage-level events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
            prompt_template: None,
            ocr_binary: "tesseract".to_string(),
            ocr_language: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("ocr_binary", &self.ocr_binary)
            .field("ocr_language", &self.ocr_language)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
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

    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.prompt_template = Some(template.into());
        self
    }

    pub fn ocr_binary(mut self, binary: impl Into<String>) -> Self {
        self.config.ocr_binary = binary.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = Some(lang.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if c.ocr_binary.is_empty() {
            return Err(ScanError::InvalidConfig(
                "OCR binary name must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(ScanError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ScanConfig::default();
        assert_eq!(c.ocr_binary, "tesseract");
        assert_eq!(c.max_tokens, 1024);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.api_timeout_secs, 60);
        assert!(c.model.is_none());
        assert!(c.prompt_template.is_none());
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ScanConfig::builder().temperature(9.0).build().unwrap();
        assert!((c.temperature - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_ocr_binary_is_rejected() {
        let result = ScanConfig::builder().ocr_binary("").build();
        assert!(matches!(result, Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn zero_api_timeout_is_rejected() {
        let result = ScanConfig::builder().api_timeout_secs(0).build();
        assert!(matches!(result, Err(ScanError::InvalidConfig(_))));
    }

    #[test]
    fn debug_elides_provider() {
        let c = ScanConfig::default();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("ScanConfig"));
        assert!(!dbg.contains("progress_callback"));
    }
}
