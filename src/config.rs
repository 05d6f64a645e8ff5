//! Service configuration.
//!
//! Every knob lives in [`ServiceConfig`], built via its
//! [`ServiceConfigBuilder`]. The config is constructed once at process start
//! and handed to [`crate::summarize::ReportService::new`]; nothing in the
//! library reads API keys or paths from global state on its own, apart from
//! the provider auto-detection fallback documented on
//! [`crate::summarize::resolve_provider`].

use crate::error::ReportError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for the summary-report service.
///
/// # Example
/// ```rust
/// use edgequake_docsum::ServiceConfig;
///
/// let config = ServiceConfig::builder()
///     .model("gpt-4.1-nano")
///     .output_dir("/tmp/reports")
///     .unique_report_names(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.web_max_tokens, 800);
/// ```
#[derive(Clone)]
pub struct ServiceConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for both summary profiles. Default: 0.5.
    pub temperature: f32,

    /// Token budget for uploaded-document summaries. Default: 500.
    pub document_max_tokens: usize,

    /// Token budget for web-page summaries. Default: 800.
    pub web_max_tokens: usize,

    /// Token budget for image transcription. Default: 4096.
    pub ocr_max_tokens: usize,

    /// Longest edge, in pixels, of an image sent for transcription. Default: 2000.
    ///
    /// Larger images are downscaled proportionally before encoding.
    pub max_image_pixels: u32,

    /// Directory reports are written to. Default: the working directory.
    pub output_dir: PathBuf,

    /// Give each report a unique `<stem>-<uuid>.pdf` name. Default: true.
    ///
    /// With `false` every request of the same kind writes
    /// `document_summary.pdf` / `url_summary.pdf`, and concurrent requests
    /// overwrite each other (last writer wins).
    pub unique_report_names: bool,

    /// Timeout for fetching a web page, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Timeout for one LLM call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Path to libpdfium (the file, or the directory holding it).
    /// If None, the system library is used.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Largest accepted upload, in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,

    /// Directory holding the TrueType files reports are typeset with.
    /// Default: `/usr/share/fonts/truetype/dejavu`.
    pub font_dir: PathBuf,

    /// File-name stem of the report font family, e.g. "DejaVuSans" for
    /// `DejaVuSans.ttf` + `DejaVuSans-Bold.ttf`. Default: "DejaVuSans".
    pub font_family: String,
}

/// Default directory for [`ServiceConfig::font_dir`].
pub const DEFAULT_FONT_DIR: &str = "/usr/share/fonts/truetype/dejavu";
/// Default stem for [`ServiceConfig::font_family`].
pub const DEFAULT_FONT_FAMILY: &str = "DejaVuSans";

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.5,
            document_max_tokens: 500,
            web_max_tokens: 800,
            ocr_max_tokens: 4096,
            max_image_pixels: 2000,
            output_dir: PathBuf::from("."),
            unique_report_names: true,
            fetch_timeout_secs: 30,
            api_timeout_secs: 120,
            pdfium_lib_path: None,
            max_upload_bytes: 25 * 1024 * 1024,
            font_dir: PathBuf::from(DEFAULT_FONT_DIR),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
        }
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("document_max_tokens", &self.document_max_tokens)
            .field("web_max_tokens", &self.web_max_tokens)
            .field("ocr_max_tokens", &self.ocr_max_tokens)
            .field("max_image_pixels", &self.max_image_pixels)
            .field("output_dir", &self.output_dir)
            .field("unique_report_names", &self.unique_report_names)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("font_dir", &self.font_dir)
            .field("font_family", &self.font_family)
            .finish()
    }
}

impl ServiceConfig {
    /// Create a new builder for `ServiceConfig`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
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

    pub fn document_max_tokens(mut self, n: usize) -> Self {
        self.config.document_max_tokens = n;
        self
    }

    pub fn web_max_tokens(mut self, n: usize) -> Self {
        self.config.web_max_tokens = n;
        self
    }

    pub fn ocr_max_tokens(mut self, n: usize) -> Self {
        self.config.ocr_max_tokens = n;
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.max_image_pixels = px.max(100);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn unique_report_names(mut self, v: bool) -> Self {
        self.config.unique_report_names = v;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.font_dir = dir.into();
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.config.font_family = family.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServiceConfig, ReportError> {
        let c = &self.config;
        if c.document_max_tokens == 0 || c.web_max_tokens == 0 || c.ocr_max_tokens == 0 {
            return Err(ReportError::InvalidConfig(
                "Token budgets must be ≥ 1".into(),
            ));
        }
        if c.fetch_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(ReportError::InvalidConfig("Timeouts must be ≥ 1s".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(ReportError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(ReportError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if c.font_family.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "Font family must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
