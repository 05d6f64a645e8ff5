//! Top-level pipelines: document or URL in, summary + PDF report out.
//!
//! [`ReportService`] owns everything a request needs (model, extractor,
//! fetcher, output settings) and is shared between requests behind an
//! `Arc`. Each pipeline runs the same three final steps:
//!
//! ```text
//! text ──▶ llm::summarize ──▶ normalize ──▶ render ──▶ ReportOutput
//! ```
//!
//! Only the source of the text differs ([`ReportService::summarize_document`],
//! [`ReportService::summarize_upload`], [`ReportService::summarize_url`]).

use crate::config::ServiceConfig;
use crate::error::ReportError;
use crate::fonts::ReportFonts;
use crate::output::{ReportKind, ReportOutput};
use crate::pipeline::extract::{SourceFormat, TextExtractor};
use crate::pipeline::fetch::WebFetcher;
use crate::pipeline::llm::{self, LanguageModel, ProviderModel};
use crate::pipeline::normalize::normalize;
use crate::pipeline::render::render_report;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Characters of extracted text and summary echoed at debug level.
const PREVIEW_CHARS: usize = 500;

/// Document and web-page summary pipelines.
#[derive(Clone)]
pub struct ReportService {
    config: ServiceConfig,
    model: Arc<dyn LanguageModel>,
    extractor: TextExtractor,
    fetcher: WebFetcher,
    fonts: ReportFonts,
    output_dir: PathBuf,
}

impl std::fmt::Debug for ReportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportService")
            .field("config", &self.config)
            .field("fonts", &self.fonts)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl ReportService {
    /// Build the service, resolving the LLM provider from `config` and the
    /// environment (see [`resolve_provider`]).
    pub fn new(config: ServiceConfig) -> Result<Self, ReportError> {
        let provider = resolve_provider(&config)?;
        info!(
            "LLM provider resolved (model: {})",
            config.model.as_deref().unwrap_or("provider default")
        );
        let model = Arc::new(ProviderModel::new(
            provider,
            Duration::from_secs(config.api_timeout_secs),
        ));
        Self::with_model(config, model)
    }

    /// Build the service around an existing model implementation.
    pub fn with_model(
        config: ServiceConfig,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self, ReportError> {
        let output_dir = std::path::absolute(&config.output_dir).map_err(|e| {
            ReportError::InvalidConfig(format!(
                "Output directory '{}': {}",
                config.output_dir.display(),
                e
            ))
        })?;
        let extractor = TextExtractor::new(
            config.pdfium_lib_path.clone(),
            Arc::clone(&model),
            config.ocr_max_tokens,
            config.max_image_pixels,
        );
        let fetcher = WebFetcher::new(config.fetch_timeout_secs)?;
        let fonts = ReportFonts::from_config(&config);
        Ok(Self {
            config,
            model,
            extractor,
            fetcher,
            fonts,
            output_dir,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Absolute directory reports are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Summarise a document already on disk; its extension picks the format.
    pub async fn summarize_document(&self, path: &Path) -> Result<ReportOutput, ReportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let text = self.extractor.extract(path, &extension).await?;
        self.report(ReportKind::Document, &text).await
    }

    /// Summarise an uploaded file given its client-side name and contents.
    ///
    /// The bytes are staged in a temporary file carrying the original
    /// extension; it is removed when the request finishes.
    pub async fn summarize_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<ReportOutput, ReportError> {
        if file_name.trim().is_empty() {
            return Err(ReportError::InvalidRequest("No selected file".into()));
        }
        let format = SourceFormat::from_path(Path::new(file_name))?;
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        info!(
            "Upload '{}' ({} bytes, {:?})",
            file_name,
            bytes.len(),
            format
        );

        let staged = stage_upload(bytes, &extension)?;
        let text = self.extractor.extract(staged.path(), &extension).await?;
        drop(staged);
        self.report(ReportKind::Document, &text).await
    }

    /// Fetch `url` and summarise its visible text.
    pub async fn summarize_url(&self, url: &str) -> Result<ReportOutput, ReportError> {
        let text = self.fetcher.fetch_text(url).await?;
        self.report(ReportKind::WebPage, &text).await
    }

    async fn report(&self, kind: ReportKind, text: &str) -> Result<ReportOutput, ReportError> {
        let start = Instant::now();
        if text.trim().is_empty() {
            warn!("Summarising empty text");
        }
        debug!("Source text preview: {}", preview(text));

        let max_tokens = match kind {
            ReportKind::Document => self.config.document_max_tokens,
            ReportKind::WebPage => self.config.web_max_tokens,
        };
        let raw = llm::summarize(
            self.model.as_ref(),
            kind.profile(),
            text,
            self.config.temperature,
            max_tokens,
        )
        .await?;
        let summary = match kind {
            ReportKind::Document => raw,
            ReportKind::WebPage => raw.trim().to_string(),
        };
        debug!("Summary preview: {}", preview(&summary));

        let blocks = normalize(&summary, kind.mode(), kind.title());
        let report_path = kind.report_path(&self.output_dir, self.config.unique_report_names);
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| ReportError::OutputWriteFailed {
                path: report_path.clone(),
                source: e,
            })?;
        render_report(blocks, kind.mode(), self.fonts.clone(), report_path.clone()).await?;

        info!(
            "{} ready in {:?}: {}",
            kind.title(),
            start.elapsed(),
            report_path.display()
        );
        Ok(ReportOutput {
            summary,
            report_path,
        })
    }
}

fn stage_upload(bytes: &[u8], extension: &str) -> Result<tempfile::NamedTempFile, ReportError> {
    let staging_failed =
        |e: std::io::Error| ReportError::Internal(format!("Staging upload failed: {}", e));
    let mut file = tempfile::Builder::new()
        .prefix("docsum-upload-")
        .suffix(&format!(".{}", extension))
        .tempfile()
        .map_err(staging_failed)?;
    file.write_all(bytes).map_err(staging_failed)?;
    file.flush().map_err(staging_failed)?;
    Ok(file)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ReportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReportError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>, ReportError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or("gpt-4.1-nano");
    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReportError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
