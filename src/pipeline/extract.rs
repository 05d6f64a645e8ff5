//! Text extraction: uploaded file → plain text.
//!
//! The format is decided from the file extension alone, before the file is
//! opened, so an unsupported upload is rejected without any work.
//!
//! * **PDF**: the text layer of every page, read with pdfium and joined
//!   with newlines. pdfium is not async-safe, so the work runs inside
//!   `spawn_blocking`. Scanned PDFs without a text layer yield empty text.
//! * **PNG / JPEG**: the picture is decoded, downscaled and sent to a
//!   vision model with [`OCR_SYSTEM_PROMPT`].

use crate::error::ReportError;
use crate::pipeline::encode::encode_image;
use crate::pipeline::llm::{CompletionRequest, LanguageModel};
use crate::prompts::OCR_SYSTEM_PROMPT;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Input formats accepted for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Image,
}

impl SourceFormat {
    /// Classify a file extension, case-insensitively and with or without a
    /// leading dot.
    pub fn from_extension(extension: &str) -> Result<Self, ReportError> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Ok(SourceFormat::Pdf),
            "png" | "jpg" | "jpeg" => Ok(SourceFormat::Image),
            _ => Err(ReportError::UnsupportedFormat { extension: ext }),
        }
    }

    /// Classify by the extension of `path`.
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }
}

/// Extracts plain text from uploaded documents.
#[derive(Clone)]
pub struct TextExtractor {
    pdfium_lib_path: Option<PathBuf>,
    model: Arc<dyn LanguageModel>,
    ocr_max_tokens: usize,
    max_image_pixels: u32,
}

impl TextExtractor {
    pub fn new(
        pdfium_lib_path: Option<PathBuf>,
        model: Arc<dyn LanguageModel>,
        ocr_max_tokens: usize,
        max_image_pixels: u32,
    ) -> Self {
        Self {
            pdfium_lib_path,
            model,
            ocr_max_tokens,
            max_image_pixels,
        }
    }

    /// Extract the text of the file at `path`, whose format is given by
    /// `extension`.
    pub async fn extract(&self, path: &Path, extension: &str) -> Result<String, ReportError> {
        let format = SourceFormat::from_extension(extension)?;
        if !path.is_file() {
            return Err(ReportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = match format {
            SourceFormat::Pdf => self.extract_pdf(path).await?,
            SourceFormat::Image => self.extract_image(path).await?,
        };
        info!("Extracted {} chars from {}", text.len(), path.display());
        Ok(text)
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String, ReportError> {
        let path = path.to_path_buf();
        let lib = self.pdfium_lib_path.clone();
        tokio::task::spawn_blocking(move || pdf_text_blocking(&path, lib.as_deref()))
            .await
            .map_err(|e| ReportError::Internal(format!("Extraction task panicked: {}", e)))?
    }

    async fn extract_image(&self, path: &Path) -> Result<String, ReportError> {
        let owned = path.to_path_buf();
        let max_pixels = self.max_image_pixels;
        let image_data = tokio::task::spawn_blocking(move || {
            let img = image::open(&owned).map_err(|e| ReportError::ExtractionFailed {
                path: owned.clone(),
                detail: e.to_string(),
            })?;
            encode_image(&img, max_pixels).map_err(|e| ReportError::ExtractionFailed {
                path: owned.clone(),
                detail: e.to_string(),
            })
        })
        .await
        .map_err(|e| ReportError::Internal(format!("Image decode task panicked: {}", e)))??;

        let request = CompletionRequest {
            system_prompt: OCR_SYSTEM_PROMPT.to_string(),
            user_prompt: String::new(),
            image: Some(image_data),
            temperature: 0.0,
            max_tokens: self.ocr_max_tokens,
        };
        self.model.complete(request).await
    }
}

/// Bind pdfium from `lib_path` (a library file or the directory holding
/// it), falling back to the system library.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, ReportError> {
    let bindings = match lib_path {
        Some(p) if p.is_dir() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
        }
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| ReportError::PdfiumUnavailable(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

fn pdf_text_blocking(path: &Path, lib_path: Option<&Path>) -> Result<String, ReportError> {
    let pdfium = bind_pdfium(lib_path)?;
    let failed = |detail: String| ReportError::ExtractionFailed {
        path: path.to_path_buf(),
        detail,
    };

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| failed(format!("{:?}", e)))?;

    let mut pages_text = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| failed(format!("page {}: {:?}", idx + 1, e)))?;
        pages_text.push(text.all());
    }
    debug!("Read text layer of {} pages", pages_text.len());
    Ok(pages_text.join("\n"))
}
