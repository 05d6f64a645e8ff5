//! Error types for the edgequake-docsum library.
//!
//! Every pipeline stage returns [`ReportError`]. Normalisation never fails
//! on its input; only the I/O-adjacent stages do (extraction, fetching, the
//! LLM call, loading the report fonts and writing the report).
//!
//! Failures come in two flavours, told apart by [`ReportError::kind`]:
//!
//! * **Expected** failures are part of normal operation and are reported to
//!   the requester as-is: an unsupported upload, a page that answers `403`,
//!   an upstream model that is down.
//! * **Internal** failures point at the deployment or at a bug: pdfium
//!   cannot be loaded, the output directory is not writable, a worker task
//!   panicked.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-docsum library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Extraction was requested for a file type outside pdf/png/jpg/jpeg.
    #[error("Unsupported file format '{extension}'. Supported formats: pdf, png, jpg, jpeg.")]
    UnsupportedFormat { extension: String },

    /// The request itself was malformed (missing upload, empty file name…).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The URL could not be parsed or is not HTTP/HTTPS.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The document was opened but its text could not be read.
    #[error("Failed to extract text from '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory) or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The web server answered `403 Forbidden`.
    #[error("Access denied. The server returned a 403 Forbidden error.")]
    AccessDenied { url: String },

    /// The web server answered with any other non-200 status.
    #[error("Failed to fetch the URL. Status code: {status}")]
    FetchStatus { url: String, status: u16 },

    /// The page was fetched but contained no visible text.
    #[error("No text content found on the page.")]
    EmptyPage { url: String },

    /// The request never produced a response (DNS, TLS, connection reset…).
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The page did not answer within the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The summarization call failed.
    #[error("LLM API error: {message}")]
    Upstream { message: String },

    /// The summarization call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    UpstreamTimeout { secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write report '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report font family could not be loaded.
    #[error(
        "Failed to load font family '{family}' from '{dir}': {detail}\n\
Set DOCSUM_FONT_DIR / DOCSUM_FONT_FAMILY to a directory of TrueType files."
    )]
    FontUnavailable {
        dir: PathBuf,
        family: String,
        detail: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ReportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request cannot be served as submitted (bad format, bad URL).
    Rejected,
    /// The remote page could not be fetched or had nothing to summarise.
    Fetch,
    /// The summarization model failed or timed out.
    Upstream,
    /// Deployment fault or bug on our side.
    Internal,
}

impl ReportError {
    /// Classify this error as an expected failure or an internal fault.
    pub fn kind(&self) -> FailureKind {
        match self {
            ReportError::FileNotFound { .. }
            | ReportError::UnsupportedFormat { .. }
            | ReportError::InvalidRequest(_)
            | ReportError::InvalidUrl { .. }
            | ReportError::ExtractionFailed { .. } => FailureKind::Rejected,

            ReportError::AccessDenied { .. }
            | ReportError::FetchStatus { .. }
            | ReportError::EmptyPage { .. }
            | ReportError::FetchFailed { .. }
            | ReportError::FetchTimeout { .. } => FailureKind::Fetch,

            ReportError::Upstream { .. } | ReportError::UpstreamTimeout { .. } => {
                FailureKind::Upstream
            }

            ReportError::PdfiumUnavailable(_)
            | ReportError::ProviderNotConfigured { .. }
            | ReportError::OutputWriteFailed { .. }
            | ReportError::FontUnavailable { .. }
            | ReportError::InvalidConfig(_)
            | ReportError::Internal(_) => FailureKind::Internal,
        }
    }

    /// `true` for failures the requester caused or can act on.
    pub fn is_expected(&self) -> bool {
        self.kind() != FailureKind::Internal
    }
}
