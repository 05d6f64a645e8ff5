//! # edgequake-docsum
//!
//! Summarise documents and web pages with an LLM and render each summary as
//! a formatted PDF report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (pdf/png/jpg) ──▶ extract ─┐
//!                                   ├─▶ summarize ─▶ normalize ─▶ render ─▶ report.pdf
//! web page URL ──────────▶ fetch ───┘    (LLM)       (blocks)     (genpdf)
//! ```
//!
//! The interesting part is the last two steps: the model answers in loose
//! Markdown (`**bold**`, `* ` bullets), which [`pipeline::normalize`] turns
//! into typed [`ContentBlock`]s and [`pipeline::render`] lays out on letter
//! pages with a title, section headers, paragraphs and bullet lists.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docsum::{ReportService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let service = ReportService::new(ServiceConfig::default())?;
//!     let output = service.summarize_url("https://example.com").await?;
//!     println!("{}", output.summary);
//!     eprintln!("report: {}", output.report_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsum` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when embedding only the library or the router:
//! ```toml
//! edgequake-docsum = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod fonts;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use error::{FailureKind, ReportError};
pub use output::{ReportKind, ReportOutput};
pub use pipeline::llm::{CompletionRequest, LanguageModel, ProviderModel};
pub use pipeline::normalize::{normalize, ContentBlock, InlineText, Mode};
pub use fonts::ReportFonts;
pub use pipeline::render::ReportRenderer;
pub use server::router;
pub use summarize::{resolve_provider, ReportService};
