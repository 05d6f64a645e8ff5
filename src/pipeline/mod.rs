//! Pipeline stages for turning a document or web page into a summary report.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ extract ──┐
//!  (pdf/img) (pdfium,  │
//!             OCR)     ├──▶ llm ──▶ normalize ──▶ render
//! url ─────▶ fetch ────┘  (summary)  (blocks)    (PDF file)
//!          (reqwest,
//!           scraper)
//! ```
//!
//! 1. [`extract`]: plain text from an uploaded PDF (pdfium text layer, in
//!    `spawn_blocking`) or image (vision OCR via [`encode`] + [`llm`])
//! 2. [`fetch`]: visible text of a web page, with browser headers
//! 3. [`llm`]: the summary call; the only stage that talks to a model
//! 4. [`normalize`]: model Markdown → typed [`normalize::ContentBlock`]s
//! 5. [`render`]: blocks → paginated PDF, written atomically

pub mod encode;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod normalize;
pub mod render;
