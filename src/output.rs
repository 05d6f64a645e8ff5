//! Result payloads and per-pipeline report settings.

use crate::pipeline::normalize::Mode;
use crate::prompts::{SummaryProfile, DOCUMENT_PROFILE, WEB_PAGE_PROFILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which pipeline produced a report.
///
/// Each kind fixes the report title, how the summary is normalised, which
/// prompt profile is used, and the file stem of the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Uploaded or local document (pdf, png, jpg, jpeg).
    Document,
    /// Fetched web page.
    WebPage,
}

impl ReportKind {
    pub fn title(self) -> &'static str {
        match self {
            ReportKind::Document => "Document Summary",
            ReportKind::WebPage => "Web Page Summary",
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            ReportKind::Document => Mode::Flat,
            ReportKind::WebPage => Mode::Structured,
        }
    }

    pub fn profile(self) -> &'static SummaryProfile {
        match self {
            ReportKind::Document => &DOCUMENT_PROFILE,
            ReportKind::WebPage => &WEB_PAGE_PROFILE,
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            ReportKind::Document => "document_summary",
            ReportKind::WebPage => "url_summary",
        }
    }

    /// Report path inside `dir`; `<stem>-<uuid>.pdf` when `unique`, else `<stem>.pdf`.
    pub fn report_path(self, dir: &Path, unique: bool) -> PathBuf {
        let name = if unique {
            format!("{}-{}.pdf", self.file_stem(), uuid::Uuid::new_v4().simple())
        } else {
            format!("{}.pdf", self.file_stem())
        };
        dir.join(name)
    }
}

/// Successful pipeline result: `{summary, report_path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOutput {
    /// Raw summary text as returned by the model.
    pub summary: String,
    /// Where the rendered PDF was written.
    pub report_path: PathBuf,
}
