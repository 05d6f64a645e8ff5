//! Report font family lookup.
//!
//! Reports are typeset with an embedded TrueType family, so any script the
//! font covers comes through unchanged. The family is found by file-name
//! stem inside a directory:
//!
//! | Face | Files tried, in order |
//! |------|-----------------------|
//! | regular | `<stem>-Regular.ttf`, `<stem>.ttf` |
//! | bold | `<stem>-Bold.ttf` |
//! | italic | `<stem>-Italic.ttf`, `<stem>-Oblique.ttf`, else regular |
//! | bold italic | `<stem>-BoldItalic.ttf`, `<stem>-BoldOblique.ttf`, else bold |

use crate::config::ServiceConfig;
use crate::error::ReportError;
use genpdf::fonts::{FontData, FontFamily};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where to load the report font family from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFonts {
    dir: PathBuf,
    family: String,
}

impl ReportFonts {
    pub fn new(dir: impl Into<PathBuf>, family: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            family: family.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(&config.font_dir, &config.font_family)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load all four faces. Regular and bold must exist.
    pub fn load(&self) -> Result<FontFamily<FontData>, ReportError> {
        let regular = self.face(&["-Regular", ""])?;
        let bold = self.face(&["-Bold"])?;
        let italic = self
            .face(&["-Italic", "-Oblique"])
            .unwrap_or_else(|_| regular.clone());
        let bold_italic = self
            .face(&["-BoldItalic", "-BoldOblique"])
            .unwrap_or_else(|_| bold.clone());
        debug!("Loaded font family {} from {}", self.family, self.dir.display());
        Ok(FontFamily {
            regular,
            bold,
            italic,
            bold_italic,
        })
    }

    fn face(&self, suffixes: &[&str]) -> Result<FontData, ReportError> {
        let candidate = suffixes
            .iter()
            .map(|s| self.dir.join(format!("{}{}.ttf", self.family, s)))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                self.unavailable(format!(
                    "none of {} found",
                    suffixes
                        .iter()
                        .map(|s| format!("{}{}.ttf", self.family, s))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
        FontData::load(&candidate, None)
            .map_err(|e| self.unavailable(format!("{}: {}", candidate.display(), e)))
    }

    fn unavailable(&self, detail: String) -> ReportError {
        ReportError::FontUnavailable {
            dir: self.dir.clone(),
            family: self.family.clone(),
            detail,
        }
    }
}

impl Default for ReportFonts {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_family_names_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReportFonts::new(dir.path(), "Nope").load().unwrap_err();
        match err {
            ReportError::FontUnavailable { family, detail, .. } => {
                assert_eq!(family, "Nope");
                assert!(detail.contains("Nope-Regular.ttf"), "got: {detail}");
                assert!(detail.contains("Nope.ttf"), "got: {detail}");
            }
            other => panic!("expected FontUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn unreadable_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Fake.ttf"), b"not a font").unwrap();
        std::fs::write(dir.path().join("Fake-Bold.ttf"), b"not a font").unwrap();
        let err = ReportFonts::new(dir.path(), "Fake").load().unwrap_err();
        assert!(matches!(err, ReportError::FontUnavailable { .. }));
        assert!(!err.is_expected());
    }

    #[test]
    fn defaults_follow_config() {
        let fonts = ReportFonts::default();
        assert_eq!(fonts.dir(), Path::new(crate::config::DEFAULT_FONT_DIR));
    }
}
