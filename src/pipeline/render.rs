//! Report rendering: [`ContentBlock`]s → a paginated PDF on disk.
//!
//! Blocks become `genpdf` elements on US-letter pages with one-inch
//! margins; `genpdf` handles wrapping and page breaks. Vertical spacing
//! between blocks is added here according to the normalisation [`Mode`], so
//! the normaliser never emits [`ContentBlock::Spacing`] itself.
//!
//! | Block | Element | Spacing after |
//! |-------|---------|---------------|
//! | `Title` | centred bold 18 pt paragraph | 12 pt |
//! | `SectionHeader` | bold 12 pt, 12 pt before / 8 pt after | none |
//! | `Paragraph` | body 10 pt, bold runs inline | 4 pt (Structured) |
//! | `BulletGroup` | one bulleted list | 6 pt (Structured) |
//!
//! The file is written to a temporary sibling of the target and renamed
//! into place once the whole document has been rendered, so a failed
//! render never leaves a readable partial report behind.

use crate::error::ReportError;
use crate::fonts::ReportFonts;
use crate::pipeline::normalize::{ContentBlock, InlineText, Mode};
use genpdf::elements::{Break, Paragraph, UnorderedList};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Document, Element, Margins, PaperSize, SimplePageDecorator};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Gap after the title block, in points.
pub const TITLE_SPACING: f32 = 12.0;
/// Gap after a paragraph in Structured mode.
pub const PARAGRAPH_SPACING: f32 = 4.0;
/// Gap after a bullet group in Structured mode.
pub const BULLET_GROUP_SPACING: f32 = 6.0;

const TITLE_FONT_SIZE: u8 = 18;
const HEADING_FONT_SIZE: u8 = 12;
const BODY_FONT_SIZE: u8 = 10;
/// One inch.
const PAGE_MARGIN_MM: f64 = 25.4;
const MM_PER_PT: f64 = 25.4 / 72.0;

/// Renders block sequences for one normalisation mode.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    mode: Mode,
    fonts: ReportFonts,
}

impl ReportRenderer {
    pub fn new(mode: Mode, fonts: ReportFonts) -> Self {
        Self { mode, fonts }
    }

    /// `blocks` with [`ContentBlock::Spacing`] inserted per the placement
    /// rules. Spacing blocks already present are kept.
    pub fn place_spacing(&self, blocks: &[ContentBlock]) -> Vec<ContentBlock> {
        let structured = self.mode == Mode::Structured;
        let mut out = Vec::with_capacity(blocks.len() * 2);
        for block in blocks {
            out.push(block.clone());
            let gap = match block {
                ContentBlock::Title(_) => Some(TITLE_SPACING),
                ContentBlock::Paragraph(_) if structured => Some(PARAGRAPH_SPACING),
                ContentBlock::BulletGroup(_) if structured => Some(BULLET_GROUP_SPACING),
                _ => None,
            };
            if let Some(gap) = gap {
                out.push(ContentBlock::Spacing(gap));
            }
        }
        out
    }

    /// Assemble the `genpdf` document for `blocks`, spacing included.
    pub fn document(&self, blocks: &[ContentBlock]) -> Result<Document, ReportError> {
        let mut doc = Document::new(self.fonts.load()?);
        doc.set_paper_size(PaperSize::Letter);
        doc.set_font_size(BODY_FONT_SIZE);
        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(Margins::all(PAGE_MARGIN_MM));
        doc.set_page_decorator(decorator);

        for block in self.place_spacing(blocks) {
            match block {
                ContentBlock::Title(text) => {
                    doc.set_title(text.as_str());
                    let style = Style::new().bold().with_font_size(TITLE_FONT_SIZE);
                    doc.push(
                        Paragraph::new(StyledString::new(text, style)).aligned(Alignment::Center),
                    );
                }
                ContentBlock::SectionHeader(text) => {
                    let style = Style::new().bold().with_font_size(HEADING_FONT_SIZE);
                    doc.push(
                        Paragraph::new(StyledString::new(text, style))
                            .padded(Margins::trbl(12.0 * MM_PER_PT, 0.0, 8.0 * MM_PER_PT, 0.0)),
                    );
                }
                ContentBlock::Paragraph(inline) => doc.push(paragraph(&inline)),
                ContentBlock::BulletGroup(items) => {
                    let mut list = UnorderedList::with_bullet("\u{2022}");
                    for item in &items {
                        list.push(paragraph(item));
                    }
                    doc.push(list);
                }
                ContentBlock::Spacing(height) => {
                    doc.push(Break::new(height / f32::from(BODY_FONT_SIZE)));
                }
            }
        }
        Ok(doc)
    }

    /// Render `blocks` to a PDF at `output_path`, replacing any existing file.
    ///
    /// Blocking; call from `spawn_blocking` inside async code (see
    /// [`render_report`]).
    pub fn render(&self, blocks: &[ContentBlock], output_path: &Path) -> Result<(), ReportError> {
        let doc = self.document(blocks)?;
        debug!("Rendering {} blocks to {}", blocks.len(), output_path.display());

        let write_failed = |source: std::io::Error| ReportError::OutputWriteFailed {
            path: output_path.to_path_buf(),
            source,
        };

        let dir = match output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".docsum-")
            .suffix(".pdf.tmp")
            .tempfile_in(&dir)
            .map_err(write_failed)?;

        {
            let mut writer = BufWriter::new(tmp.as_file());
            doc.render(&mut writer)
                .map_err(|e| write_failed(std::io::Error::other(e.to_string())))?;
            writer.flush().map_err(write_failed)?;
        }

        tmp.persist(output_path).map_err(|e| write_failed(e.error))?;
        info!("Report written: {}", output_path.display());
        Ok(())
    }
}

/// Render on the blocking pool so the async caller is not stalled.
pub async fn render_report(
    blocks: Vec<ContentBlock>,
    mode: Mode,
    fonts: ReportFonts,
    output_path: PathBuf,
) -> Result<(), ReportError> {
    tokio::task::spawn_blocking(move || {
        ReportRenderer::new(mode, fonts).render(&blocks, &output_path)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("Render task panicked: {}", e)))?
}

/// Body-size runs of `inline`, bold where the source was emphasised.
pub fn styled_runs(inline: &InlineText) -> Vec<StyledString> {
    inline
        .runs()
        .into_iter()
        .map(|(text, bold)| {
            let style = if bold { Style::new().bold() } else { Style::new() };
            StyledString::new(text, style)
        })
        .collect()
}

fn paragraph(inline: &InlineText) -> Paragraph {
    let mut p = Paragraph::default();
    for run in styled_runs(inline) {
        p.push(run);
    }
    p
}
