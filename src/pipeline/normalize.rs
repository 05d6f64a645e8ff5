//! Markup normalisation: loosely-structured summary text → [`ContentBlock`]s.
//!
//! The model answers in a small Markdown subset: `**bold**` spans, whole
//! lines wrapped in `**` used as section headers, and bullet lines. This
//! module turns that text into an ordered block sequence that the report
//! renderer can lay out without re-parsing anything.
//!
//! Rules, applied line by line after trimming:
//!
//! 1. Blank lines are dropped. They never close an open bullet group.
//! 2. *(Structured only)* A line that starts and ends with `**` and is
//!    longer than the delimiter is a [`ContentBlock::SectionHeader`].
//! 3. A bullet line (`* `, plus `+ ` and `- ` in Structured mode) joins the
//!    open bullet group.
//! 4. Anything else is a [`ContentBlock::Paragraph`].
//!
//! Headers and paragraphs close the open bullet group. Normalisation never
//! fails: unrecognised markup is passed through as literal text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Bold delimiter used for both inline emphasis and header lines.
pub const BOLD: &str = "**";

/// Normalisation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Uploaded-document summaries: prose and `* ` bullets, no headers.
    Flat,
    /// Web-page summaries: bold header lines, `*`/`+`/`-` bullets.
    Structured,
}

/// Text with zero or more bold runs.
///
/// `text` has the bold delimiters removed; `emphasis` holds byte ranges of
/// `text` that render bold, in ascending, non-overlapping order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineText {
    pub text: String,
    pub emphasis: Vec<Range<usize>>,
}

impl InlineText {
    /// Text without any emphasis.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            emphasis: Vec::new(),
        }
    }

    /// Parse paired `**…**` spans out of `line`.
    ///
    /// Each pair becomes a bold run and loses its delimiters. Unpaired
    /// delimiters stay in the text as literal characters.
    pub fn parse(line: &str) -> Self {
        static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

        let mut text = String::with_capacity(line.len());
        let mut emphasis = Vec::new();
        let mut last = 0;
        for caps in RE_BOLD.captures_iter(line) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            text.push_str(&line[last..whole.start()]);
            let start = text.len();
            text.push_str(inner.as_str());
            emphasis.push(start..text.len());
            last = whole.end();
        }
        text.push_str(&line[last..]);
        Self { text, emphasis }
    }

    /// Split into `(fragment, bold)` runs covering the whole text, in order.
    /// Empty fragments are skipped.
    pub fn runs(&self) -> Vec<(&str, bool)> {
        let mut runs = Vec::with_capacity(self.emphasis.len() * 2 + 1);
        let mut pos = 0;
        for range in &self.emphasis {
            if range.start > pos {
                runs.push((&self.text[pos..range.start], false));
            }
            if !range.is_empty() {
                runs.push((&self.text[range.clone()], true));
            }
            pos = range.end;
        }
        if pos < self.text.len() {
            runs.push((&self.text[pos..], false));
        }
        runs
    }

    /// Re-insert the bold delimiters around every emphasised run.
    pub fn to_markup(&self) -> String {
        self.runs()
            .into_iter()
            .map(|(s, bold)| {
                if bold {
                    format!("{BOLD}{s}{BOLD}")
                } else {
                    s.to_string()
                }
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One normalised unit of report content.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// Report title; exactly one, always first.
    Title(String),
    /// A bold-delimited heading line.
    SectionHeader(String),
    /// One line of body text.
    Paragraph(InlineText),
    /// One or more consecutive bullet lines, in order.
    BulletGroup(Vec<InlineText>),
    /// Vertical whitespace in points. Inserted by the renderer, never by
    /// [`normalize`].
    Spacing(f32),
}

/// Convert summary text into blocks, led by a `Title(title)` block.
pub fn normalize(raw: &str, mode: Mode, title: &str) -> Vec<ContentBlock> {
    let mut blocks = vec![ContentBlock::Title(title.to_string())];
    let mut bullets: Vec<InlineText> = Vec::new();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if mode == Mode::Structured {
            if let Some(header) = header_text(line) {
                flush_bullets(&mut blocks, &mut bullets);
                blocks.push(ContentBlock::SectionHeader(header));
                continue;
            }
        }

        if let Some(item) = strip_bullet(line, mode) {
            bullets.push(InlineText::parse(item));
            continue;
        }

        flush_bullets(&mut blocks, &mut bullets);
        blocks.push(ContentBlock::Paragraph(InlineText::parse(line)));
    }

    flush_bullets(&mut blocks, &mut bullets);
    blocks
}

fn flush_bullets(blocks: &mut Vec<ContentBlock>, bullets: &mut Vec<InlineText>) {
    if !bullets.is_empty() {
        blocks.push(ContentBlock::BulletGroup(std::mem::take(bullets)));
    }
}

/// Header text if `line` is wrapped in bold delimiters, else `None`.
///
/// `****` yields an empty header. Every delimiter inside the header is
/// removed, paired or not, since the whole header renders bold anyway.
fn header_text(line: &str) -> Option<String> {
    if line.len() <= BOLD.len() || !line.starts_with(BOLD) || !line.ends_with(BOLD) {
        return None;
    }
    Some(line.replace(BOLD, "").trim().to_string())
}

/// The item text of a bullet line, without its prefix, or `None`.
fn strip_bullet(line: &str, mode: Mode) -> Option<&str> {
    let markers: &[char] = match mode {
        Mode::Flat => &['*'],
        Mode::Structured => &['*', '+', '-'],
    };
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !markers.contains(&marker) {
        return None;
    }
    let rest = chars.as_str();
    rest.starts_with(' ').then(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(blocks: &[ContentBlock]) -> &[ContentBlock] {
        assert!(matches!(blocks.first(), Some(ContentBlock::Title(_))));
        &blocks[1..]
    }

    fn items(texts: &[&str]) -> ContentBlock {
        ContentBlock::BulletGroup(texts.iter().map(|t| InlineText::plain(*t)).collect())
    }

    fn para(text: &str) -> ContentBlock {
        ContentBlock::Paragraph(InlineText::plain(text))
    }

    #[test]
    fn title_always_first() {
        let blocks = normalize("hello", Mode::Flat, "Document Summary");
        assert_eq!(blocks[0], ContentBlock::Title("Document Summary".into()));
    }

    #[test]
    fn empty_input_only_title() {
        for mode in [Mode::Flat, Mode::Structured] {
            let blocks = normalize("", mode, "T");
            assert_eq!(blocks, vec![ContentBlock::Title("T".into())]);
            let blocks = normalize("   \n\n \t \n", mode, "T");
            assert_eq!(blocks.len(), 1);
        }
    }

    #[test]
    fn plain_lines_one_paragraph_each_in_order() {
        let blocks = normalize("first\n\nsecond\n   third  \n", Mode::Flat, "T");
        assert_eq!(body(&blocks), &[para("first"), para("second"), para("third")]);
    }

    #[test]
    fn consecutive_bullets_form_one_group() {
        for n in 1..=6 {
            let text: String = (0..n).map(|i| format!("* item {i}\n")).collect();
            let blocks = normalize(&text, Mode::Flat, "T");
            let body = body(&blocks);
            assert_eq!(body.len(), 1, "n={n}");
            match &body[0] {
                ContentBlock::BulletGroup(items) => assert_eq!(items.len(), n),
                other => panic!("expected bullet group, got {other:?}"),
            }
        }
    }

    #[test]
    fn flat_bullets_example() {
        let blocks = normalize("* Item A\n* Item B", Mode::Flat, "Document Summary");
        assert_eq!(body(&blocks), &[items(&["Item A", "Item B"])]);
    }

    #[test]
    fn structured_example() {
        let blocks = normalize(
            "**Overview**\n* Point one\n* Point two\nSome closing remark.",
            Mode::Structured,
            "Web Page Summary",
        );
        assert_eq!(
            body(&blocks),
            &[
                ContentBlock::SectionHeader("Overview".into()),
                items(&["Point one", "Point two"]),
                para("Some closing remark."),
            ]
        );
    }

    #[test]
    fn blank_line_does_not_split_bullets() {
        let blocks = normalize("* a\n\n   \n* b", Mode::Flat, "T");
        assert_eq!(body(&blocks), &[items(&["a", "b"])]);
    }

    #[test]
    fn paragraph_closes_group() {
        let blocks = normalize("* a\nmiddle\n* b", Mode::Flat, "T");
        assert_eq!(body(&blocks), &[items(&["a"]), para("middle"), items(&["b"])]);
    }

    #[test]
    fn flat_mode_has_no_headers() {
        let blocks = normalize("**Overview**", Mode::Flat, "T");
        let expected = ContentBlock::Paragraph(InlineText {
            text: "Overview".into(),
            emphasis: vec![0..8],
        });
        assert_eq!(body(&blocks), &[expected]);
    }

    #[test]
    fn flat_mode_ignores_plus_and_dash() {
        let blocks = normalize("- a\n+ b", Mode::Flat, "T");
        assert_eq!(body(&blocks), &[para("- a"), para("+ b")]);
    }

    #[test]
    fn structured_accepts_all_markers() {
        let blocks = normalize("* a\n+ b\n- c", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[items(&["a", "b", "c"])]);
    }

    #[test]
    fn marker_needs_a_space_not_a_tab() {
        let blocks = normalize("-\tc\n*\td", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[para("-\tc"), para("*\td")]);
    }

    #[test]
    fn marker_without_space_is_not_bullet() {
        let blocks = normalize("-5 degrees\n*emphasis*", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[para("-5 degrees"), para("*emphasis*")]);
    }

    #[test]
    fn header_flushes_open_group() {
        let blocks = normalize("- a\n**Next**\n- b", Mode::Structured, "T");
        assert_eq!(
            body(&blocks),
            &[
                items(&["a"]),
                ContentBlock::SectionHeader("Next".into()),
                items(&["b"]),
            ]
        );
    }

    #[test]
    fn header_wins_over_bullet() {
        let blocks = normalize("*** not a bullet**", Mode::Structured, "T");
        assert_eq!(
            body(&blocks),
            &[ContentBlock::SectionHeader("* not a bullet".into())]
        );
    }

    #[test]
    fn empty_header_is_degenerate_not_error() {
        let blocks = normalize("****", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[ContentBlock::SectionHeader(String::new())]);
    }

    #[test]
    fn bare_delimiter_is_paragraph() {
        let blocks = normalize("**", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[para("**")]);
    }

    #[test]
    fn header_inner_pairs_dropped() {
        let blocks = normalize("**Key** and **Other**", Mode::Structured, "T");
        assert_eq!(
            body(&blocks),
            &[ContentBlock::SectionHeader("Key and Other".into())]
        );
    }

    #[test]
    fn header_drops_unpaired_inner_delimiter() {
        let blocks = normalize("**Rates ** rise**", Mode::Structured, "T");
        assert_eq!(
            body(&blocks),
            &[ContentBlock::SectionHeader("Rates  rise".into())]
        );
    }

    #[test]
    fn header_is_trimmed() {
        let blocks = normalize("**  Spaced  **", Mode::Structured, "T");
        assert_eq!(body(&blocks), &[ContentBlock::SectionHeader("Spaced".into())]);
    }

    #[test]
    fn inline_emphasis_in_bullet() {
        let blocks = normalize("* **Key:** value", Mode::Flat, "T");
        let expected = InlineText {
            text: "Key: value".into(),
            emphasis: vec![0..4],
        };
        assert_eq!(body(&blocks), &[ContentBlock::BulletGroup(vec![expected])]);
    }

    #[test]
    fn emphasis_multiple_runs() {
        let t = InlineText::parse("a **b** c **d**");
        assert_eq!(t.text, "a b c d");
        assert_eq!(t.emphasis, vec![2..3, 6..7]);
        assert_eq!(
            t.runs(),
            vec![("a ", false), ("b", true), (" c ", false), ("d", true)]
        );
    }

    #[test]
    fn unpaired_delimiter_is_literal() {
        let t = InlineText::parse("price ** rises");
        assert_eq!(t.text, "price ** rises");
        assert!(t.emphasis.is_empty());

        let t = InlineText::parse("**a** then **");
        assert_eq!(t.text, "a then **");
        assert_eq!(t.emphasis, vec![0..1]);
    }

    #[test]
    fn emphasis_on_multibyte_text() {
        let t = InlineText::parse("café **naïve** résumé");
        assert_eq!(&t.text[t.emphasis[0].clone()], "naïve");
    }

    #[test]
    fn renormalising_markup_is_stable() {
        let inputs = [
            "**Overview**\n* The **core** idea\n* Second *point*\nClosing **remark** here.",
            "Plain line\n- dash item with **bold**\n+ plus item\n**Header**\ntext ** odd",
            "* a\n\n* b **c**\nd",
        ];
        for mode in [Mode::Flat, Mode::Structured] {
            for input in inputs {
                let first = normalize(input, mode, "T");
                let rendered = to_markup(&first, mode);
                let second = normalize(&rendered, mode, "T");
                assert_eq!(first, second, "mode={mode:?} input={input:?}");
            }
        }
    }

    /// Render blocks back to summary text with bold markers re-inserted.
    fn to_markup(blocks: &[ContentBlock], mode: Mode) -> String {
        let bullet = match mode {
            Mode::Flat => "* ",
            Mode::Structured => "- ",
        };
        let mut out = Vec::new();
        for block in blocks {
            match block {
                ContentBlock::Title(_) | ContentBlock::Spacing(_) => {}
                ContentBlock::SectionHeader(h) => out.push(format!("{BOLD}{h}{BOLD}")),
                ContentBlock::Paragraph(p) => out.push(p.to_markup()),
                ContentBlock::BulletGroup(items) => {
                    for item in items {
                        out.push(format!("{bullet}{}", item.to_markup()));
                    }
                }
            }
        }
        out.join("\n")
    }
}
