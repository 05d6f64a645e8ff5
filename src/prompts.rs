//! Prompt profiles for the summarization and transcription calls.
//!
//! Two summary profiles exist. Uploaded documents get a flat "summarize
//! this" request whose answer is prose plus `* ` bullets. Web pages get a
//! structured request asking for `**bold**` section headers and bullet
//! lists, which [`crate::pipeline::normalize`] turns into headed sections.

/// A system prompt plus the wrapper placed around the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryProfile {
    /// Sent as the system message.
    pub system: &'static str,
    /// Prepended to the source text in the user message.
    pub user_prefix: &'static str,
}

impl SummaryProfile {
    /// Build the user message for `text`.
    pub fn user_prompt(&self, text: &str) -> String {
        format!("{}{}", self.user_prefix, text)
    }
}

/// Profile used for uploaded documents (flat prose + bullets).
pub const DOCUMENT_PROFILE: SummaryProfile = SummaryProfile {
    system: "You are a helpful assistant that extracts key details and summarizes texts.",
    user_prefix: "Summarize this: ",
};

/// Profile used for web pages (bold section headers + bullet lists).
pub const WEB_PAGE_PROFILE: SummaryProfile = SummaryProfile {
    system: "You are a helpful assistant that summarizes content in structured format \
using section titles and bullet points. Use bold for section headers.",
    user_prefix: "Summarize this webpage into clearly structured sections using bullet \
points and bold section headers:\n",
};

/// System prompt for transcribing an uploaded image to plain text.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe all text visible in the image.

Rules:
- Preserve the reading order a human would use
- Keep line breaks between paragraphs, list items and table rows
- Output ONLY the transcribed text, with no commentary or Markdown fences
- If the image contains no text, output nothing"#;
