//! Model interaction: one system + user message pair, one completion back.
//!
//! The rest of the crate talks to the model only through [`LanguageModel`],
//! so tests and embedding applications can substitute their own
//! implementation. [`ProviderModel`] is the production one, backed by any
//! `edgequake_llm` provider.
//!
//! There is no retry here: a failed or timed-out call surfaces straight to
//! the requester as an upstream error.

use crate::error::ReportError;
use crate::prompts::SummaryProfile;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A single completion request.
#[derive(Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Attached image for vision requests (OCR of uploaded pictures).
    pub image: Option<ImageData>,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl CompletionRequest {
    /// A text-only summary request built from `profile`.
    pub fn summary(profile: &SummaryProfile, text: &str, temperature: f32, max_tokens: usize) -> Self {
        Self {
            system_prompt: profile.system.to_string(),
            user_prompt: profile.user_prompt(text),
            image: None,
            temperature,
            max_tokens,
        }
    }
}

/// A chat model that turns a prompt pair into text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ReportError>;
}

/// [`LanguageModel`] backed by an `edgequake_llm` provider, with a per-call
/// timeout.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

#[async_trait]
impl LanguageModel for ProviderModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ReportError> {
        let start = Instant::now();
        let messages = build_messages(&request);
        let options = build_options(&request);

        let response = tokio::time::timeout(self.timeout, self.provider.chat(&messages, Some(&options)))
            .await
            .map_err(|_| {
                warn!("LLM call timed out after {:?}", self.timeout);
                ReportError::UpstreamTimeout {
                    secs: self.timeout.as_secs(),
                }
            })?
            .map_err(|e| ReportError::Upstream {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    let user = match &request.image {
        Some(image) => ChatMessage::user_with_images(request.user_prompt.as_str(), vec![image.clone()]),
        None => ChatMessage::user(request.user_prompt.as_str()),
    };
    vec![ChatMessage::system(request.system_prompt.as_str()), user]
}

fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

/// Ask `model` for a summary of `text` under `profile`.
pub async fn summarize(
    model: &dyn LanguageModel,
    profile: &SummaryProfile,
    text: &str,
    temperature: f32,
    max_tokens: usize,
) -> Result<String, ReportError> {
    debug!("Summarising {} chars (max_tokens={})", text.len(), max_tokens);
    model
        .complete(CompletionRequest::summary(profile, text, temperature, max_tokens))
        .await
}
