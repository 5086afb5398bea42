//! Vision-LLM OCR: ask a multimodal model to transcribe the title crop.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) gives 500 ms → 1 s with the defaults.
//! After the last attempt the error becomes an [`OcrError`], which is
//! pipeline-fatal like any other OCR failure.
//!
//! Models return no confidence score, so [`RecognizedText::confidence`] is 0.

use super::{EngineEvent, EventSink, OcrEngine};
use crate::config::ScanConfig;
use crate::error::{CardScanError, OcrError};
use crate::output::RecognizedText;
use crate::pipeline::encode::encode_for_vision;
use crate::pipeline::input::RawImage;
use crate::prompts::transcribe_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// OCR engine that delegates to a vision LLM.
pub struct VisionEngine {
    provider: Arc<dyn LLMProvider>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl VisionEngine {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }

    /// Build from the scan config, resolving the provider.
    pub fn from_config(config: &ScanConfig) -> Result<Self, CardScanError> {
        Ok(Self {
            provider: resolve_provider(config)?,
            max_retries: config.vision_max_retries,
            retry_backoff_ms: config.vision_retry_backoff_ms,
        })
    }

    pub fn with_retries(mut self, max_retries: u32, backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = backoff_ms;
        self
    }
}

#[async_trait]
impl OcrEngine for VisionEngine {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(
        &self,
        image: &RawImage,
        language: &str,
        events: EventSink,
    ) -> Result<RecognizedText, OcrError> {
        events(EngineEvent::new("loading image", 0.0));
        let decoded = image
            .decode()
            .map_err(|e| OcrError::UnsupportedImage(e.to_string()))?;
        let image_data =
            encode_for_vision(&decoded).map_err(|e| OcrError::UnsupportedImage(e.to_string()))?;
        events(EngineEvent::new("loading image", 1.0));

        let messages = vec![
            ChatMessage::system(transcribe_prompt(language)),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(512),
            ..Default::default()
        };

        events(EngineEvent::recognizing(0.0));
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Vision OCR: retry {}/{} after {}ms",
                    attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "Vision OCR: {} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    events(EngineEvent::recognizing(1.0));
                    return Ok(RecognizedText {
                        text: strip_fences(&response.content),
                        confidence: 0.0,
                    });
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    warn!("Vision OCR: attempt {} failed: {}", attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(OcrError::Engine {
            engine: "vision".to_string(),
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

/// Models sometimes wrap the answer in a code fence despite the prompt.
fn strip_fences(content: &str) -> String {
    let trimmed = content.trim();
    if let Some(inner) = trimmed.strip_prefix("```") {
        let inner = inner.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
        return inner.trim_end_matches("```").trim().to_string();
    }
    trimmed.to_string()
}

/// Resolve the LLM provider, from most-specific to least-specific:
/// pre-built provider, named provider + model, then environment detection.
fn resolve_provider(config: &ScanConfig) -> Result<Arc<dyn LLMProvider>, CardScanError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CardScanError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or use --ocr-backend tesseract.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, CardScanError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CardScanError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
