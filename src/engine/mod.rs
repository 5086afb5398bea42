//! OCR engines: the black box that turns pixels into text.
//!
//! The pipeline only depends on the [`OcrEngine`] trait. Two implementations
//! ship with the crate:
//!
//! * [`tesseract::TesseractEngine`]: the local `tesseract` binary. Offline,
//!   reports a real per-word confidence.
//! * [`vision::VisionEngine`]: a vision LLM asked to transcribe the crop.
//!
//! Engines report progress as [`EngineEvent`]s, each tagged with the phase it
//! belongs to. Only the [`STATUS_RECOGNIZING`] phase is surfaced to callers;
//! see [`crate::pipeline::ocr`].

pub mod tesseract;
pub mod vision;

use crate::error::OcrError;
use crate::output::RecognizedText;
use crate::pipeline::input::RawImage;
use async_trait::async_trait;
use std::sync::Arc;

/// Phase name for the text recognition pass.
pub const STATUS_RECOGNIZING: &str = "recognizing text";

/// A progress report from an engine. `progress` is in `0.0..=1.0` within the phase.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub status: String,
    pub progress: f32,
}

impl EngineEvent {
    pub fn new(status: impl Into<String>, progress: f32) -> Self {
        Self {
            status: status.into(),
            progress,
        }
    }

    pub fn recognizing(progress: f32) -> Self {
        Self::new(STATUS_RECOGNIZING, progress)
    }
}

/// Where an engine sends its progress events. Cheap to clone into worker threads.
pub type EventSink = Arc<dyn Fn(EngineEvent) + Send + Sync>;

/// A sink that drops every event.
pub fn discard_events() -> EventSink {
    Arc::new(|_| {})
}

/// Optical character recognition engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs and errors.
    fn name(&self) -> &str;

    /// Recognise all text in `image` using the single `language` tag.
    async fn recognize(
        &self,
        image: &RawImage,
        language: &str,
        events: EventSink,
    ) -> Result<RecognizedText, OcrError>;
}
