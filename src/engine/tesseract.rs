//! Local OCR through the system `tesseract` binary (via `rusty-tesseract`).
//!
//! ## Why spawn_blocking?
//!
//! `rusty-tesseract` writes the image to a temp file and waits on a child
//! process. That is blocking I/O that can take seconds on a large photo, so it
//! runs on the blocking pool instead of stalling a Tokio worker.
//!
//! We call `image_to_data` rather than `image_to_string`: the TSV output has
//! both the words (with their line numbers) and per-word confidences, so a
//! single tesseract run yields the text and its confidence.

use super::{EngineEvent, EventSink, OcrEngine};
use crate::error::OcrError;
use crate::output::RecognizedText;
use crate::pipeline::input::RawImage;
use async_trait::async_trait;
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use tracing::{debug, info};

/// Tesseract word-level entries have `level == 5`.
const WORD_LEVEL: i32 = 5;

/// OCR engine backed by the local `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    dpi: i32,
    /// Page segmentation mode. 3 = fully automatic, tesseract's own default.
    psm: i32,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self { dpi: 150, psm: 3 }
    }
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dpi(mut self, dpi: i32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_psm(mut self, psm: i32) -> Self {
        self.psm = psm;
        self
    }

    fn engine_error(detail: impl ToString) -> OcrError {
        OcrError::Engine {
            engine: "tesseract".to_string(),
            detail: detail.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
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
        events(EngineEvent::new("loading image", 1.0));

        info!(
            "Running tesseract ({}) on {}x{} image",
            language,
            decoded.width(),
            decoded.height()
        );

        let args = Args {
            lang: language.to_string(),
            config_variables: HashMap::new(),
            dpi: Some(self.dpi),
            psm: Some(self.psm),
            oem: Some(3),
        };

        events(EngineEvent::recognizing(0.0));
        let output = tokio::task::spawn_blocking(move || {
            let tess_img = Image::from_dynamic_image(&decoded)?;
            rusty_tesseract::image_to_data(&tess_img, &args)
        })
        .await
        .map_err(|e| Self::engine_error(format!("OCR task panicked: {e}")))?
        .map_err(Self::engine_error)?;
        events(EngineEvent::recognizing(1.0));

        let words: Vec<Word> = output
            .data
            .into_iter()
            .filter(|d| d.level == WORD_LEVEL)
            .map(|d| Word {
                line: (d.page_num, d.block_num, d.par_num, d.line_num),
                conf: d.conf,
                text: d.text,
            })
            .collect();

        let result = assemble(&words);
        debug!(
            "tesseract: {} words, confidence {:.1}",
            words.len(),
            result.confidence
        );
        Ok(result)
    }
}

/// One recognised word and the line it belongs to.
#[derive(Debug, Clone)]
struct Word {
    line: (i32, i32, i32, i32),
    conf: f32,
    text: String,
}

/// Join words into newline-separated lines and average their confidence.
///
/// Tesseract reports `-1` confidence for layout rows; those and blank words
/// are ignored.
fn assemble(words: &[Word]) -> RecognizedText {
    let mut text = String::new();
    let mut current_line = None;
    let mut conf_sum = 0.0f32;
    let mut conf_count = 0usize;

    for word in words.iter().filter(|w| !w.text.trim().is_empty()) {
        match current_line {
            Some(line) if line == word.line => text.push(' '),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_line = Some(word.line);
        text.push_str(word.text.trim());

        if word.conf >= 0.0 {
            conf_sum += word.conf;
            conf_count += 1;
        }
    }

    let confidence = if conf_count == 0 {
        0.0
    } else {
        (conf_sum / conf_count as f32).clamp(0.0, 100.0)
    };

    RecognizedText { text, confidence }
}
