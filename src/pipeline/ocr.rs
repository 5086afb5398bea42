//! Text extraction: run the OCR engine and expose its progress.
//!
//! Engines emit events for every phase they go through (loading, layout,
//! recognition). Callers only care about recognition, so the extractor keeps
//! [`STATUS_RECOGNIZING`] events, scales them from `0..=1` to `0..=100`, and
//! drops any value lower than one already reported. The resulting sequence is
//! monotonically non-decreasing.
//!
//! Progress is a side channel: pass a [`ProgressFn`] directly, or create one
//! with [`progress_channel`] and consume the returned stream while awaiting
//! [`TextExtractor::recognize`].

use crate::engine::{EngineEvent, EventSink, OcrEngine, STATUS_RECOGNIZING};
use crate::error::OcrError;
use crate::output::RecognizedText;
use crate::pipeline::input::RawImage;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

/// Receives recognition progress in `0.0..=100.0`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// A [`ProgressFn`] that forwards into a stream.
///
/// The stream ends once every clone of the returned function is dropped,
/// i.e. after `recognize` returns.
pub fn progress_channel() -> (ProgressFn, UnboundedReceiverStream<f32>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let f: ProgressFn = Arc::new(move |p| {
        // Receiver gone means nobody is watching; not an error.
        let _ = tx.send(p);
    });
    (f, UnboundedReceiverStream::new(rx))
}

/// Runs a single-language OCR engine.
#[derive(Clone)]
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
    language: String,
}

impl TextExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>, language: impl Into<String>) -> Self {
        Self {
            engine,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Recognise text in `image`.
    ///
    /// Engine failures propagate; there is no local retry.
    pub async fn recognize(
        &self,
        image: &RawImage,
        on_progress: Option<ProgressFn>,
    ) -> Result<RecognizedText, OcrError> {
        let start = Instant::now();
        let sink = recognition_sink(on_progress);

        match self.engine.recognize(image, &self.language, sink).await {
            Ok(result) => {
                info!(
                    "OCR ({}) finished in {}ms: {} chars, confidence {:.1}",
                    self.engine.name(),
                    start.elapsed().as_millis(),
                    result.text.len(),
                    result.confidence
                );
                Ok(result)
            }
            Err(e) => {
                error!("OCR ({}) failed: {}", self.engine.name(), e);
                Err(e)
            }
        }
    }
}

/// Map raw engine events onto monotonic recognition percentages.
fn recognition_sink(on_progress: Option<ProgressFn>) -> EventSink {
    let Some(on_progress) = on_progress else {
        return crate::engine::discard_events();
    };
    let last = Mutex::new(0.0f32);
    Arc::new(move |event: EngineEvent| {
        if event.status != STATUS_RECOGNIZING {
            return;
        }
        let pct = (event.progress * 100.0).clamp(0.0, 100.0);
        if pct.is_nan() {
            return;
        }
        let mut last = last.lock().unwrap_or_else(|e| e.into_inner());
        if pct >= *last {
            *last = pct;
            on_progress(pct);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;

    /// Replays a fixed list of events, then returns fixed text.
    struct ScriptedEngine {
        events: Vec<EngineEvent>,
        fail: bool,
    }

    #[async_trait]
    impl OcrEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn recognize(
            &self,
            _image: &RawImage,
            language: &str,
            events: EventSink,
        ) -> Result<RecognizedText, OcrError> {
            assert_eq!(language, "eng");
            for e in &self.events {
                events(e.clone());
            }
            if self.fail {
                return Err(OcrError::Engine {
                    engine: "scripted".into(),
                    detail: "boom".into(),
                });
            }
            Ok(RecognizedText {
                text: "Lightning Bolt".into(),
                confidence: 91.0,
            })
        }
    }

    fn image() -> RawImage {
        RawImage::Encoded(vec![])
    }

    #[tokio::test]
    async fn only_recognition_phase_is_reported_and_scaled() {
        let engine = ScriptedEngine {
            events: vec![
                EngineEvent::new("loading language traineddata", 0.5),
                EngineEvent::recognizing(0.0),
                EngineEvent::recognizing(0.25),
                EngineEvent::new("initializing api", 1.0),
                EngineEvent::recognizing(1.0),
            ],
            fail: false,
        };
        let extractor = TextExtractor::new(Arc::new(engine), "eng");
        let (progress, stream) = progress_channel();

        let result = extractor.recognize(&image(), Some(progress)).await.unwrap();
        drop(extractor);
        let seen: Vec<f32> = stream.collect().await;

        assert_eq!(result.text, "Lightning Bolt");
        assert_eq!(seen, vec![0.0, 25.0, 100.0]);
    }

    #[tokio::test]
    async fn regressions_and_out_of_range_values_are_clamped_monotonic() {
        let engine = ScriptedEngine {
            events: vec![
                EngineEvent::recognizing(0.5),
                EngineEvent::recognizing(0.25),
                EngineEvent::recognizing(1.7),
                EngineEvent::recognizing(-0.2),
            ],
            fail: false,
        };
        let extractor = TextExtractor::new(Arc::new(engine), "eng");
        let (progress, stream) = progress_channel();
        extractor.recognize(&image(), Some(progress)).await.unwrap();
        drop(extractor);
        let seen: Vec<f32> = stream.collect().await;

        assert_eq!(seen, vec![50.0, 100.0]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn engine_failure_propagates() {
        let engine = ScriptedEngine {
            events: vec![],
            fail: true,
        };
        let extractor = TextExtractor::new(Arc::new(engine), "eng");
        let err = extractor.recognize(&image(), None).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
