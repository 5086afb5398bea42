//! Progress-callback trait for scan events.
//!
//! Pass an [`Arc<dyn ScanProgressCallback>`] to
//! [`crate::scan::Scanner::process_scan`] to receive stage changes and an
//! overall 0–100 progress value while a scan runs.
//!
//! Overall progress is OCR progress scaled into 0–50, then fixed steps:
//! 50 once text is parsed, 80 once candidates are found, 100 when rates are
//! in. The values a callback sees never decrease.
//!
//! # Example
//!
//! ```rust
//! use cardscan::{ScanProgressCallback, ScanStage};
//! use std::sync::Mutex;
//!
//! struct Bar {
//!     last: Mutex<f32>,
//! }
//!
//! impl ScanProgressCallback for Bar {
//!     fn on_stage(&self, stage: ScanStage) {
//!         eprintln!("{stage}...");
//!     }
//!
//!     fn on_progress(&self, percent: f32) {
//!         *self.last.lock().unwrap() = percent;
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// Coarse pipeline stage, reported as each one begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStage {
    /// Cropping and text recognition.
    Ocr,
    /// Catalog lookup for the parsed name.
    Search,
    /// Exchange-rate refresh.
    Prices,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScanStage::Ocr => "Reading card",
            ScanStage::Search => "Searching catalogs",
            ScanStage::Prices => "Fetching exchange rates",
        })
    }
}

/// Called by the scan pipeline as it moves through its stages.
///
/// All methods default to no-ops so callers only override what they need.
/// Calls for one scan come from a single task, in order.
pub trait ScanProgressCallback: Send + Sync {
    fn on_stage(&self, stage: ScanStage) {
        let _ = stage;
    }

    /// Overall progress, 0–100, non-decreasing.
    fn on_progress(&self, percent: f32) {
        let _ = percent;
    }

    /// Called once when a scan finishes with `candidates` cards (may be 0).
    fn on_complete(&self, candidates: usize) {
        let _ = candidates;
    }

    /// Called once when a scan aborts. `retryable` mirrors
    /// [`crate::error::CardScanError::is_retryable`].
    fn on_error(&self, error: &str, retryable: bool) {
        let _ = (error, retryable);
    }
}

/// A callback that ignores everything.
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}

pub type ProgressCallback = Arc<dyn ScanProgressCallback>;
