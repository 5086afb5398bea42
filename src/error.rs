//! Error types for the cardscan library.
//!
//! Two families of errors reflect two distinct failure modes:
//!
//! * [`CardScanError`]: **Fatal**: the scan cannot produce a meaningful
//!   result (OCR engine failed, no card name could be read, bad input).
//!   Returned as `Err(CardScanError)` from [`crate::scan::Scanner`].
//!
//! * [`CatalogError`], [`RatesError`], [`PreprocessError`]: **Recoverable**:
//!   one catalog timed out, the rate sources are down, the photo could not be
//!   cropped. These never escape their stage; the stage logs them and degrades
//!   to an empty list, the fallback rates, or the uncropped image.
//!
//! Callers therefore only ever see the two pipeline-fatal conditions plus
//! input/configuration problems, and can map every `CardScanError` to a
//! "try again" prompt.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the cardscan library.
#[derive(Debug, Error)]
pub enum CardScanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input image was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// The input string is not a file path, data URI, or HTTP/HTTPS URL.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Pipeline-fatal errors ─────────────────────────────────────────────
    /// The OCR engine failed or rejected the image.
    #[error("Text recognition failed: {0}\nTry again with a sharper, well-lit photo.")]
    OcrFailed(#[from] OcrError),

    /// OCR produced no usable first line, so there is nothing to search for.
    #[error("No card name could be read from the image.\nTry again with the title clearly visible.")]
    NoCardName {
        /// The raw recognised text, for display next to the retry prompt.
        extracted_text: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The vision OCR backend was selected but no LLM provider is usable.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CardScanError {
    /// True for the two conditions a user can fix by simply rescanning.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CardScanError::OcrFailed(_) | CardScanError::NoCardName { .. })
    }
}

/// Failure reported by an [`crate::engine::OcrEngine`].
#[derive(Debug, Clone, Error)]
pub enum OcrError {
    /// The engine could not read the image bytes.
    #[error("unsupported or unreadable image: {0}")]
    UnsupportedImage(String),

    /// The engine itself failed (binary missing, crashed, API error).
    #[error("{engine} engine error: {detail}")]
    Engine { engine: String, detail: String },
}

/// A non-fatal failure of one catalog request.
///
/// Swallowed by [`crate::pipeline::search::CardSearch`], which logs it and
/// substitutes an empty result for that catalog only.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The request did not finish within the search timeout.
    #[error("{catalog}: request timed out after {secs}s")]
    Timeout { catalog: String, secs: u64 },

    /// The catalog answered with a non-success status other than 404.
    #[error("{catalog}: HTTP {status}")]
    Http { catalog: String, status: u16 },

    /// Connection, TLS, or DNS failure.
    #[error("{catalog}: transport error: {detail}")]
    Transport { catalog: String, detail: String },

    /// The body was not the JSON shape we expect.
    #[error("{catalog}: unexpected response body: {detail}")]
    Decode { catalog: String, detail: String },
}

/// A non-fatal failure fetching exchange rates; triggers the fixed fallback.
#[derive(Debug, Clone, Error)]
pub enum RatesError {
    #[error("{source_name}: request failed: {detail}")]
    Request { source_name: String, detail: String },

    #[error("{source_name}: HTTP {status}")]
    Http { source_name: String, status: u16 },

    #[error("{source_name}: missing or invalid quote: {detail}")]
    InvalidQuote { source_name: String, detail: String },
}

/// A non-fatal failure cropping the title region.
#[derive(Debug, Clone, Error)]
pub enum PreprocessError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("image too small to crop ({width}x{height})")]
    TooSmall { width: u32, height: u32 },
}
