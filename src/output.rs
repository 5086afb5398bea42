//! Stage outputs and the final scan result.

use crate::card::{CardGame, CardInfo, ExchangeRates};
use serde::{Deserialize, Serialize};

/// Raw text recognised by the OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub text: String,
    /// Engine confidence in `0..=100`. Engines that cannot estimate it report 0.
    pub confidence: f32,
}

/// Fields guessed from the recognised text. Empty string means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCandidate {
    pub possible_name: String,
    pub possible_set: String,
    pub possible_number: String,
}

impl ParsedCandidate {
    /// A catalog query is only meaningful with a name.
    pub fn has_name(&self) -> bool {
        !self.possible_name.is_empty()
    }
}

/// Results from one catalog, before concatenation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResults {
    pub source: CardGame,
    pub cards: Vec<CardInfo>,
}

/// Per-stage wall-clock timings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStats {
    pub ocr_duration_ms: u64,
    pub search_duration_ms: u64,
    pub rates_duration_ms: u64,
    pub total_duration_ms: u64,
    /// True when the title crop failed and the full image was recognised.
    pub used_full_image: bool,
}

/// Everything a scan produces.
///
/// An empty `cards` list is a valid outcome: "no card identified".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutput {
    /// OCR text (empty for manual searches).
    pub extracted_text: String,
    pub confidence: f32,
    pub candidate: ParsedCandidate,
    /// Candidates, first catalog's matches first.
    pub cards: Vec<CardInfo>,
    pub rates: ExchangeRates,
    pub stats: ScanStats,
}

impl ScanOutput {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
