//! Candidate parsing: guess name, set code, and collector number from OCR text.
//!
//! Pure string heuristics, no I/O:
//!
//! * **Name**: the first non-blank line, stripped of everything except
//!   letters, digits, `_`, `'`, `-` and whitespace, then whitespace-collapsed.
//! * **Set code**: first word-bounded token of 2–4 capitals plus up to three
//!   digits (`NEO`, `SV1`, `XY12`), or one capital plus 1–3 digits (`M10`,
//!   `A25`). Searched over the whole text.
//! * **Collector number**: first `<digits>/<digits>` (or backslash) pair;
//!   only the numerator is kept.
//!
//! The set and number patterns scan the whole text, so a ratio in rules text
//! can be mistaken for the collector number. The title crop keeps most rules
//! text out of the OCR input, which is the only mitigation.

use crate::output::ParsedCandidate;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_NAME_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s'-]").unwrap());

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_SET_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{2,4}[0-9]{0,3}|[A-Z][0-9]{1,3})\b").unwrap());

static RE_COLLECTOR_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{1,3})\s*[/\\]\s*([0-9]{1,3})").unwrap());

/// Parse raw OCR text into a [`ParsedCandidate`].
pub fn parse(text: &str) -> ParsedCandidate {
    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let possible_set = RE_SET_CODE
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let possible_number = RE_COLLECTOR_NUMBER
        .captures(text)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    ParsedCandidate {
        possible_name: clean_name(first_line),
        possible_set,
        possible_number,
    }
}

/// Remove OCR debris from a title line.
pub fn clean_name(line: &str) -> String {
    let stripped = RE_NAME_JUNK.replace_all(line, "");
    RE_WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}
