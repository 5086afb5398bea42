//! System prompt for the vision OCR backend.
//!
//! The model is asked for a plain transcription, not an identification: the
//! candidate parser downstream expects OCR-shaped text (name on the first
//! line, set code and collector number somewhere below), and letting the
//! model "fix" the name would hide misreads the catalogs could still match.

/// Default system prompt for transcribing a card crop.
pub const TRANSCRIBE_PROMPT: &str = r#"You are an OCR engine. Transcribe every piece of printed text visible in the image of a trading card.

Rules:
1. Output plain text only. No Markdown, no code fences, no commentary.
2. One line of output per line of printed text, top to bottom, left to right.
3. The first line must be the card title exactly as printed.
4. Keep set codes and collector numbers (e.g. "M10", "123/249") exactly as printed.
5. Do not guess text you cannot read. Do not translate. Do not add the card's name if it is not visible.
6. If there is no readable text, output nothing."#;

/// Prompt with the OCR language hint appended.
pub fn transcribe_prompt(language: &str) -> String {
    format!("{TRANSCRIBE_PROMPT}\n\nExpected language (Tesseract code): {language}")
}
