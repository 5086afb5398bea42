//! Pipeline stages for scan-to-price.
//!
//! Each submodule implements one transformation step and can be tested on
//! its own. Only [`search`] and [`price`] touch the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ crop ──▶ ocr ──▶ parse ──▶ search ──▶ price
//! (path/URL) (top 25%) (engine) (regex)  (MTG+PTCG)  ($/R$/₿)
//! ```
//!
//! 1. [`input`] : resolve a path, `data:` URI or URL to image bytes
//! 2. [`crop`]  : keep the title band; falls back to the original image
//! 3. [`ocr`]   : run the configured engine, report monotonic progress
//! 4. [`parse`] : guess name, set code and collector number
//! 5. [`search`]: query both catalogs concurrently with timeout and cache
//! 6. [`price`] : fetch exchange rates and format display prices
//!
//! [`encode`] holds the image codec helpers shared by `input` and the vision
//! engine.

pub mod crop;
pub mod encode;
pub mod input;
pub mod ocr;
pub mod parse;
pub mod price;
pub mod search;
