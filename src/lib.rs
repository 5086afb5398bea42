//! # cardscan
//!
//! Identify a trading card from a photo and price it in USD, BRL and BTC.
//!
//! Supports Magic: The Gathering (Scryfall) and Pokémon TCG (pokemontcg.io).
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Crop    keep the top 25% where the name is printed
//!  ├─ 2. OCR     tesseract (default) or a vision LLM
//!  ├─ 3. Parse   name / set code / collector number heuristics
//!  ├─ 4. Search  Scryfall + pokemontcg.io concurrently, 5 s timeout, 5 min cache
//!  └─ 5. Price   USD market price → $, R$, ₿ with cached exchange rates
//! ```
//!
//! Only two conditions abort a scan: the OCR engine failing, and OCR text
//! with no usable first line. Catalog and rate-source failures degrade to an
//! empty candidate list and fixed fallback rates respectively.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardscan::{RawImage, ScanConfig, Scanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::from_config(&ScanConfig::default())?;
//!     let image = RawImage::Encoded(std::fs::read("card.jpg")?);
//!     let output = scanner.process_scan(&image, None).await?;
//!     for card in &output.cards {
//!         match scanner.get_display_price(card, false, &output.rates) {
//!             Some(p) => println!("{} ({}) {} {} {}", card.name, card.set, p.usd, p.brl, p.btc),
//!             None => println!("{} ({}) price unavailable", card.name, card.set),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cardscan` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! The tesseract backend needs the `tesseract` executable and language data
//! on `PATH`. The vision backend needs an LLM API key instead (see
//! [`engine::vision`]).

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cache;
pub mod card;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod rates;
pub mod scan;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cache::{Clock, ManualClock, MemoryCache, SystemClock, TtlCache};
pub use card::{CardGame, CardInfo, CardPrices, DisplayPrice, ExchangeRates};
pub use catalog::{CardCatalog, PokemonTcgCatalog, ScryfallCatalog};
pub use config::{OcrBackend, ScanConfig, ScanConfigBuilder};
pub use engine::{EngineEvent, OcrEngine};
pub use error::{CardScanError, CatalogError, OcrError, PreprocessError, RatesError};
pub use output::{ParsedCandidate, RecognizedText, ScanOutput, ScanStats, SourceResults};
pub use pipeline::input::RawImage;
pub use pipeline::ocr::TextExtractor;
pub use pipeline::price::{convert, get_display_price, PriceNormalizer};
pub use pipeline::search::CardSearch;
pub use progress::{NoopProgressCallback, ScanProgressCallback, ScanStage};
pub use rates::{CoinGeckoBtc, ExchangeRateApi, QuoteSource};
pub use scan::Scanner;
pub use stream::{scan_stream, ScanEvent};
