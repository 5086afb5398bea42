//! The scan-to-price entry points.
//!
//! A [`Scanner`] owns one instance of every stage, including the two
//! process-wide caches, so build it once and share it (it is `Send + Sync`).

use crate::card::{CardGame, CardInfo, DisplayPrice, ExchangeRates};
use crate::config::{OcrBackend, ScanConfig};
use crate::engine::tesseract::TesseractEngine;
use crate::engine::vision::VisionEngine;
use crate::engine::OcrEngine;
use crate::error::CardScanError;
use crate::output::{ParsedCandidate, ScanOutput, ScanStats};
use crate::pipeline::crop::crop_or_original;
use crate::pipeline::input::{resolve_input, RawImage};
use crate::pipeline::ocr::{ProgressFn, TextExtractor};
use crate::pipeline::parse::parse;
use crate::pipeline::price::{self, PriceNormalizer};
use crate::pipeline::search::CardSearch;
use crate::progress::{ProgressCallback, ScanStage};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Overall progress once OCR is done and the text is parsed.
const PROGRESS_PARSED: f32 = 50.0;
/// Overall progress once catalog search has returned.
const PROGRESS_SEARCHED: f32 = 80.0;
const PROGRESS_DONE: f32 = 100.0;

/// Scan pipeline: crop → OCR → parse → search → rates.
pub struct Scanner {
    crop_ratio: f32,
    download_timeout_secs: u64,
    extractor: TextExtractor,
    search: CardSearch,
    prices: PriceNormalizer,
}

impl Scanner {
    /// Assemble a scanner from already-built stages.
    pub fn new(extractor: TextExtractor, search: CardSearch, prices: PriceNormalizer) -> Self {
        Self {
            crop_ratio: 0.25,
            download_timeout_secs: 60,
            extractor,
            search,
            prices,
        }
    }

    /// Build every stage from `config`.
    ///
    /// Fails only when the vision backend is selected and no LLM provider
    /// can be resolved.
    pub fn from_config(config: &ScanConfig) -> Result<Self, CardScanError> {
        let engine: Arc<dyn OcrEngine> = match config.ocr_backend {
            OcrBackend::Tesseract => Arc::new(TesseractEngine::new()),
            OcrBackend::Vision => Arc::new(VisionEngine::from_config(config)?),
        };
        info!("OCR backend: {} ({})", engine.name(), config.language);

        Ok(Self {
            crop_ratio: config.title_crop_ratio,
            download_timeout_secs: config.download_timeout_secs,
            extractor: TextExtractor::new(engine, config.language.clone()),
            search: CardSearch::from_config(config),
            prices: PriceNormalizer::from_config(config),
        })
    }

    pub fn with_crop_ratio(mut self, ratio: f32) -> Self {
        self.crop_ratio = ratio;
        self
    }

    /// Resolve a path, `data:` URI or URL, then scan it.
    pub async fn scan_input(
        &self,
        input: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<ScanOutput, CardScanError> {
        let image = resolve_input(input, self.download_timeout_secs).await?;
        self.process_scan(&image, progress).await
    }

    /// Identify the card in `image` and price its candidates.
    ///
    /// An empty `cards` list in the result means no catalog matched. Only
    /// OCR failure and an unreadable name abort the scan.
    pub async fn process_scan(
        &self,
        image: &RawImage,
        progress: Option<ProgressCallback>,
    ) -> Result<ScanOutput, CardScanError> {
        let result = self.run_scan(image, progress.as_ref()).await;
        if let Some(cb) = progress {
            match &result {
                Ok(out) => cb.on_complete(out.cards.len()),
                Err(e) => cb.on_error(&e.to_string(), e.is_retryable()),
            }
        }
        result
    }

    async fn run_scan(
        &self,
        image: &RawImage,
        progress: Option<&ProgressCallback>,
    ) -> Result<ScanOutput, CardScanError> {
        let total_start = Instant::now();

        // ── Step 1: Crop the title band ──────────────────────────────────
        if let Some(cb) = progress {
            cb.on_stage(ScanStage::Ocr);
            cb.on_progress(0.0);
        }
        let prepared = crop_or_original(image, self.crop_ratio);

        // ── Step 2: OCR; recognition maps onto the first half ────────────
        let ocr_start = Instant::now();
        let on_ocr: Option<ProgressFn> = progress.map(|cb| {
            let cb = cb.clone();
            Arc::new(move |pct: f32| cb.on_progress(pct * 0.5)) as ProgressFn
        });
        let recognized = self.extractor.recognize(&prepared.image, on_ocr).await?;
        let ocr_duration_ms = ocr_start.elapsed().as_millis() as u64;

        // ── Step 3: Parse ────────────────────────────────────────────────
        let candidate = parse(&recognized.text);
        debug!(
            "Parsed name='{}' set='{}' number='{}'",
            candidate.possible_name, candidate.possible_set, candidate.possible_number
        );
        if !candidate.has_name() {
            warn!("No card name in OCR output ({} chars)", recognized.text.len());
            return Err(CardScanError::NoCardName {
                extracted_text: recognized.text,
            });
        }
        if let Some(cb) = progress {
            cb.on_progress(PROGRESS_PARSED);
        }

        // ── Step 4 + 5: Search and price ─────────────────────────────────
        let mut output = self
            .search_and_price(&candidate.possible_name, None, progress)
            .await;
        output.extracted_text = recognized.text;
        output.confidence = recognized.confidence;
        output.candidate = candidate;
        output.stats.ocr_duration_ms = ocr_duration_ms;
        output.stats.used_full_image = !prepared.cropped;
        output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

        info!(
            "Scan complete: '{}' → {} candidate(s) in {}ms",
            output.candidate.possible_name,
            output.cards.len(),
            output.stats.total_duration_ms
        );
        Ok(output)
    }

    /// Search by typed name, skipping OCR. A blank query yields no cards
    /// and makes no catalog requests.
    pub async fn search_manual(
        &self,
        query: &str,
        game: Option<CardGame>,
    ) -> Result<ScanOutput, CardScanError> {
        let total_start = Instant::now();
        let mut output = self.search_and_price(query, game, None).await;
        output.candidate = ParsedCandidate {
            possible_name: query.trim().to_string(),
            ..ParsedCandidate::default()
        };
        output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        Ok(output)
    }

    async fn search_and_price(
        &self,
        query: &str,
        game: Option<CardGame>,
        progress: Option<&ProgressCallback>,
    ) -> ScanOutput {
        if let Some(cb) = progress {
            cb.on_stage(ScanStage::Search);
        }
        let search_start = Instant::now();
        let cards = self.search.search(query, game).await;
        let search_duration_ms = search_start.elapsed().as_millis() as u64;

        if let Some(cb) = progress {
            cb.on_progress(PROGRESS_SEARCHED);
            cb.on_stage(ScanStage::Prices);
        }
        let rates_start = Instant::now();
        let rates = self.prices.rates().await;
        let rates_duration_ms = rates_start.elapsed().as_millis() as u64;
        if let Some(cb) = progress {
            cb.on_progress(PROGRESS_DONE);
        }

        ScanOutput {
            extracted_text: String::new(),
            confidence: 0.0,
            candidate: ParsedCandidate::default(),
            cards,
            rates,
            stats: ScanStats {
                search_duration_ms,
                rates_duration_ms,
                ..ScanStats::default()
            },
        }
    }

    /// Current exchange rates (cached, fetched, or fallback).
    pub async fn rates(&self) -> ExchangeRates {
        self.prices.rates().await
    }

    /// Display price for a card's regular or foil printing, or `None` when
    /// the catalog has no market price for it.
    pub fn get_display_price(
        &self,
        card: &CardInfo,
        is_foil: bool,
        rates: &ExchangeRates,
    ) -> Option<DisplayPrice> {
        price::get_display_price(card, is_foil, rates)
    }
}
