//! Offline integration tests for the full scan pipeline.
//!
//! Every external collaborator (OCR engine, catalogs, rate sources) is
//! replaced by an in-process fake, so these run without network access or a
//! tesseract install.
//!
//! Run with:
//!   cargo test --test pipeline

use async_trait::async_trait;
use cardscan::engine::EventSink;
use cardscan::{
    scan_stream, CardCatalog, CardGame, CardInfo, CardPrices, CardScanError, CardSearch,
    CatalogError, EngineEvent, ExchangeRates, MemoryCache, OcrEngine, OcrError, PriceNormalizer,
    QuoteSource, RatesError, RawImage, RecognizedText, ScanEvent, ScanProgressCallback, ScanStage,
    Scanner, TextExtractor,
};
use futures::StreamExt;
use image::DynamicImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tracing_subscriber::EnvFilter;

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Returns fixed text and records the height of every image it is given.
struct FakeOcr {
    text: Result<String, OcrError>,
    seen_heights: Mutex<Vec<Option<u32>>>,
}

impl FakeOcr {
    fn reading(text: &str) -> Arc<Self> {
        Arc::new(Self {
            text: Ok(text.to_string()),
            seen_heights: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            text: Err(OcrError::Engine {
                engine: "fake".into(),
                detail: "tesseract not installed".into(),
            }),
            seen_heights: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        "fake"
    }

    async fn recognize(
        &self,
        image: &RawImage,
        _language: &str,
        events: EventSink,
    ) -> Result<RecognizedText, OcrError> {
        self.seen_heights
            .lock()
            .unwrap()
            .push(image.decode().ok().map(|i| i.height()));

        events(EngineEvent::new("loading language traineddata", 1.0));
        for p in [0.0, 0.3, 0.2, 0.7, 1.0] {
            events(EngineEvent::recognizing(p));
        }

        self.text.clone().map(|text| RecognizedText {
            text,
            confidence: 88.0,
        })
    }
}

struct FakeCatalog {
    game: CardGame,
    cards: Vec<CardInfo>,
    delay: Duration,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl FakeCatalog {
    fn new(game: CardGame, cards: Vec<CardInfo>) -> Arc<Self> {
        Self::slow(game, cards, Duration::ZERO)
    }

    fn slow(game: CardGame, cards: Vec<CardInfo>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            game,
            cards,
            delay,
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardCatalog for FakeCatalog {
    fn game(&self) -> CardGame {
        self.game
    }

    fn name(&self) -> &str {
        self.game.as_str()
    }

    async fn search(&self, query: &str) -> Result<Vec<CardInfo>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        tokio::time::sleep(self.delay).await;
        Ok(self.cards.clone())
    }
}

struct FakeQuote(Option<f64>);

#[async_trait]
impl QuoteSource for FakeQuote {
    fn name(&self) -> &str {
        "fake"
    }

    async fn fetch(&self) -> Result<f64, RatesError> {
        self.0.ok_or_else(|| RatesError::Request {
            source_name: "fake".into(),
            detail: "dns error".into(),
        })
    }
}

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<ScanStage>>,
    progress: Mutex<Vec<f32>>,
    completed: Mutex<Option<usize>>,
    errors: Mutex<Vec<bool>>,
}

impl ScanProgressCallback for Recorder {
    fn on_stage(&self, stage: ScanStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_progress(&self, percent: f32) {
        self.progress.lock().unwrap().push(percent);
    }

    fn on_complete(&self, candidates: usize) {
        *self.completed.lock().unwrap() = Some(candidates);
    }

    fn on_error(&self, _error: &str, retryable: bool) {
        self.errors.lock().unwrap().push(retryable);
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn card(game: CardGame, id: &str, name: &str, usd: Option<f64>, usd_foil: Option<f64>) -> CardInfo {
    CardInfo {
        id: id.into(),
        name: name.into(),
        game,
        set: "M10".into(),
        set_name: "Magic 2010".into(),
        number: "146".into(),
        rarity: "common".into(),
        image_url: String::new(),
        artist: None,
        prices: CardPrices { usd, usd_foil },
        type_line: None,
        text: None,
    }
}

struct Harness {
    scanner: Scanner,
    ocr: Arc<FakeOcr>,
    mtg: Arc<FakeCatalog>,
    pokemon: Arc<FakeCatalog>,
}

/// Route pipeline logs to the test output. `RUST_LOG=cardscan=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness(ocr: Arc<FakeOcr>, mtg: Arc<FakeCatalog>, pokemon: Arc<FakeCatalog>, rates_ok: bool) -> Harness {
    init_tracing();
    let catalogs: Vec<Arc<dyn CardCatalog>> = vec![mtg.clone(), pokemon.clone()];
    let search = CardSearch::new(
        catalogs,
        Arc::new(MemoryCache::<Vec<CardInfo>>::new(Duration::from_secs(300))),
        Duration::from_secs(5),
    );
    let (fiat, btc) = if rates_ok {
        (FakeQuote(Some(5.0)), FakeQuote(Some(50_000.0)))
    } else {
        (FakeQuote(None), FakeQuote(Some(50_000.0)))
    };
    let prices = PriceNormalizer::new(
        Arc::new(fiat),
        Arc::new(btc),
        Arc::new(MemoryCache::<ExchangeRates>::new(Duration::from_secs(300))),
    );
    let scanner = Scanner::new(TextExtractor::new(ocr.clone(), "eng"), search, prices);
    Harness {
        scanner,
        ocr,
        mtg,
        pokemon,
    }
}

fn photo() -> RawImage {
    RawImage::Bitmap(DynamicImage::new_rgb8(300, 400))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scan_identifies_and_prices_card() {
    let h = harness(
        FakeOcr::reading("Lightning Bolt\nM10 146/249"),
        FakeCatalog::new(CardGame::Mtg, vec![card(CardGame::Mtg, "b1", "Lightning Bolt", Some(10.0), None)]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );

    let out = assert_ok!(h.scanner.process_scan(&photo(), None).await);

    assert_eq!(out.candidate.possible_name, "Lightning Bolt");
    assert_eq!(out.candidate.possible_set, "M10");
    assert_eq!(out.candidate.possible_number, "146");
    assert_eq!(out.extracted_text, "Lightning Bolt\nM10 146/249");
    assert_eq!(out.confidence, 88.0);
    assert_eq!(out.cards.len(), 1);
    assert!(!out.stats.used_full_image);

    let price = h.scanner.get_display_price(&out.cards[0], false, &out.rates).unwrap();
    assert_eq!(price.usd, "$10.00");
    assert_eq!(price.brl, "R$50.00");
    assert_eq!(price.btc, "₿0.00020000");
    assert_eq!(h.scanner.get_display_price(&out.cards[0], true, &out.rates), None);
}

#[tokio::test]
async fn ocr_sees_top_quarter_only() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    h.scanner.process_scan(&photo(), None).await.unwrap();
    assert_eq!(*h.ocr.seen_heights.lock().unwrap(), vec![Some(100)]);
}

#[tokio::test]
async fn undecodable_photo_falls_back_to_original() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let out = h
        .scanner
        .process_scan(&RawImage::Encoded(b"not an image".to_vec()), None)
        .await
        .unwrap();
    assert!(out.stats.used_full_image);
    assert_eq!(*h.ocr.seen_heights.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn only_first_three_words_are_searched() {
    let h = harness(
        FakeOcr::reading("Jace the Mind Sculptor\nWWK 31/145"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let out = h.scanner.process_scan(&photo(), None).await.unwrap();
    assert!(out.is_empty());
    assert_eq!(*h.mtg.queries.lock().unwrap(), vec!["Jace the Mind"]);
    assert_eq!(*h.pokemon.queries.lock().unwrap(), vec!["Jace the Mind"]);
}

#[tokio::test]
async fn ocr_failure_aborts_scan_as_retryable() {
    let h = harness(
        FakeOcr::failing(),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let recorder = Arc::new(Recorder::default());
    let err = assert_err!(h.scanner.process_scan(&photo(), Some(recorder.clone())).await);

    assert!(matches!(err, CardScanError::OcrFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(*recorder.errors.lock().unwrap(), vec![true]);
    assert_eq!(h.mtg.calls(), 0, "no search after OCR failure");
}

#[tokio::test]
async fn blank_text_aborts_with_no_card_name() {
    let h = harness(
        FakeOcr::reading("  \n★ ✦ \n"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let err = assert_err!(h.scanner.process_scan(&photo(), None).await);
    match err {
        CardScanError::NoCardName { extracted_text } => assert!(extracted_text.contains('★')),
        other => panic!("expected NoCardName, got {other:?}"),
    }
    assert_eq!(h.mtg.calls(), 0);
    assert_eq!(h.pokemon.calls(), 0);
}

#[tokio::test]
async fn rates_failure_still_completes_with_fallback() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(
            CardGame::Pokemon,
            vec![card(CardGame::Pokemon, "p1", "Pikachu", Some(2.0), None)],
        ),
        false,
    );
    let out = h.scanner.process_scan(&photo(), None).await.unwrap();
    assert_eq!(out.rates, ExchangeRates { brl: 5.0, btc: 0.00001 });
    let p = h.scanner.get_display_price(&out.cards[0], false, &out.rates).unwrap();
    assert_eq!(p.brl, "R$10.00");
}

#[tokio::test]
async fn progress_is_monotonic_and_stages_ordered() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(
            CardGame::Pokemon,
            vec![card(CardGame::Pokemon, "p1", "Pikachu", None, None)],
        ),
        true,
    );
    let recorder = Arc::new(Recorder::default());
    h.scanner
        .process_scan(&photo(), Some(recorder.clone()))
        .await
        .unwrap();

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![ScanStage::Ocr, ScanStage::Search, ScanStage::Prices]
    );
    let progress = recorder.progress.lock().unwrap().clone();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    // The engine's 0.2 regression after 0.3 is dropped.
    let near = |v: f32| progress.iter().any(|p| (p - v).abs() < 0.01);
    assert!(!near(10.0));
    assert!(near(15.0));
    assert!(progress.contains(&50.0));
    assert!(progress.contains(&80.0));
    assert_eq!(progress.last(), Some(&100.0));
    assert_eq!(*recorder.completed.lock().unwrap(), Some(1));
}

#[tokio::test]
async fn manual_search_skips_ocr() {
    let h = harness(
        FakeOcr::reading("unused"),
        FakeCatalog::new(CardGame::Mtg, vec![card(CardGame::Mtg, "b1", "Lightning Bolt", Some(1.0), None)]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let out = h
        .scanner
        .search_manual("Lightning Bolt", Some(CardGame::Mtg))
        .await
        .unwrap();
    assert_eq!(out.cards.len(), 1);
    assert_eq!(out.candidate.possible_name, "Lightning Bolt");
    assert!(out.extracted_text.is_empty());
    assert!(h.ocr.seen_heights.lock().unwrap().is_empty());
    assert_eq!(h.pokemon.calls(), 0);
}

#[tokio::test]
async fn blank_manual_search_makes_no_requests() {
    let h = harness(
        FakeOcr::reading("unused"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    let out = h.scanner.search_manual("   ", None).await.unwrap();
    assert!(out.cards.is_empty());
    assert_eq!(h.mtg.calls() + h.pokemon.calls(), 0);
}

#[tokio::test]
async fn rescan_served_from_search_cache() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(CardGame::Pokemon, vec![]),
        true,
    );
    h.scanner.process_scan(&photo(), None).await.unwrap();
    h.scanner.process_scan(&photo(), None).await.unwrap();
    assert_eq!(h.mtg.calls(), 1);
    assert_eq!(h.pokemon.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn both_catalogs_timing_out_yield_empty_result() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::slow(CardGame::Mtg, vec![], Duration::from_secs(60)),
        FakeCatalog::slow(CardGame::Pokemon, vec![], Duration::from_secs(60)),
        true,
    );
    let start = tokio::time::Instant::now();
    let out = h.scanner.process_scan(&photo(), None).await.unwrap();
    assert!(out.cards.is_empty());
    assert!(start.elapsed() < Duration::from_secs(6));
}

#[tokio::test]
async fn stream_ends_with_single_finished_event() {
    let h = harness(
        FakeOcr::reading("Pikachu"),
        FakeCatalog::new(CardGame::Mtg, vec![]),
        FakeCatalog::new(
            CardGame::Pokemon,
            vec![card(CardGame::Pokemon, "p1", "Pikachu", Some(0.5), None)],
        ),
        true,
    );
    let events: Vec<ScanEvent> = scan_stream(Arc::new(h.scanner), photo()).collect().await;

    let finished = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Finished(_)))
        .count();
    assert_eq!(finished, 1);
    match events.last() {
        Some(ScanEvent::Finished(Ok(out))) => assert_eq!(out.cards.len(), 1),
        other => panic!("unexpected last event: {other:?}"),
    }
    assert!(matches!(events.first(), Some(ScanEvent::Stage(ScanStage::Ocr))));
}
