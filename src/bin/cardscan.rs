//! CLI binary for cardscan.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ScanConfig` and prints candidates with their prices.

use anyhow::{Context, Result};
use cardscan::{
    CardGame, CardScanError, OcrBackend, ScanConfig, ScanOutput, ScanProgressCallback, ScanStage,
    Scanner,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One 0–100 bar for the whole scan; the prefix names the current stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:<24.bold} [{bar:32.green/238}] {pos:>3}%  {elapsed}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = ProgressBar::new(100);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: ScanStage) {
        self.bar.set_prefix(stage.to_string());
    }

    fn on_progress(&self, percent: f32) {
        self.bar.set_position(percent.round() as u64);
    }

    fn on_complete(&self, _candidates: usize) {
        self.bar.finish_and_clear();
    }

    fn on_error(&self, _error: &str, _retryable: bool) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan a photo (local tesseract)
  cardscan bolt.jpg

  # Foil printing prices, JSON output
  cardscan --foil --json charizard.png > result.json

  # Skip OCR and search by name
  cardscan --query "Lightning Bolt" --game mtg

  # Scan a photo from a URL with a vision LLM
  cardscan --ocr-backend vision --model gpt-4.1-mini https://example.com/card.jpg

INPUT:
  A local file path, a data:image/...;base64,... URI, or an HTTP/HTTPS URL.
  Only the top quarter of the photo (where the card name is printed) is read.

ENVIRONMENT VARIABLES:
  CARDSCAN_POKEMON_API_KEY  pokemontcg.io API key (optional, raises rate limits)
  OPENAI_API_KEY            OpenAI API key (vision backend)
  ANTHROPIC_API_KEY         Anthropic API key (vision backend)
  GEMINI_API_KEY            Google Gemini API key (vision backend)
  RUST_LOG                  Override log filter

SETUP:
  The default backend shells out to `tesseract`; install it and the language
  data for --language (e.g. `apt install tesseract-ocr tesseract-ocr-eng`).
"#;

/// Identify a trading card from a photo and price it in USD, BRL and BTC.
#[derive(Parser, Debug)]
#[command(
    name = "cardscan",
    version,
    about = "Identify Magic: The Gathering and Pokémon cards from a photo and price them",
    long_about = "Read the card name from a photo with OCR, look it up on Scryfall and \
pokemontcg.io, and print each candidate's market price in USD, BRL and BTC.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Card photo: local path, data URI, or HTTP/HTTPS URL.
    #[arg(required_unless_present = "query")]
    input: Option<String>,

    /// Search by name instead of scanning a photo.
    #[arg(long, conflicts_with = "input")]
    query: Option<String>,

    /// Restrict a --query search to one game: mtg or pokemon.
    #[arg(long, requires = "query")]
    game: Option<CardGame>,

    /// Show foil prices instead of regular ones.
    #[arg(long, env = "CARDSCAN_FOIL")]
    foil: bool,

    /// Output structured JSON (ScanOutput) instead of a table.
    #[arg(long, env = "CARDSCAN_JSON")]
    json: bool,

    /// OCR engine: tesseract or vision.
    #[arg(long, env = "CARDSCAN_OCR_BACKEND", value_enum, default_value = "tesseract")]
    ocr_backend: BackendArg,

    /// Tesseract language tag.
    #[arg(long, env = "CARDSCAN_LANGUAGE", default_value = "eng")]
    language: String,

    /// Vision LLM model ID (vision backend only).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama (vision backend only).
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Per-catalog search timeout in seconds.
    #[arg(long, env = "CARDSCAN_TIMEOUT", default_value_t = 5,
          value_parser = clap::value_parser!(u64).range(1..=120))]
    timeout: u64,

    /// pokemontcg.io API key.
    #[arg(long, env = "CARDSCAN_POKEMON_API_KEY", hide_env_values = true)]
    pokemon_api_key: Option<String>,

    /// Disable progress bar.
    #[arg(long, env = "CARDSCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CARDSCAN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "CARDSCAN_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BackendArg {
    Tesseract,
    Vision,
}

impl From<BackendArg> for OcrBackend {
    fn from(v: BackendArg) -> Self {
        match v {
            BackendArg::Tesseract => OcrBackend::Tesseract,
            BackendArg::Vision => OcrBackend::Vision,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && cli.query.is_none();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build scanner ────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let scanner = Scanner::from_config(&config).context("Failed to initialise scanner")?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = if let Some(ref query) = cli.query {
        scanner
            .search_manual(query, cli.game)
            .await
            .context("Search failed")?
    } else {
        let input = cli.input.as_deref().unwrap_or_default();
        let progress = show_progress
            .then(|| CliProgressCallback::new() as Arc<dyn ScanProgressCallback>);
        match scanner.scan_input(input, progress).await {
            Ok(output) => output,
            Err(CardScanError::NoCardName { extracted_text }) if !cli.quiet => {
                if !extracted_text.trim().is_empty() {
                    eprintln!("{}", dim("Recognised text:"));
                    eprintln!("{}", dim(extracted_text.trim()));
                }
                anyhow::bail!(CardScanError::NoCardName { extracted_text });
            }
            Err(e) => return Err(e).context("Scan failed"),
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_report(&scanner, &output, &cli);
    }

    Ok(())
}

/// Map CLI args to `ScanConfig`.
fn build_config(cli: &Cli) -> Result<ScanConfig> {
    let mut builder = ScanConfig::builder()
        .language(cli.language.clone())
        .ocr_backend(cli.ocr_backend.clone().into())
        .search_timeout_secs(cli.timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref key) = cli.pokemon_api_key {
        builder = builder.pokemon_api_key(key.clone());
    }

    builder.build().context("Invalid configuration")
}

fn print_report(scanner: &Scanner, output: &ScanOutput, cli: &Cli) {
    if !cli.quiet && !output.extracted_text.is_empty() {
        eprintln!("{}", dim("Recognised text:"));
        eprintln!("{}", dim(output.extracted_text.trim()));
        let c = &output.candidate;
        eprintln!(
            "{} name={}  set={}  number={}",
            dim("Parsed:"),
            bold(&c.possible_name),
            if c.possible_set.is_empty() { "-" } else { c.possible_set.as_str() },
            if c.possible_number.is_empty() { "-" } else { c.possible_number.as_str() },
        );
        eprintln!();
    }

    if output.cards.is_empty() {
        eprintln!(
            "{} No card found for '{}'",
            red("✘"),
            output.candidate.possible_name
        );
        return;
    }

    println!(
        "{:<3} {:<8} {:<32} {:<7} {:<6} {:<10} {:>10} {:>12} {:>13}",
        "#", "GAME", "NAME", "SET", "NO.", "RARITY", "USD", "BRL", "BTC"
    );
    for (i, card) in output.cards.iter().enumerate() {
        let (usd, brl, btc) = match scanner.get_display_price(card, cli.foil, &output.rates) {
            Some(p) => (p.usd, p.brl, p.btc),
            None => ("n/a".to_string(), "n/a".to_string(), "n/a".to_string()),
        };
        println!(
            "{:<3} {:<8} {:<32} {:<7} {:<6} {:<10} {:>10} {:>12} {:>13}",
            i + 1,
            card.game.as_str(),
            truncate(&card.name, 32),
            card.set,
            card.number,
            truncate(&card.rarity, 10),
            usd,
            brl,
            btc,
        );
    }

    if !cli.quiet {
        eprintln!();
        eprintln!(
            "{} {} candidate(s){}  {}",
            green("✔"),
            output.cards.len(),
            if cli.foil { " (foil prices)" } else { "" },
            dim(&format!(
                "1 USD = R${:.2} = ₿{:.8}  ·  {}ms",
                output.rates.brl, output.rates.btc, output.stats.total_duration_ms
            )),
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max - 1).collect();
        t.push('…');
        t
    }
}
