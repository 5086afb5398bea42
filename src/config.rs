//! Configuration types for card scanning.
//!
//! All scan behaviour is controlled through [`ScanConfig`], built via its
//! [`ScanConfigBuilder`]. Endpoints are configurable so tests and mirrors can
//! point the catalogs elsewhere; everything else has a default matching the
//! public services the scanner talks to.

use crate::card::ExchangeRates;
use crate::error::CardScanError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a [`crate::scan::Scanner`].
///
/// # Example
/// ```rust
/// use cardscan::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .search_timeout_secs(3)
///     .language("eng")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// Tesseract language tag. Default: `"eng"`.
    pub language: String,

    /// Fraction of the image height kept by the title crop. Default: 0.25.
    ///
    /// Both supported games print the card name in the top quarter.
    pub title_crop_ratio: f32,

    /// OCR engine used by [`crate::scan::Scanner::from_config`]. Default: Tesseract.
    pub ocr_backend: OcrBackend,

    /// Per-catalog request timeout in seconds. Default: 5.
    ///
    /// A catalog that misses the deadline contributes no results; the other
    /// catalog's results are still returned.
    pub search_timeout_secs: u64,

    /// Search result cache TTL in seconds. Default: 300.
    pub search_cache_ttl_secs: u64,

    /// Exchange rate cache TTL in seconds. Default: 300.
    pub rates_ttl_secs: u64,

    /// Timeout for each rate source request in seconds. Default: 10.
    pub rates_timeout_secs: u64,

    /// Query is cut to this many whitespace-separated words. Default: 3.
    ///
    /// OCR first lines often carry mana symbols or HP digits after the name;
    /// long queries make both catalogs return nothing.
    pub max_query_tokens: usize,

    /// Maximum MTG results kept per search. Default: 5.
    pub mtg_result_cap: usize,

    /// `pageSize` sent to the Pokémon catalog. Default: 5.
    pub pokemon_page_size: usize,

    pub scryfall_base_url: String,
    pub pokemon_base_url: String,

    /// Optional pokemontcg.io key, sent as `X-Api-Key`. Raises the rate limit.
    pub pokemon_api_key: Option<String>,

    pub fiat_rates_url: String,
    pub btc_price_url: String,

    /// Rates returned when a refresh fails. Default: BRL 5.0, BTC 0.00001.
    pub fallback_rates: ExchangeRates,

    /// Timeout for downloading an image given as a URL. Default: 60.
    pub download_timeout_secs: u64,

    /// `User-Agent` header for every outgoing request. Scryfall asks for one.
    pub user_agent: String,

    /// Vision backend: model id, e.g. `"gpt-4.1-nano"`.
    pub model: Option<String>,

    /// Vision backend: provider name (`"openai"`, `"anthropic"`, `"ollama"`, …).
    pub provider_name: Option<String>,

    /// Vision backend: pre-constructed provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Vision backend: retries on transient API failure. Default: 2.
    pub vision_max_retries: u32,

    /// Vision backend: initial backoff in ms, doubled per retry. Default: 500.
    pub vision_retry_backoff_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            title_crop_ratio: 0.25,
            ocr_backend: OcrBackend::default(),
            search_timeout_secs: 5,
            search_cache_ttl_secs: 300,
            rates_ttl_secs: 300,
            rates_timeout_secs: 10,
            max_query_tokens: 3,
            mtg_result_cap: 5,
            pokemon_page_size: 5,
            scryfall_base_url: "https://api.scryfall.com".to_string(),
            pokemon_base_url: "https://api.pokemontcg.io/v2".to_string(),
            pokemon_api_key: None,
            fiat_rates_url: "https://api.exchangerate-api.com/v4/latest/USD".to_string(),
            btc_price_url:
                "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd"
                    .to_string(),
            fallback_rates: ExchangeRates::FALLBACK,
            download_timeout_secs: 60,
            user_agent: concat!("cardscan/", env!("CARGO_PKG_VERSION")).to_string(),
            model: None,
            provider_name: None,
            provider: None,
            vision_max_retries: 2,
            vision_retry_backoff_ms: 500,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("language", &self.language)
            .field("title_crop_ratio", &self.title_crop_ratio)
            .field("ocr_backend", &self.ocr_backend)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("search_cache_ttl_secs", &self.search_cache_ttl_secs)
            .field("rates_ttl_secs", &self.rates_ttl_secs)
            .field("max_query_tokens", &self.max_query_tokens)
            .field("scryfall_base_url", &self.scryfall_base_url)
            .field("pokemon_base_url", &self.pokemon_base_url)
            .field("pokemon_api_key", &self.pokemon_api_key.as_ref().map(|_| "<redacted>"))
            .field("fallback_rates", &self.fallback_rates)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.search_cache_ttl_secs)
    }

    pub fn rates_ttl(&self) -> Duration {
        Duration::from_secs(self.rates_ttl_secs)
    }
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn title_crop_ratio(mut self, ratio: f32) -> Self {
        self.config.title_crop_ratio = ratio;
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs;
        self
    }

    pub fn search_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.search_cache_ttl_secs = secs;
        self
    }

    pub fn rates_ttl_secs(mut self, secs: u64) -> Self {
        self.config.rates_ttl_secs = secs;
        self
    }

    pub fn rates_timeout_secs(mut self, secs: u64) -> Self {
        self.config.rates_timeout_secs = secs;
        self
    }

    pub fn max_query_tokens(mut self, n: usize) -> Self {
        self.config.max_query_tokens = n;
        self
    }

    pub fn mtg_result_cap(mut self, n: usize) -> Self {
        self.config.mtg_result_cap = n.max(1);
        self
    }

    pub fn pokemon_page_size(mut self, n: usize) -> Self {
        self.config.pokemon_page_size = n.clamp(1, 250);
        self
    }

    pub fn scryfall_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.scryfall_base_url = url.into();
        self
    }

    pub fn pokemon_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.pokemon_base_url = url.into();
        self
    }

    pub fn pokemon_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.pokemon_api_key = Some(key.into());
        self
    }

    pub fn fiat_rates_url(mut self, url: impl Into<String>) -> Self {
        self.config.fiat_rates_url = url.into();
        self
    }

    pub fn btc_price_url(mut self, url: impl Into<String>) -> Self {
        self.config.btc_price_url = url.into();
        self
    }

    pub fn fallback_rates(mut self, rates: ExchangeRates) -> Self {
        self.config.fallback_rates = rates;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn vision_max_retries(mut self, n: u32) -> Self {
        self.config.vision_max_retries = n;
        self
    }

    pub fn vision_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.vision_retry_backoff_ms = ms;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, CardScanError> {
        let c = &self.config;
        if !(c.title_crop_ratio > 0.0 && c.title_crop_ratio <= 1.0) {
            return Err(CardScanError::InvalidConfig(format!(
                "title crop ratio must be in (0, 1], got {}",
                c.title_crop_ratio
            )));
        }
        if c.language.trim().is_empty() {
            return Err(CardScanError::InvalidConfig("OCR language must not be empty".into()));
        }
        if c.search_timeout_secs == 0 || c.rates_timeout_secs == 0 || c.download_timeout_secs == 0
        {
            return Err(CardScanError::InvalidConfig("timeouts must be ≥ 1 second".into()));
        }
        if c.max_query_tokens == 0 {
            return Err(CardScanError::InvalidConfig("max query tokens must be ≥ 1".into()));
        }
        if c.fallback_rates.brl <= 0.0 || c.fallback_rates.btc <= 0.0 {
            return Err(CardScanError::InvalidConfig("fallback rates must be positive".into()));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which OCR engine reads the card title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Local `tesseract` binary. No network, reports per-word confidence. (default)
    #[default]
    Tesseract,
    /// A vision LLM transcribes the crop. Better on foils and glare, costs tokens.
    Vision,
}
