//! Price normalisation: USD market price → `$`, `R$`, `₿` display strings.
//!
//! Rates are refreshed at most once per TTL. The two quote sources are asked
//! concurrently and must both succeed; otherwise the whole refresh yields
//! the fixed fallback (no partial update). The fallback is returned but not
//! cached, so the next call retries the sources.
//!
//! Concurrent callers that find the cache empty queue on a refresh lock. A
//! caller that waited while another refresh finished takes that outcome
//! (fallback included) instead of fetching again, so one expiry or one
//! outage triggers one fetch.

use crate::cache::{MemoryCache, TtlCache};
use crate::card::{CardInfo, DisplayPrice, ExchangeRates};
use crate::config::ScanConfig;
use crate::rates::{CoinGeckoBtc, ExchangeRateApi, QuoteSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const RATES_KEY: &str = "rates:usd";

/// Format a USD amount in the three display currencies.
///
/// Total for any finite, non-negative `usd_price`.
pub fn convert(usd_price: f64, rates: &ExchangeRates) -> DisplayPrice {
    DisplayPrice {
        usd: format!("${:.2}", usd_price),
        brl: format!("R${:.2}", usd_price * rates.brl),
        btc: format!("₿{:.8}", usd_price * rates.btc),
    }
}

/// The display price for a card's regular or foil printing.
///
/// `None` when the catalog reported no market price for that printing; the
/// caller shows "price unavailable" instead.
pub fn get_display_price(card: &CardInfo, is_foil: bool, rates: &ExchangeRates) -> Option<DisplayPrice> {
    card.price_for(is_foil).map(|usd| convert(usd, rates))
}

/// Fetches, caches and falls back for [`ExchangeRates`].
pub struct PriceNormalizer {
    fiat: Arc<dyn QuoteSource>,
    btc: Arc<dyn QuoteSource>,
    cache: Arc<dyn TtlCache<ExchangeRates>>,
    fallback: ExchangeRates,
    /// Outcome of the most recent refresh attempt.
    refresh: Mutex<Option<ExchangeRates>>,
    /// Completed refresh attempts. Bumped while holding `refresh`.
    attempts: AtomicU64,
}

impl PriceNormalizer {
    /// `fiat` quotes BRL per USD; `btc` quotes USD per BTC.
    pub fn new(
        fiat: Arc<dyn QuoteSource>,
        btc: Arc<dyn QuoteSource>,
        cache: Arc<dyn TtlCache<ExchangeRates>>,
    ) -> Self {
        Self {
            fiat,
            btc,
            cache,
            fallback: ExchangeRates::FALLBACK,
            refresh: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(
            Arc::new(ExchangeRateApi::new(config)),
            Arc::new(CoinGeckoBtc::new(config)),
            Arc::new(MemoryCache::<ExchangeRates>::new(config.rates_ttl())),
        )
        .with_fallback(config.fallback_rates)
    }

    pub fn with_fallback(mut self, fallback: ExchangeRates) -> Self {
        self.fallback = fallback;
        self
    }

    /// Current rates: cached, freshly fetched, or the fallback. Never fails.
    pub async fn rates(&self) -> ExchangeRates {
        if let Some(rates) = self.cache.get(RATES_KEY) {
            return rates;
        }

        let seen = self.attempts.load(Ordering::SeqCst);
        let mut last = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(rates) = self.cache.get(RATES_KEY) {
            debug!("Rates refreshed by a concurrent caller");
            return rates;
        }
        if self.attempts.load(Ordering::SeqCst) != seen {
            if let Some(rates) = *last {
                debug!("Reusing concurrent refresh outcome");
                return rates;
            }
        }

        let rates = self.fetch().await;
        *last = Some(rates);
        self.attempts.fetch_add(1, Ordering::SeqCst);
        rates
    }

    async fn fetch(&self) -> ExchangeRates {
        match tokio::try_join!(self.fiat.fetch(), self.btc.fetch()) {
            Ok((brl, btc_usd)) => {
                let rates = ExchangeRates {
                    brl,
                    btc: 1.0 / btc_usd,
                };
                info!("Exchange rates: 1 USD = {:.4} BRL = {:.8} BTC", rates.brl, rates.btc);
                self.cache.set(RATES_KEY, rates);
                rates
            }
            Err(e) => {
                warn!("Exchange rate refresh failed, using fallback rates: {}", e);
                self.fallback
            }
        }
    }

    pub fn convert(&self, usd_price: f64, rates: &ExchangeRates) -> DisplayPrice {
        convert(usd_price, rates)
    }
}
