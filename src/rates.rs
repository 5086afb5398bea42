//! Exchange-rate quote sources.
//!
//! Two independent HTTP sources feed [`crate::pipeline::price::PriceNormalizer`]:
//! a fiat table (USD → BRL) and a spot BTC price in USD. Each returns one
//! positive number or a [`RatesError`]; combining, caching and falling back
//! is the normalizer's job.

use crate::catalog::http_client;
use crate::config::ScanConfig;
use crate::error::RatesError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// One exchange-rate quote fetched over the network.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch the current quote. Always finite and > 0 on success.
    async fn fetch(&self) -> Result<f64, RatesError>;
}

/// USD → BRL from exchangerate-api.com (`{"rates": {"BRL": 5.1, ...}}`).
pub struct ExchangeRateApi {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl ExchangeRateApi {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: http_client(config),
            url: config.fiat_rates_url.clone(),
            timeout: Duration::from_secs(config.rates_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FiatTable {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

#[async_trait]
impl QuoteSource for ExchangeRateApi {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    async fn fetch(&self) -> Result<f64, RatesError> {
        let table: FiatTable = get_json(self.name(), &self.client, &self.url, self.timeout).await?;
        positive(self.name(), table.rates.get("BRL").copied(), "rates.BRL")
    }
}

/// BTC spot price in USD from CoinGecko (`{"bitcoin": {"usd": 65000.0}}`).
pub struct CoinGeckoBtc {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl CoinGeckoBtc {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: http_client(config),
            url: config.btc_price_url.clone(),
            timeout: Duration::from_secs(config.rates_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    bitcoin: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: Option<f64>,
}

#[async_trait]
impl QuoteSource for CoinGeckoBtc {
    fn name(&self) -> &str {
        "coingecko"
    }

    async fn fetch(&self) -> Result<f64, RatesError> {
        let price: SimplePrice = get_json(self.name(), &self.client, &self.url, self.timeout).await?;
        positive(
            self.name(),
            price.bitcoin.and_then(|b| b.usd),
            "bitcoin.usd",
        )
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(
    source_name: &str,
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<T, RatesError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| RatesError::Request {
            source_name: source_name.to_string(),
            detail: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RatesError::Http {
            source_name: source_name.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|e| RatesError::InvalidQuote {
        source_name: source_name.to_string(),
        detail: e.to_string(),
    })
}

fn positive(source_name: &str, value: Option<f64>, field: &str) -> Result<f64, RatesError> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(RatesError::InvalidQuote {
            source_name: source_name.to_string(),
            detail: format!("{field} = {v}"),
        }),
        None => Err(RatesError::InvalidQuote {
            source_name: source_name.to_string(),
            detail: format!("{field} missing"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fiat_table_decodes() {
        let t: FiatTable =
            serde_json::from_str(r#"{"base":"USD","rates":{"USD":1,"BRL":5.42,"EUR":0.92}}"#)
                .unwrap();
        assert_eq!(positive("x", t.rates.get("BRL").copied(), "rates.BRL").unwrap(), 5.42);
    }

    #[test]
    fn btc_price_decodes() {
        let p: SimplePrice = serde_json::from_str(r#"{"bitcoin":{"usd":64000.5}}"#).unwrap();
        assert_eq!(p.bitcoin.and_then(|b| b.usd), Some(64000.5));
    }

    #[test]
    fn missing_or_non_positive_quote_rejected() {
        assert!(positive("x", None, "f").is_err());
        assert!(positive("x", Some(0.0), "f").is_err());
        assert!(positive("x", Some(-1.0), "f").is_err());
        assert!(positive("x", Some(f64::NAN), "f").is_err());
        let t: FiatTable = serde_json::from_str(r#"{"rates":{"EUR":0.9}}"#).unwrap();
        assert!(matches!(
            positive("x", t.rates.get("BRL").copied(), "rates.BRL"),
            Err(RatesError::InvalidQuote { .. })
        ));
    }
}
