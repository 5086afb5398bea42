//! Canonical card and currency records shared by every pipeline stage.
//!
//! Both catalogs map their own JSON into [`CardInfo`], so callers never see a
//! catalog-specific shape. Optional upstream fields become `None` or a
//! placeholder string rather than disappearing, keeping the serialised shape
//! stable for the UI layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The card games we can identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardGame {
    /// Magic: The Gathering (Scryfall catalog).
    Mtg,
    /// Pokémon TCG (pokemontcg.io catalog).
    Pokemon,
}

impl CardGame {
    /// Short lowercase tag, also used as the cache key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardGame::Mtg => "mtg",
            CardGame::Pokemon => "pokemon",
        }
    }
}

impl fmt::Display for CardGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardGame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mtg" | "magic" => Ok(CardGame::Mtg),
            "pokemon" | "pokémon" | "ptcg" => Ok(CardGame::Pokemon),
            other => Err(format!("unknown card game '{other}' (expected mtg or pokemon)")),
        }
    }
}

/// Market prices in USD as reported by the catalog. `None` means the catalog
/// has no market price for that printing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPrices {
    pub usd: Option<f64>,
    pub usd_foil: Option<f64>,
}

/// A card candidate returned by one catalog.
///
/// `id` is scoped to the catalog named by `game`; the same id may appear in
/// the other catalog for an unrelated card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    pub id: String,
    pub name: String,
    pub game: CardGame,
    /// Upper-cased set code, e.g. `M10`, `SV1`.
    pub set: String,
    pub set_name: String,
    /// Collector number as printed (may contain letters, e.g. `123a`).
    pub number: String,
    pub rarity: String,
    /// Empty string when the catalog has no image.
    pub image_url: String,
    pub artist: Option<String>,
    pub prices: CardPrices,
    /// Type line (MTG) or supertype (Pokémon).
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    /// Oracle text (MTG) or flavor text (Pokémon).
    pub text: Option<String>,
}

impl CardInfo {
    /// The USD price for the requested printing.
    pub fn price_for(&self, is_foil: bool) -> Option<f64> {
        if is_foil {
            self.prices.usd_foil
        } else {
            self.prices.usd
        }
    }
}

/// Units of target currency per 1 USD.
///
/// `btc` is the inverse of the BTC price in USD, so it is tiny (≈ 1e-5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub brl: f64,
    pub btc: f64,
}

impl ExchangeRates {
    /// Fixed rates used whenever a refresh fails.
    pub const FALLBACK: ExchangeRates = ExchangeRates {
        brl: 5.0,
        btc: 0.00001,
    };
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// A USD price rendered in the three display currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPrice {
    /// `$` + two decimals.
    pub usd: String,
    /// `R$` + two decimals.
    pub brl: String,
    /// `₿` + eight decimals.
    pub btc: String,
}
