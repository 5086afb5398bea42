//! Magic: The Gathering via the Scryfall API.
//!
//! `GET /cards/search?q=<query>&order=released&dir=desc` returns newest
//! printings first; we keep the first `mtg_result_cap` (5). Prices come back
//! as decimal strings and may be null for printings nobody sells.

use super::{fetch_json, http_client, CardCatalog};
use crate::card::{CardGame, CardInfo, CardPrices};
use crate::config::ScanConfig;
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub struct ScryfallCatalog {
    client: reqwest::Client,
    base_url: String,
    result_cap: usize,
}

impl ScryfallCatalog {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: http_client(config),
            base_url: config.scryfall_base_url.trim_end_matches('/').to_string(),
            result_cap: config.mtg_result_cap,
        }
    }
}

#[async_trait]
impl CardCatalog for ScryfallCatalog {
    fn game(&self) -> CardGame {
        CardGame::Mtg
    }

    fn name(&self) -> &str {
        "scryfall"
    }

    async fn search(&self, query: &str) -> Result<Vec<CardInfo>, CatalogError> {
        let request = self
            .client
            .get(format!("{}/cards/search", self.base_url))
            .query(&[("q", query), ("order", "released"), ("dir", "desc")]);

        let Some(list) = fetch_json::<ScryfallList>(self.name(), request).await? else {
            debug!("scryfall: no cards match '{}'", query);
            return Ok(Vec::new());
        };
        Ok(map_cards(list, self.result_cap))
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScryfallList {
    #[serde(default)]
    data: Vec<ScryfallCard>,
}

#[derive(Debug, Deserialize)]
struct ScryfallCard {
    id: String,
    name: String,
    #[serde(default)]
    set: String,
    #[serde(default)]
    set_name: String,
    #[serde(default)]
    collector_number: String,
    #[serde(default)]
    rarity: String,
    image_uris: Option<ImageUris>,
    card_faces: Option<Vec<CardFace>>,
    artist: Option<String>,
    prices: Option<ScryfallPrices>,
    type_line: Option<String>,
    oracle_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageUris {
    normal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardFace {
    image_uris: Option<ImageUris>,
}

#[derive(Debug, Deserialize)]
struct ScryfallPrices {
    usd: Option<String>,
    usd_foil: Option<String>,
}

fn parse_price(s: Option<&String>) -> Option<f64> {
    s.and_then(|v| v.trim().parse::<f64>().ok())
}

fn map_cards(list: ScryfallList, cap: usize) -> Vec<CardInfo> {
    list.data.into_iter().take(cap).map(map_card).collect()
}

fn map_card(card: ScryfallCard) -> CardInfo {
    // Double-faced cards carry images per face, not at the top level.
    let image_url = card
        .image_uris
        .as_ref()
        .and_then(|u| u.normal.clone())
        .or_else(|| {
            card.card_faces
                .as_ref()
                .and_then(|faces| faces.first())
                .and_then(|f| f.image_uris.as_ref())
                .and_then(|u| u.normal.clone())
        })
        .unwrap_or_default();

    let prices = card
        .prices
        .as_ref()
        .map(|p| CardPrices {
            usd: parse_price(p.usd.as_ref()),
            usd_foil: parse_price(p.usd_foil.as_ref()),
        })
        .unwrap_or_default();

    CardInfo {
        id: card.id,
        name: card.name,
        game: CardGame::Mtg,
        set: card.set.to_uppercase(),
        set_name: card.set_name,
        number: card.collector_number,
        rarity: card.rarity,
        image_url,
        artist: card.artist,
        prices,
        type_line: card.type_line,
        text: card.oracle_text,
    }
}
