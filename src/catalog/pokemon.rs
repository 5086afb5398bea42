//! Pokémon TCG via the pokemontcg.io v2 API.
//!
//! `GET /cards?q=name:"<query>*"&pageSize=5&orderBy=-set.releaseDate` is a
//! name-prefix search, newest sets first. Prices are TCGplayer market
//! prices nested per printing variant.

use super::{fetch_json, http_client, CardCatalog};
use crate::card::{CardGame, CardInfo, CardPrices};
use crate::config::ScanConfig;
use crate::error::CatalogError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

pub struct PokemonTcgCatalog {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
    api_key: Option<String>,
}

impl PokemonTcgCatalog {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            client: http_client(config),
            base_url: config.pokemon_base_url.trim_end_matches('/').to_string(),
            page_size: config.pokemon_page_size,
            api_key: config.pokemon_api_key.clone(),
        }
    }
}

/// The `q` parameter: a quoted name prefix match.
fn name_prefix_query(query: &str) -> String {
    format!("name:\"{}*\"", query.replace('"', ""))
}

#[async_trait]
impl CardCatalog for PokemonTcgCatalog {
    fn game(&self) -> CardGame {
        CardGame::Pokemon
    }

    fn name(&self) -> &str {
        "pokemontcg"
    }

    async fn search(&self, query: &str) -> Result<Vec<CardInfo>, CatalogError> {
        let page_size = self.page_size.to_string();
        let q = name_prefix_query(query);
        let mut request = self.client.get(format!("{}/cards", self.base_url)).query(&[
            ("q", q.as_str()),
            ("pageSize", page_size.as_str()),
            ("orderBy", "-set.releaseDate"),
        ]);
        if let Some(ref key) = self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let Some(list) = fetch_json::<PokemonList>(self.name(), request).await? else {
            debug!("pokemontcg: no cards match '{}'", query);
            return Ok(Vec::new());
        };
        Ok(list.data.into_iter().take(self.page_size).map(map_card).collect())
    }
}

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PokemonList {
    #[serde(default)]
    data: Vec<PokemonCard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PokemonCard {
    id: String,
    name: String,
    supertype: Option<String>,
    rarity: Option<String>,
    #[serde(default)]
    number: String,
    artist: Option<String>,
    flavor_text: Option<String>,
    set: Option<PokemonSet>,
    images: Option<PokemonImages>,
    tcgplayer: Option<TcgPlayer>,
}

#[derive(Debug, Deserialize)]
struct PokemonSet {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct PokemonImages {
    small: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TcgPlayer {
    prices: Option<TcgPrices>,
}

#[derive(Debug, Deserialize)]
struct TcgPrices {
    normal: Option<TcgPrice>,
    holofoil: Option<TcgPrice>,
}

#[derive(Debug, Deserialize)]
struct TcgPrice {
    market: Option<f64>,
}

fn map_card(card: PokemonCard) -> CardInfo {
    let prices = card.tcgplayer.as_ref().and_then(|t| t.prices.as_ref());
    let normal = prices.and_then(|p| p.normal.as_ref()).and_then(|p| p.market);
    let holofoil = prices.and_then(|p| p.holofoil.as_ref()).and_then(|p| p.market);

    let image_url = card
        .images
        .as_ref()
        .and_then(|i| i.large.clone().or_else(|| i.small.clone()))
        .unwrap_or_default();

    let (set, set_name) = card
        .set
        .map(|s| (s.id.to_uppercase(), s.name))
        .unwrap_or_default();

    CardInfo {
        id: card.id,
        name: card.name,
        game: CardGame::Pokemon,
        set,
        set_name,
        number: card.number,
        rarity: card.rarity.unwrap_or_else(|| "Unknown".to_string()),
        image_url,
        artist: card.artist,
        prices: CardPrices {
            // Holo-only printings have no "normal" price; show the holo one.
            usd: normal.or(holofoil),
            usd_foil: holofoil,
        },
        type_line: card.supertype,
        text: card.flavor_text,
    }
}
