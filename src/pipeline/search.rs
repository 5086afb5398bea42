//! Card search aggregation across catalogs.
//!
//! ## Policy
//!
//! * The query is trimmed and cut to its first few words (3 by default).
//! * With a game given, only that catalog is asked. Otherwise every catalog is
//!   asked concurrently and the lists are concatenated in catalog order
//!   (MTG first). There is no cross-catalog ranking.
//! * Each catalog call is cached under `"<game>:<lowercased query>"` and
//!   bounded by the search timeout. A timeout or error empties that catalog's
//!   contribution only; `search` itself never fails.
//! * Only successful responses are cached, so a flaky catalog is retried on
//!   the next search instead of being remembered as empty.

use crate::cache::{MemoryCache, TtlCache};
use crate::card::{CardGame, CardInfo};
use crate::catalog::{CardCatalog, PokemonTcgCatalog, ScryfallCatalog};
use crate::config::ScanConfig;
use crate::error::CatalogError;
use crate::output::SourceResults;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Trim and keep at most `max_tokens` whitespace-separated words.
pub fn normalize_query(query: &str, max_tokens: usize) -> String {
    query
        .split_whitespace()
        .take(max_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cache key for one catalog + query pair.
pub fn cache_key(game: CardGame, query: &str) -> String {
    format!("{}:{}", game.as_str(), query.to_lowercase())
}

/// Fans a query out to catalogs with per-catalog timeout and cache.
pub struct CardSearch {
    catalogs: Vec<Arc<dyn CardCatalog>>,
    cache: Arc<dyn TtlCache<Vec<CardInfo>>>,
    timeout: Duration,
    max_query_tokens: usize,
}

impl CardSearch {
    /// Catalogs are queried, and their results concatenated, in the order given.
    pub fn new(
        catalogs: Vec<Arc<dyn CardCatalog>>,
        cache: Arc<dyn TtlCache<Vec<CardInfo>>>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalogs,
            cache,
            timeout,
            max_query_tokens: 3,
        }
    }

    /// Scryfall + pokemontcg.io with an in-memory cache.
    pub fn from_config(config: &ScanConfig) -> Self {
        let catalogs: Vec<Arc<dyn CardCatalog>> = vec![
            Arc::new(ScryfallCatalog::new(config)),
            Arc::new(PokemonTcgCatalog::new(config)),
        ];
        let cache = Arc::new(MemoryCache::<Vec<CardInfo>>::new(config.search_cache_ttl()));
        Self::new(catalogs, cache, config.search_timeout()).with_max_query_tokens(config.max_query_tokens)
    }

    pub fn with_max_query_tokens(mut self, n: usize) -> Self {
        self.max_query_tokens = n.max(1);
        self
    }

    /// Search and concatenate results from the selected catalogs.
    pub async fn search(&self, query: &str, game: Option<CardGame>) -> Vec<CardInfo> {
        self.search_sources(query, game)
            .await
            .into_iter()
            .flat_map(|r| r.cards)
            .collect()
    }

    /// Search, keeping each catalog's results separate.
    pub async fn search_sources(&self, query: &str, game: Option<CardGame>) -> Vec<SourceResults> {
        let query = normalize_query(query, self.max_query_tokens);
        if query.is_empty() {
            return Vec::new();
        }

        let selected: Vec<&Arc<dyn CardCatalog>> = self
            .catalogs
            .iter()
            .filter(|c| game.is_none_or(|g| c.game() == g))
            .collect();

        let start = Instant::now();
        let results = join_all(selected.into_iter().map(|catalog| {
            let query = query.as_str();
            async move {
                SourceResults {
                    source: catalog.game(),
                    cards: self.search_catalog(catalog.as_ref(), query).await,
                }
            }
        }))
        .await;

        info!(
            "Search '{}': {} candidates from {} catalog(s) in {}ms",
            query,
            results.iter().map(|r| r.cards.len()).sum::<usize>(),
            results.len(),
            start.elapsed().as_millis()
        );
        results
    }

    async fn search_catalog(&self, catalog: &dyn CardCatalog, query: &str) -> Vec<CardInfo> {
        let key = cache_key(catalog.game(), query);
        if let Some(cards) = self.cache.get(&key) {
            debug!("Cache hit: {}", key);
            return cards;
        }

        match tokio::time::timeout(self.timeout, catalog.search(query)).await {
            Ok(Ok(cards)) => {
                debug!("{}: {} cards for '{}'", catalog.name(), cards.len(), query);
                self.cache.set(&key, cards.clone());
                cards
            }
            Ok(Err(e)) => {
                warn!("Catalog search failed, ignoring: {}", e);
                Vec::new()
            }
            Err(_) => {
                let e = CatalogError::Timeout {
                    catalog: catalog.name().to_string(),
                    secs: self.timeout.as_secs(),
                };
                warn!("Catalog search failed, ignoring: {}", e);
                Vec::new()
            }
        }
    }
}
