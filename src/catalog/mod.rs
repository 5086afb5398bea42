//! Card catalogs: the external databases a name query is sent to.
//!
//! Each catalog is authoritative for one game and maps its own JSON into the
//! canonical [`CardInfo`]. Catalogs report failures as [`CatalogError`]; it is
//! the aggregator's job ([`crate::pipeline::search`]) to apply the timeout,
//! the cache, and the "failure means empty" policy.

pub mod pokemon;
pub mod scryfall;

pub use pokemon::PokemonTcgCatalog;
pub use scryfall::ScryfallCatalog;

use crate::card::{CardGame, CardInfo};
use crate::config::ScanConfig;
use crate::error::CatalogError;
use async_trait::async_trait;
use reqwest::StatusCode;

/// A searchable card catalog.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// The game this catalog covers. Also the cache key prefix.
    fn game(&self) -> CardGame;

    /// Name for logs and errors.
    fn name(&self) -> &str;

    /// Search by (already normalised) card name.
    ///
    /// "No match" is `Ok(vec![])`, not an error.
    async fn search(&self, query: &str) -> Result<Vec<CardInfo>, CatalogError>;
}

/// Shared HTTP client for catalogs and rate sources.
pub(crate) fn http_client(config: &ScanConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(config.user_agent.clone())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Send a prepared request and decode the JSON body.
///
/// Returns `Ok(None)` for 404, which both catalogs use for "no cards".
pub(crate) async fn fetch_json<T: serde::de::DeserializeOwned>(
    catalog: &str,
    request: reqwest::RequestBuilder,
) -> Result<Option<T>, CatalogError> {
    let response = request.send().await.map_err(|e| CatalogError::Transport {
        catalog: catalog.to_string(),
        detail: e.to_string(),
    })?;

    if !has_results(catalog, response.status())? {
        return Ok(None);
    }

    response
        .json::<T>()
        .await
        .map(Some)
        .map_err(|e| CatalogError::Decode {
            catalog: catalog.to_string(),
            detail: e.to_string(),
        })
}

/// Map a catalog response status: `Ok(true)` means decode the body,
/// `Ok(false)` is a 404 "no cards", anything else non-2xx is an error.
fn has_results(catalog: &str, status: StatusCode) -> Result<bool, CatalogError> {
    if status == StatusCode::NOT_FOUND {
        return Ok(false);
    }
    if !status.is_success() {
        return Err(CatalogError::Http {
            catalog: catalog.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_decodes_body() {
        assert!(has_results("scryfall", StatusCode::OK).unwrap());
    }

    #[test]
    fn not_found_is_empty_not_error() {
        assert!(!has_results("scryfall", StatusCode::NOT_FOUND).unwrap());
    }

    #[test]
    fn other_statuses_are_http_errors() {
        for code in [
            StatusCode::BAD_REQUEST,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            match has_results("pokemontcg", code) {
                Err(CatalogError::Http { catalog, status }) => {
                    assert_eq!(catalog, "pokemontcg");
                    assert_eq!(status, code.as_u16());
                }
                other => panic!("{code}: expected Http error, got {other:?}"),
            }
        }
    }
}
