// Read access to the provider's saved-tracks collection

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::auth::CredentialProvider;
use crate::config::Config;
use crate::error::Error;
use crate::models::tracks::{SavedItem, SavedTracksPage};
use crate::models::user::ProviderProfile;

/// The provider caps page size at 50 items per request
pub const MAX_PAGE_SIZE: u32 = 50;

/// Paginated source of the user's saved-tracks collection.
///
/// `drain_all` is defined once here: it advances by the number of items
/// actually returned and terminates when a page comes back empty. That is
/// the one end-of-collection contract this crate relies on; a short page
/// alone does not stop the drain.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of saved items starting at `offset`
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<SavedItem>, Error>;

    /// Page size used by `drain_all`
    fn drain_page_size(&self) -> u32 {
        MAX_PAGE_SIZE
    }

    /// Fetch the entire collection, page by page, until an empty page
    async fn drain_all(&self) -> Result<Vec<SavedItem>, Error> {
        let limit = self.drain_page_size().clamp(1, MAX_PAGE_SIZE);
        let mut all = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self.fetch_page(offset, limit).await?;
            if page.is_empty() {
                break;
            }
            offset += page.len() as u32;
            all.extend(page);
        }

        Ok(all)
    }
}

/// HTTP client for the provider's Web API
pub struct CatalogClient {
    client: Client,
    api_url: String,
    drain_page_size: u32,
    credentials: Arc<dyn CredentialProvider>,
}

impl CatalogClient {
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Self {
        CatalogClient {
            client: Client::new(),
            api_url: config.provider_api_url.clone(),
            drain_page_size: config.drain_page_size.clamp(1, MAX_PAGE_SIZE),
            credentials,
        }
    }

    fn bearer(&self) -> Result<String, Error> {
        self.credentials
            .provider_token()
            .ok_or_else(|| Error::Auth("provider access token not found".to_string()))
    }

    /// Fetch the authenticated user's provider profile
    pub async fn profile(&self) -> Result<ProviderProfile, Error> {
        let token = self.bearer()?;
        let url = format!("{}/v1/me", self.api_url);

        let res = self.client.get(&url).bearer_auth(&token).send().await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth("provider rejected access token".to_string()));
        }
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }

        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    /// Check whether the stored provider token is still live.
    ///
    /// `Ok(false)` only on an explicit 401; other failures propagate so a
    /// flaky network is not mistaken for a lost session.
    pub async fn probe_token(&self) -> Result<bool, Error> {
        let Some(token) = self.credentials.provider_token() else {
            return Ok(false);
        };
        let url = format!("{}/v1/me", self.api_url);

        let res = self.client.get(&url).bearer_auth(&token).send().await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }
        Ok(true)
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<SavedItem>, Error> {
        let token = self.bearer()?;
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let url = format!(
            "{}/v1/me/tracks?limit={}&offset={}",
            self.api_url, limit, offset
        );

        let res = self.client.get(&url).bearer_auth(&token).send().await?;

        if res.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Auth("provider rejected access token".to_string()));
        }
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(provider_error(status, &body));
        }

        let page: SavedTracksPage = res
            .json()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(page.items)
    }

    fn drain_page_size(&self) -> u32 {
        self.drain_page_size
    }
}

/// Extract the message from the provider's `{ "error": { "message": ... } }`
/// envelope, falling back to the raw body
fn provider_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.to_string());
    Error::Provider { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn item(id: usize) -> SavedItem {
        serde_json::from_value(json!({
            "added_at": "2024-01-01T00:00:00Z",
            "track": {
                "id": format!("trk{id}"),
                "name": format!("Track {id}"),
                "artists": [{"name": "Someone"}],
                "album": {"id": "alb", "name": "Album", "images": [], "release_date": "2020"}
            }
        }))
        .unwrap()
    }

    /// Pages a fixed set of items like the real endpoint would
    struct FixedCatalog {
        items: Vec<SavedItem>,
        requests: AtomicUsize,
    }

    impl FixedCatalog {
        fn with_total(total: usize) -> Self {
            FixedCatalog {
                items: (0..total).map(item).collect(),
                requests: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Vec<SavedItem>, Error> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let start = (offset as usize).min(self.items.len());
            let end = (start + limit as usize).min(self.items.len());
            Ok(self.items[start..end].to_vec())
        }

        fn drain_page_size(&self) -> u32 {
            50
        }
    }

    #[tokio::test]
    async fn drain_stops_on_empty_page() {
        // 120 items: pages of 50, 50, 20, then the empty terminator
        let catalog = FixedCatalog::with_total(120);
        let all = catalog.drain_all().await.unwrap();

        assert_eq!(all.len(), 120);
        assert_eq!(catalog.requests.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn drain_exact_multiple_needs_terminating_page() {
        // 100 items: two full pages, then one empty page to terminate
        let catalog = FixedCatalog::with_total(100);
        let all = catalog.drain_all().await.unwrap();

        assert_eq!(all.len(), 100);
        assert_eq!(catalog.requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn drain_preserves_order_without_gaps() {
        let catalog = FixedCatalog::with_total(75);
        let all = catalog.drain_all().await.unwrap();

        let ids: Vec<String> = all.iter().map(|i| i.track.id.clone()).collect();
        let expected: Vec<String> = (0..75).map(|i| format!("trk{i}")).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn empty_catalog_drains_to_nothing() {
        let catalog = FixedCatalog::with_total(0);
        let all = catalog.drain_all().await.unwrap();
        assert!(all.is_empty());
        assert_eq!(catalog.requests.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_envelope_message_extracted() {
        let err = provider_error(429, r#"{"error":{"status":429,"message":"rate limited"}}"#);
        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn error_envelope_falls_back_to_raw_body() {
        let err = provider_error(502, "bad gateway");
        match err {
            Error::Provider { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
