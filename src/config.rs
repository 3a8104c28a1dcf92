use serde::Deserialize;

/// Endpoints and tuning knobs, passed explicitly to every component that
/// issues requests. Defaults match the local development setup.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// Base URL of the private backend
    pub backend_url: String,
    /// Base URL of the streaming provider's Web API
    pub provider_api_url: String,
    /// Provider OAuth endpoints
    pub provider_auth_url: String,
    pub provider_token_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    /// Page size used when draining the provider's saved-tracks collection.
    /// 50 is the provider's documented per-request maximum.
    pub drain_page_size: u32,
    /// Page size for the local track feed
    pub feed_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: "http://localhost:8000".to_string(),
            provider_api_url: "https://api.spotify.com".to_string(),
            provider_auth_url: "https://accounts.spotify.com/authorize".to_string(),
            provider_token_url: "https://accounts.spotify.com/api/token".to_string(),
            client_id: String::new(),
            redirect_uri: "http://localhost:5173/".to_string(),
            scope: "user-read-private user-read-email user-library-read user-library-modify"
                .to_string(),
            drain_page_size: 50,
            feed_page_size: 20,
        }
    }
}
