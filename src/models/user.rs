use serde::{Deserialize, Serialize};

/// Backend user record, from `GET /user/current`
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub spotify_id: String,
}

/// Envelope the backend wraps the current user in
#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

/// Response from `POST /user/spotify-login`: the app bearer token every
/// other backend endpoint sends, plus the backend id of the (possibly just
/// created) user row
#[derive(Debug, Deserialize, Clone)]
pub struct AppSession {
    pub app_access_token: String,
    pub user_id: i64,
}

/// Provider profile, from `GET /v1/me`
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}
