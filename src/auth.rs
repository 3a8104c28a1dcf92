//! Credential management: the provider abstraction injected into every
//! network-facing component, plus the persisted token store and PKCE helpers.

use std::path::PathBuf;
use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const TOKEN_FILE: &str = "tokens.json";

/// Read access to the two bearer tokens every request-issuing component
/// needs. Injected rather than read from ambient storage so tests can
/// substitute a fake.
pub trait CredentialProvider: Send + Sync {
    /// Bearer token for the private backend
    fn app_token(&self) -> Option<String>;
    /// Bearer token for the streaming provider
    fn provider_token(&self) -> Option<String>;
    /// Local expiry check only; a definitive answer needs the remote probe
    /// on `CatalogClient`
    fn is_provider_token_valid(&self) -> bool {
        self.provider_token().is_some()
    }
}

/// Token response from the provider's token endpoint
#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
struct PersistedTokens {
    app_access_token: Option<String>,
    provider_access_token: Option<String>,
    provider_refresh_token: Option<String>,
    provider_expires_at: Option<DateTime<Utc>>,
    /// PKCE verifier held between the authorization redirect and the
    /// token exchange
    code_verifier: Option<String>,
}

/// File-backed store for both bearer tokens and their expiry metadata.
pub struct TokenStore {
    path: PathBuf,
    inner: Mutex<PersistedTokens>,
}

impl TokenStore {
    /// Open the store at `path`, loading any previously persisted tokens.
    /// A missing file starts empty; a corrupt file is an error.
    pub fn open(path: PathBuf) -> Result<Self, String> {
        let tokens = match std::fs::read_to_string(&path) {
            Ok(body) => serde_json::from_str(&body)
                .map_err(|err| format!("Failed to parse token file: {err}"))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PersistedTokens::default(),
            Err(err) => return Err(format!("Failed to read token file: {err}")),
        };
        Ok(TokenStore {
            path,
            inner: Mutex::new(tokens),
        })
    }

    /// Default location under the platform cache directory
    pub fn default_path() -> Result<PathBuf, String> {
        let base = dirs::cache_dir().ok_or_else(|| "No cache directory available".to_string())?;
        Ok(base.join("waxtag").join(TOKEN_FILE))
    }

    fn persist(&self, tokens: &PersistedTokens) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("Failed to create token dir: {err}"))?;
        }
        let body = serde_json::to_string_pretty(tokens)
            .map_err(|err| format!("Failed to serialize tokens: {err}"))?;
        std::fs::write(&self.path, body).map_err(|err| format!("Failed to write tokens: {err}"))
    }

    pub fn set_app_token(&self, token: &str) -> Result<(), String> {
        let mut inner = self.inner.lock().expect("token store poisoned");
        inner.app_access_token = Some(token.to_string());
        self.persist(&inner)
    }

    /// Store a provider token response, computing the absolute expiry from
    /// `expires_in` at save time
    pub fn save_provider_tokens(&self, response: &TokenResponse) -> Result<(), String> {
        let mut inner = self.inner.lock().expect("token store poisoned");
        inner.provider_access_token = Some(response.access_token.clone());
        if let Some(refresh) = &response.refresh_token {
            inner.provider_refresh_token = Some(refresh.clone());
        }
        inner.provider_expires_at = Some(Utc::now() + Duration::seconds(response.expires_in));
        inner.code_verifier = None;
        self.persist(&inner)
    }

    pub fn provider_refresh_token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("token store poisoned")
            .provider_refresh_token
            .clone()
    }

    /// Stash the PKCE verifier between the redirect and the token exchange
    pub fn set_code_verifier(&self, verifier: &str) -> Result<(), String> {
        let mut inner = self.inner.lock().expect("token store poisoned");
        inner.code_verifier = Some(verifier.to_string());
        self.persist(&inner)
    }

    pub fn take_code_verifier(&self) -> Result<Option<String>, String> {
        let mut inner = self.inner.lock().expect("token store poisoned");
        let verifier = inner.code_verifier.take();
        self.persist(&inner)?;
        Ok(verifier)
    }

    /// Drop everything, e.g. on logout
    pub fn clear(&self) -> Result<(), String> {
        let mut inner = self.inner.lock().expect("token store poisoned");
        *inner = PersistedTokens::default();
        self.persist(&inner)
    }
}

impl CredentialProvider for TokenStore {
    fn app_token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("token store poisoned")
            .app_access_token
            .clone()
    }

    fn provider_token(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("token store poisoned")
            .provider_access_token
            .clone()
    }

    fn is_provider_token_valid(&self) -> bool {
        let inner = self.inner.lock().expect("token store poisoned");
        match (&inner.provider_access_token, &inner.provider_expires_at) {
            (Some(_), Some(expires_at)) => *expires_at > Utc::now(),
            _ => false,
        }
    }
}

// ============================================================================
// PKCE helpers
// ============================================================================

const VERIFIER_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// 64-character random code verifier for the S256 challenge
pub fn generate_code_verifier() -> String {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| VERIFIER_ALPHABET[(*b as usize) % VERIFIER_ALPHABET.len()] as char)
        .collect()
}

/// SHA-256 code challenge, base64-url encoded without padding
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_length_and_alphabet() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 64);
        assert!(verifier.bytes().all(|b| VERIFIER_ALPHABET.contains(&b)));
    }

    #[test]
    fn challenge_matches_s256_vector() {
        // RFC 7636 appendix B test vector
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = TokenStore::open(path.clone()).unwrap();
        store.set_app_token("app-abc").unwrap();
        store
            .save_provider_tokens(&TokenResponse {
                access_token: "prov-xyz".to_string(),
                refresh_token: Some("refresh-1".to_string()),
                expires_in: 3600,
            })
            .unwrap();

        let reopened = TokenStore::open(path).unwrap();
        assert_eq!(reopened.app_token().as_deref(), Some("app-abc"));
        assert_eq!(reopened.provider_token().as_deref(), Some("prov-xyz"));
        assert_eq!(reopened.provider_refresh_token().as_deref(), Some("refresh-1"));
        assert!(reopened.is_provider_token_valid());
    }

    #[test]
    fn login_session_establishes_the_app_token() {
        use crate::models::user::AppSession;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("tokens.json")).unwrap();
        assert_eq!(store.app_token(), None);

        // What the login endpoint hands back after the provider flow
        let session: AppSession =
            serde_json::from_str(r#"{"app_access_token":"jwt-xyz","user_id":7}"#).unwrap();
        store.set_app_token(&session.app_access_token).unwrap();

        let provider: &dyn CredentialProvider = &store;
        assert_eq!(provider.app_token().as_deref(), Some("jwt-xyz"));
    }

    #[test]
    fn expired_token_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("tokens.json")).unwrap();
        store
            .save_provider_tokens(&TokenResponse {
                access_token: "prov".to_string(),
                refresh_token: None,
                expires_in: -60,
            })
            .unwrap();
        assert!(!store.is_provider_token_valid());
    }

    #[test]
    fn verifier_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("tokens.json")).unwrap();
        store.set_code_verifier("some-verifier").unwrap();
        assert_eq!(
            store.take_code_verifier().unwrap().as_deref(),
            Some("some-verifier")
        );
        assert_eq!(store.take_code_verifier().unwrap(), None);
    }
}
