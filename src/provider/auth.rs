// PKCE authorization-code and refresh-token exchange with the provider's
// token endpoint

use reqwest::Client;

use crate::auth::TokenResponse;
use crate::config::Config;
use crate::error::Error;

/// Client for the provider's OAuth endpoints
pub struct ProviderAuth {
    client: Client,
    config: Config,
}

impl ProviderAuth {
    pub fn new(config: &Config) -> Self {
        ProviderAuth {
            client: Client::new(),
            config: config.clone(),
        }
    }

    /// URL to send the user to for login, carrying the S256 challenge of a
    /// verifier the caller stashes until the exchange
    pub fn authorize_url(&self, code_challenge: &str) -> Result<String, Error> {
        let url = reqwest::Url::parse_with_params(
            &self.config.provider_auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("scope", self.config.scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ],
        )
        .map_err(|e| Error::Validation(format!("bad authorize URL: {e}")))?;
        Ok(url.to_string())
    }

    /// Exchange the redirect's authorization code for tokens
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, Error> {
        self.token_request(&[
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", code_verifier),
        ])
        .await
    }

    /// Trade a refresh token for a fresh access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, Error> {
        self.token_request(&[
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, Error> {
        let res = self
            .client
            .post(&self.config.provider_token_url)
            .form(form)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let message = res.text().await.unwrap_or_default();
            if status == 400 || status == 401 {
                return Err(Error::Auth(message));
            }
            return Err(Error::Provider { status, message });
        }

        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::code_challenge;

    #[test]
    fn authorize_url_carries_pkce_params() {
        let config = Config {
            client_id: "client123".to_string(),
            ..Config::default()
        };
        let auth = ProviderAuth::new(&config);
        let challenge = code_challenge("some-verifier");
        let url = auth.authorize_url(&challenge).unwrap();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client123"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("code_challenge={}", challenge)));
    }
}
