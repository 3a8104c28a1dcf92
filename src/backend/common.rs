// Shared request plumbing for backend operations

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::CredentialProvider;
use crate::config::Config;
use crate::error::Error;

/// Backend client carrying the bearer token and the `user-id` header the
/// per-user endpoints expect
pub struct BackendClient {
    client: Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl BackendClient {
    pub fn new(config: &Config, credentials: Arc<dyn CredentialProvider>) -> Self {
        BackendClient {
            client: Client::new(),
            base_url: config.backend_url.clone(),
            credentials,
        }
    }

    fn bearer(&self) -> Result<String, Error> {
        self.credentials
            .app_token()
            .ok_or_else(|| Error::Auth("app access token not found".to_string()))
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        user_id: Option<i64>,
    ) -> Result<RequestBuilder, Error> {
        let token = self.bearer()?;
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        if let Some(uid) = user_id {
            builder = builder.header("user-id", uid.to_string());
        }
        Ok(builder)
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user_id: Option<i64>,
    ) -> Result<T, Error> {
        let res = self
            .request(reqwest::Method::GET, path, user_id)?
            .send()
            .await?;
        let res = check(res).await?;
        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        user_id: Option<i64>,
        body: &B,
    ) -> Result<T, Error> {
        let res = self
            .request(reqwest::Method::POST, path, user_id)?
            .json(body)
            .send()
            .await?;
        let res = check(res).await?;
        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    /// POST without the bearer header, for the login endpoint that exists
    /// to mint the token in the first place
    pub async fn post_json_public<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        let res = check(res).await?;
        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }

    pub async fn delete_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user_id: Option<i64>,
    ) -> Result<T, Error> {
        let res = self
            .request(reqwest::Method::DELETE, path, user_id)?
            .send()
            .await?;
        let res = check(res).await?;
        res.json().await.map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Map a non-2xx backend response onto the error taxonomy. Everything
/// except 401 is a plain `Backend` error here; only the tag-delete path
/// reinterprets its 403/409 as `Conflict`, since that is where the backend
/// enforces the locked/children invariants.
async fn check(res: Response) -> Result<Response, Error> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let code = status.as_u16();
    let body = res.text().await.unwrap_or_default();
    let message = extract_message(&body);

    match status {
        StatusCode::UNAUTHORIZED => Err(Error::Auth(message)),
        _ => Err(Error::Backend {
            status: code,
            message,
        }),
    }
}

/// The backend's error envelope is `{"detail": ...}` (string or object) or
/// `{"error": ...}`; fall back to the raw body
fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };
    for key in ["detail", "error"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_extracted() {
        assert_eq!(extract_message(r#"{"detail":"Tag not found"}"#), "Tag not found");
    }

    #[test]
    fn detail_object_kept_whole() {
        let msg = extract_message(
            r#"{"detail":{"error":"One or more tags are locked and cannot be deleted","locked_ids":[1]}}"#,
        );
        assert!(msg.contains("locked"));
        assert!(msg.contains("locked_ids"));
    }

    #[test]
    fn non_json_body_passes_through() {
        assert_eq!(extract_message("Internal Server Error"), "Internal Server Error");
    }
}
