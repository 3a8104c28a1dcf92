// Backend user endpoints

use serde::Serialize;

use super::common::BackendClient;
use crate::error::Error;
use crate::models::user::{AppSession, User, UserEnvelope};

/// Payload for the login exchange
#[derive(Serialize)]
struct SpotifyLoginPayload<'a> {
    spotify_id: &'a str,
}

/// Trade the provider profile id for an app session.
///
/// The one unauthenticated backend call: it runs after the provider login
/// completes and yields the `app_access_token` every other endpoint sends.
/// The backend creates the user row on first login, so the returned
/// `user_id` is always resolvable.
pub async fn spotify_login(
    client: &BackendClient,
    spotify_id: &str,
) -> Result<AppSession, Error> {
    let payload = SpotifyLoginPayload { spotify_id };
    client
        .post_json_public("/user/spotify-login", &payload)
        .await
}

/// Resolve the currently authenticated backend user
pub async fn current_user(client: &BackendClient) -> Result<User, Error> {
    let envelope: UserEnvelope = client.get_json("/user/current", None).await?;
    Ok(envelope.user)
}
