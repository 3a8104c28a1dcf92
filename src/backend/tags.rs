// Backend tag endpoints: hierarchy snapshot, create, delete

use super::common::BackendClient;
use crate::error::Error;
use crate::models::tags::{Tag, TagDeleteReport, TagIn};

/// Fetch the user's entire tag tree in one snapshot, rooted at the
/// synthetic root
pub async fn fetch_hierarchy(client: &BackendClient, user_id: i64) -> Result<Tag, Error> {
    client.get_json("/tag/tags_hierarchy", Some(user_id)).await
}

/// Create one tag under an existing parent
pub async fn create_tag(
    client: &BackendClient,
    user_id: i64,
    tag: &TagIn,
) -> Result<Tag, Error> {
    client.post_json("/tag/tags", Some(user_id), tag).await
}

/// Delete a tag. The backend owns the cascade policy; a locked subtree comes
/// back as `Error::Conflict`, a successful delete reports every removed id.
pub async fn delete_tag(
    client: &BackendClient,
    user_id: i64,
    tag_id: i64,
) -> Result<TagDeleteReport, Error> {
    let path = format!("/tag/tags/{}", tag_id);
    client
        .delete_json(&path, Some(user_id))
        .await
        .map_err(as_delete_conflict)
}

/// On this endpoint a 403/409 is the backend enforcing its deletion
/// invariants (locked or non-empty subtree), so it surfaces as `Conflict`
/// rather than a generic backend failure. Other endpoints keep their
/// 403s as `Backend` errors.
fn as_delete_conflict(err: Error) -> Error {
    match err {
        Error::Backend { status, message } if status == 403 || status == 409 => {
            Error::Conflict { status, message }
        }
        other => other,
    }
}
