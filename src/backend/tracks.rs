// Backend track endpoints: bulk sync upload and windowed listing

use serde_json::Value;

use super::common::BackendClient;
use crate::error::Error;
use crate::models::tracks::{SortOrder, Track, TrackSort};

/// Push the full normalized batch in one request. The backend upserts by
/// `source_id` per owner, so repeating the call with an unchanged batch
/// leaves the stored set untouched.
pub async fn sync_tracks(
    client: &BackendClient,
    user_id: i64,
    tracks: &[Track],
) -> Result<(), Error> {
    let _: Value = client
        .post_json("/track/sync-tracks", Some(user_id), &tracks)
        .await?;
    Ok(())
}

/// Fetch the half-open window `[start, end)` of the user's synced tracks,
/// ordered by `sort`/`order`
pub async fn fetch_tracks(
    client: &BackendClient,
    user_id: i64,
    start: usize,
    end: usize,
    sort: TrackSort,
    order: SortOrder,
) -> Result<Vec<Track>, Error> {
    let path = format!(
        "/track/tracks?start={}&end={}&sort_by={}&order={}",
        start, end, sort, order
    );
    client.get_json(&path, Some(user_id)).await
}
