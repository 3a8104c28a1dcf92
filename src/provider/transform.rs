// Normalization from the provider's nested saved-item shape into the
// canonical track record the backend stores

use crate::models::tracks::{SavedItem, Track};

/// Map one saved item to the canonical `Track`.
///
/// Fields the backend schema requires but the provider may omit get explicit
/// empty defaults (serde already zero-fills the numeric ones); cover art is
/// `None` rather than an empty URL when the album carries no images.
pub fn normalize(item: &SavedItem, owner_id: i64) -> Track {
    let track = &item.track;
    let artists = track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Track {
        source_id: track.id.clone(),
        name: track.name.clone(),
        artists,
        album: track.album.name.clone(),
        album_id: track.album.id.clone(),
        duration_ms: track.duration_ms,
        explicit: track.explicit,
        popularity: track.popularity,
        track_number: track.track_number,
        release_date: track.album.release_date.clone(),
        added_at: item.added_at.clone(),
        image: track.album.images.first().map(|img| img.url.clone()),
        owner_id,
    }
}

/// Normalize a whole drained batch for the bulk sync request
pub fn normalize_all(items: &[SavedItem], owner_id: i64) -> Vec<Track> {
    items.iter().map(|item| normalize(item, owner_id)).collect()
}
