use serde::{Deserialize, Serialize};

/// A saved track in canonical form, as stored by the backend.
///
/// `source_id` is the provider's immutable identifier and the natural key
/// for dedup: the backend upserts on `(owner_id, source_id)`, so re-syncing
/// an unchanged catalog never creates duplicate rows.
///
/// Serde names follow the backend's wire schema (`spotify_id`, `user_id`),
/// the same convention as the tag model's `parent`/`type` renames.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Track {
    #[serde(rename = "spotify_id")]
    pub source_id: String,
    pub name: String,
    /// Denormalized, comma-joined artist names
    pub artists: String,
    pub album: String,
    pub album_id: String,
    pub duration_ms: i64,
    pub explicit: bool,
    /// Provider popularity score, 0-100
    pub popularity: i64,
    pub track_number: i64,
    /// Provider-supplied, loose format — not guaranteed a full ISO date
    pub release_date: String,
    /// ISO 8601, when the user saved the track on the provider; default sort key
    pub added_at: String,
    /// Cover art URL; None when the provider supplies no images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "user_id")]
    pub owner_id: i64,
}

/// Sort key for the backend track listing
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackSort {
    #[default]
    AddedAt,
    Name,
    Popularity,
    ReleaseDate,
}

impl std::fmt::Display for TrackSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSort::AddedAt => write!(f, "added_at"),
            TrackSort::Name => write!(f, "name"),
            TrackSort::Popularity => write!(f, "popularity"),
            TrackSort::ReleaseDate => write!(f, "release_date"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

// ============================================================================
// Provider wire types (saved-tracks envelope)
// ============================================================================

/// One element of the provider's `GET /v1/me/tracks` `items` array
#[derive(Debug, Deserialize, Clone)]
pub struct SavedItem {
    pub added_at: String,
    pub track: RawTrack,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawTrack {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<RawArtist>,
    pub album: RawAlbum,
    #[serde(default)]
    pub duration_ms: i64,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default)]
    pub track_number: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawArtist {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawAlbum {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub release_date: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawImage {
    pub url: String,
}

/// Paged response envelope from the provider's saved-tracks endpoint
#[derive(Debug, Deserialize)]
pub struct SavedTracksPage {
    pub items: Vec<SavedItem>,
}
