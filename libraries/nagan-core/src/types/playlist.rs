/// Playlist domain type
use crate::types::PlaylistId;
use serde::{Deserialize, Serialize};

/// Playlist header as returned by the backend
///
/// Songs are fetched separately and held in the session's
/// `playlist_songs` while the playlist is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Playlist name
    pub name: String,

    /// User tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Sum of song durations in seconds
    #[serde(default)]
    pub total_duration: f64,
}

impl Playlist {
    /// Create an empty playlist header
    pub fn new(id: impl Into<PlaylistId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tags: Vec::new(),
            total_duration: 0.0,
        }
    }
}
