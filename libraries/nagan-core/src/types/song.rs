/// Song domain type
use crate::types::SongId;
use serde::{Deserialize, Serialize};

/// A playable song as supplied by the backend
///
/// Immutable from the playback core's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Unique song identifier
    pub id: SongId,

    /// Path or URL the transport loads bytes from
    pub url: String,

    /// Tag metadata
    pub metadata: SongMetadata,
}

impl Song {
    /// Create a song from its parts
    pub fn new(id: impl Into<SongId>, url: impl Into<String>, metadata: SongMetadata) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            metadata,
        }
    }

    /// Artists joined for display, or "Unknown Artist"
    pub fn artist_line(&self) -> String {
        if self.metadata.artists.is_empty() {
            "Unknown Artist".to_string()
        } else {
            self.metadata.artists.join(", ")
        }
    }
}

/// Song tag metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongMetadata {
    /// Track title
    pub title: String,

    /// Album name
    pub album: String,

    /// Release year
    pub year: Option<i32>,

    /// Track number
    pub track: Option<i32>,

    /// Cover image (data URL or path)
    pub image: Option<String>,

    /// Duration in seconds
    pub duration: f64,

    /// Credited artists
    pub artists: Vec<String>,

    /// Beats per minute, when analyzed
    pub bpm: Option<f32>,

    /// Genres
    pub genres: Vec<String>,

    /// Free-form user tags
    pub tags: Vec<String>,

    /// Free-form comment
    pub comment: Option<String>,
}

impl SongMetadata {
    /// Minimal metadata: a title and a duration in seconds
    pub fn titled(title: impl Into<String>, duration: f64) -> Self {
        Self {
            title: title.into(),
            duration,
            ..Self::default()
        }
    }
}
