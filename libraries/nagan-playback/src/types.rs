//! Core types for playback management

use crate::error::{PlaybackError, Result};
use chrono::{DateTime, Utc};
use nagan_core::{Playlist, Song, SongId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A bounded excerpt of a song
///
/// Transient playback directive: "play only `start_time..end_time` of
/// `song`". Times are seconds from the start of the song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// Song the excerpt belongs to
    pub song: Song,

    /// Excerpt start (seconds)
    pub start_time: f64,

    /// Excerpt end (seconds)
    pub end_time: f64,
}

impl Section {
    /// Create a section
    pub fn new(song: Song, start_time: f64, end_time: f64) -> Self {
        Self {
            song,
            start_time,
            end_time,
        }
    }

    /// Whether the window can actually be played
    ///
    /// Both bounds finite, start not negative, end after start.
    pub fn is_playable(&self) -> bool {
        self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.start_time >= 0.0
            && self.end_time > self.start_time
    }
}

/// One unit of future playback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QueueItem {
    /// A whole song
    Song {
        /// Song to play
        song: Song,
    },

    /// A bounded excerpt of a song
    Section(Section),

    /// Deferred playlist reference, expanded when it reaches the front
    Playlist {
        /// Playlist to expand
        playlist: Playlist,
    },
}

impl QueueItem {
    /// Wrap a whole song
    pub fn song(song: Song) -> Self {
        Self::Song { song }
    }

    /// Wrap an excerpt
    pub fn section(song: Song, start_time: f64, end_time: f64) -> Self {
        Self::Section(Section::new(song, start_time, end_time))
    }

    /// Wrap a deferred playlist reference
    pub fn playlist(playlist: Playlist) -> Self {
        Self::Playlist { playlist }
    }

    /// Song this item plays, if it is not a playlist reference
    pub fn song_ref(&self) -> Option<&Song> {
        match self {
            Self::Song { song } => Some(song),
            Self::Section(section) => Some(&section.song),
            Self::Playlist { .. } => None,
        }
    }
}

/// What happens when the current item ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Advance normally, stop when nothing is left
    #[default]
    #[serde(rename = "none")]
    Off,

    /// Replay the current song
    Song,

    /// Loop the open playlist
    Playlist,

    /// Replay the current section
    Section,
}

impl RepeatMode {
    /// Cycle order
    pub const CYCLE: [RepeatMode; 4] = [Self::Off, Self::Song, Self::Playlist, Self::Section];

    /// Next mode in the cycle `none -> song -> playlist -> section -> none`
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Off => Self::Song,
            Self::Song => Self::Playlist,
            Self::Playlist => Self::Section,
            Self::Section => Self::Off,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "none",
            Self::Song => "song",
            Self::Playlist => "playlist",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RepeatMode {
    type Err = PlaybackError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::Off),
            "song" => Ok(Self::Song),
            "playlist" => Ok(Self::Playlist),
            "section" => Ok(Self::Section),
            other => Err(PlaybackError::InvalidConfig(format!(
                "unknown repeat mode: {other}"
            ))),
        }
    }
}

/// Per-song listening record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Song this entry accumulates for (unique within the ledger)
    pub song_id: SongId,

    /// Total seconds played, never decreases
    pub duration_played: f64,

    /// Completed listens, never decreases
    pub times_played: u32,

    /// Last time the entry changed
    pub last_played: DateTime<Utc>,
}

/// Configuration for the playback core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaybackConfig {
    /// Seconds of listening that promote a session to a play (default: 30)
    pub played_threshold_secs: f64,

    /// Queue items one resolution may take, expansions included (default: 64)
    pub max_resolve_steps: usize,

    /// Initial repeat mode (default: none)
    pub repeat: RepeatMode,

    /// Initial volume, 0-100 (default: 100)
    pub volume: u8,

    /// Initial playback rate in percent (default: 100)
    pub playback_rate: u16,

    /// Where the persisted session snapshot lives (default: none)
    pub persist_path: Option<PathBuf>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            played_threshold_secs: 30.0,
            max_resolve_steps: 64,
            repeat: RepeatMode::Off,
            volume: 100,
            playback_rate: 100,
            persist_path: None,
        }
    }
}

impl PlaybackConfig {
    /// Parse and validate a JSON configuration; missing keys take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !self.played_threshold_secs.is_finite() || self.played_threshold_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "playedThresholdSecs must be a non-negative number, got {}",
                self.played_threshold_secs
            )));
        }
        if self.max_resolve_steps == 0 {
            return Err(PlaybackError::InvalidConfig(
                "maxResolveSteps must be at least 1".to_string(),
            ));
        }
        if self.volume > 100 {
            return Err(PlaybackError::InvalidConfig(format!(
                "volume must be 0-100, got {}",
                self.volume
            )));
        }
        if self.playback_rate == 0 {
            return Err(PlaybackError::InvalidConfig(
                "playbackRate must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nagan_core::SongMetadata;

    fn song(id: &str) -> Song {
        Song::new(id, format!("/music/{id}.mp3"), SongMetadata::titled(id, 180.0))
    }

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.played_threshold_secs, 30.0);
        assert_eq!(config.max_resolve_steps, 64);
        assert_eq!(config.repeat, RepeatMode::Off);
        assert_eq!(config.volume, 100);
        assert!(config.persist_path.is_none());
    }

    #[test]
    fn config_fills_missing_keys() {
        let config = PlaybackConfig::from_json_str(r#"{"playedThresholdSecs": 10, "repeat": "song"}"#)
            .unwrap();
        assert_eq!(config.played_threshold_secs, 10.0);
        assert_eq!(config.repeat, RepeatMode::Song);
        assert_eq!(config.max_resolve_steps, 64);
    }

    #[test]
    fn config_rejects_out_of_range_values() {
        assert!(matches!(
            PlaybackConfig::from_json_str(r#"{"playedThresholdSecs": -1}"#),
            Err(PlaybackError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json_str(r#"{"maxResolveSteps": 0}"#),
            Err(PlaybackError::InvalidConfig(_))
        ));
        assert!(matches!(
            PlaybackConfig::from_json_str("not json"),
            Err(PlaybackError::Serialization(_))
        ));
    }

    #[test]
    fn repeat_mode_strings() {
        for mode in RepeatMode::CYCLE {
            assert_eq!(mode.as_str().parse::<RepeatMode>().unwrap(), mode);
            assert_eq!(
                serde_json::to_string(&mode).unwrap(),
                format!("\"{}\"", mode.as_str())
            );
        }
        assert!("loop".parse::<RepeatMode>().is_err());
    }

    #[test]
    fn queue_item_wire_format() {
        let item = QueueItem::section(song("a"), 10.0, 20.0);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "section");
        assert_eq!(json["startTime"], 10.0);
        assert_eq!(json["song"]["id"], "a");

        let back: QueueItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn section_playability() {
        assert!(Section::new(song("a"), 0.0, 5.0).is_playable());
        assert!(!Section::new(song("a"), 5.0, 5.0).is_playable());
        assert!(!Section::new(song("a"), -1.0, 5.0).is_playable());
        assert!(!Section::new(song("a"), 0.0, f64::NAN).is_playable());
    }
}
