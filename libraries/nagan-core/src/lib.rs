//! Nagan Player Core
//!
//! Domain types used by every Nagan component.
//!
//! Songs and playlists are produced by the backend (file scanning, tag
//! reading, SQL queries) and handed to the playback core as immutable
//! values. Nothing in this crate performs I/O.
//!
//! # Example
//!
//! ```rust
//! use nagan_core::{Playlist, Song, SongMetadata};
//!
//! let song = Song::new("song-1", "/music/one.mp3", SongMetadata::titled("One", 215.0));
//! let playlist = Playlist::new("pl-1", "Morning");
//!
//! assert_eq!(song.id.as_str(), "song-1");
//! assert_eq!(playlist.name, "Morning");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod types;

pub use types::{Playlist, PlaylistId, Song, SongId, SongMetadata};
