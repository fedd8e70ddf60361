//! Nagan Player - Playback Core
//!
//! Reactive playback state for Nagan Player.
//!
//! This crate provides:
//! - An observable store: per-field listeners, computed fields, two-way
//!   element binding
//! - The session state record every component shares
//! - Queue operations over songs, sections and deferred playlists
//! - Repeat modes (none, song, playlist, section)
//! - Next-track resolution
//! - A listening history ledger and a session tracker that feeds it
//! - Player wiring between state, transport and tracker
//! - Persisted session snapshots
//!
//! # Architecture
//!
//! `nagan-playback` is single-threaded and synchronous. Every state write
//! drains its listeners before returning. Audio output is abstracted
//! behind [`Transport`] and wall-clock time behind [`Clock`]; the crate
//! never decodes audio and never starts timers.
//!
//! # Example: Queue and resolve
//!
//! ```rust
//! use nagan_core::{Song, SongMetadata};
//! use nagan_playback::state::{new_state, CurrentTrack};
//! use nagan_playback::{queue, NextTrackResolver, PlaybackConfig, Resolution, Transport};
//!
//! struct Silent;
//!
//! impl Transport for Silent {
//!     fn load(&self, _song: &Song) {}
//!     fn play(&self) {}
//!     fn pause(&self) {}
//!     fn seek(&self, _seconds: f64) {}
//!     fn position(&self) -> f64 { 0.0 }
//!     fn is_paused(&self) -> bool { true }
//! }
//!
//! let state = new_state(&PlaybackConfig::default());
//! queue::enqueue_song(&state, Song::new("a", "/music/a.mp3", SongMetadata::titled("A", 200.0)));
//!
//! let resolver = NextTrackResolver::default();
//! assert_eq!(resolver.resolve(&state, &Silent), Resolution::PlayedFromQueue);
//! assert_eq!(state.get::<CurrentTrack>().map(|song| song.id.to_string()), Some("a".to_string()));
//!
//! // Nothing left: playback stops
//! assert_eq!(resolver.resolve(&state, &Silent), Resolution::Stopped);
//! ```
//!
//! # Example: Listening history
//!
//! ```rust
//! use nagan_core::SongId;
//! use nagan_playback::state::new_state;
//! use nagan_playback::{HistoryLedger, ManualClock, PlaybackConfig, PlaybackHistoryTracker};
//! use std::rc::Rc;
//!
//! let clock = ManualClock::at_epoch();
//! let ledger = HistoryLedger::new(new_state(&PlaybackConfig::default()), Rc::new(clock.clone()));
//! let mut tracker = PlaybackHistoryTracker::new(ledger.clone(), Rc::new(clock.clone()), 30.0);
//!
//! tracker.set_active_song_id(Some(SongId::new("a")));
//! tracker.on_play();
//! clock.advance_secs(45.0);
//! tracker.on_pause();
//!
//! let entry = ledger.get_entry(&SongId::new("a")).unwrap();
//! assert_eq!(entry.times_played, 1);
//! assert_eq!(entry.duration_played, 45.0);
//! ```

mod store;

mod clock;
mod error;
mod events;
mod history;
mod persist;
mod player;
pub mod queue;
mod repeat;
mod resolver;
mod shuffle;
pub mod state;
mod tracker;
mod transport;
pub mod types;

// Public exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PlaybackError, Result};
pub use events::{Signal, SignalKind};
pub use history::HistoryLedger;
pub use persist::{
    load_persisted, restore_state, save_persisted, try_load_persisted, PersistKey, PersistedState,
    Persistence,
};
pub use player::Player;
pub use repeat::{cycle_repeat_mode, set_repeat_mode};
pub use resolver::{stop_playback, NextTrackResolver, Resolution};
pub use shuffle::{shuffle_queue, shuffle_queue_with};
pub use state::{new_state, Session, State};
pub use store::{AttributeValue, Element, Field, ListenerId, Store, WeakStore};
pub use tracker::PlaybackHistoryTracker;
pub use transport::Transport;
pub use types::{HistoryEntry, PlaybackConfig, QueueItem, RepeatMode, Section};
