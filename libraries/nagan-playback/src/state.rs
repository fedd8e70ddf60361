//! Session state record
//!
//! The single observable record every playback component shares. Each
//! field has a marker type (see [`fields!`](crate::fields)) used to read,
//! write and subscribe to it through [`State`].

use crate::events::{Signal, SignalKind};
use crate::fields;
use crate::store::Store;
use crate::types::{HistoryEntry, PlaybackConfig, QueueItem, RepeatMode, Section};
use nagan_core::{Playlist, PlaylistId, Song};
use tracing::trace;

/// Everything the playback core observes about the current session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Song loaded into the transport
    pub current_track: Option<Song>,

    /// Excerpt of `current_track` being played, if any
    pub current_section: Option<Section>,

    /// Upcoming items, front plays next
    pub queue: Vec<QueueItem>,

    /// What happens when the current item ends
    pub repeat: RepeatMode,

    /// Playlist open in the library view
    pub current_playlist_id: Option<PlaylistId>,

    /// Header of the open playlist (computed from `playlists`)
    pub current_playlist: Option<Playlist>,

    /// Every known playlist header
    pub playlists: Vec<Playlist>,

    /// Songs of the open playlist, in playlist order
    pub playlist_songs: Vec<Song>,

    /// Listening ledger (one entry per song)
    pub history: Vec<HistoryEntry>,

    /// Last signal pushed through the session
    pub last_event: Option<Signal>,

    /// Output volume, 0-100
    pub volume: u8,

    /// Playback rate in percent
    pub playback_rate: u16,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_track: None,
            current_section: None,
            queue: Vec::new(),
            repeat: RepeatMode::Off,
            current_playlist_id: None,
            current_playlist: None,
            playlists: Vec::new(),
            playlist_songs: Vec::new(),
            history: Vec::new(),
            last_event: None,
            volume: 100,
            playback_rate: 100,
        }
    }
}

fields! {
    Session;
    /// Song loaded into the transport
    CurrentTrack("currentTrack") => current_track: Option<Song>;
    /// Excerpt being played
    CurrentSection("currentSection") => current_section: Option<Section>;
    /// Upcoming items
    Queue("queue") => queue: Vec<QueueItem>;
    /// Repeat mode
    Repeat("repeat") => repeat: RepeatMode;
    /// Open playlist id
    CurrentPlaylistId("currentPlaylistId") => current_playlist_id: Option<PlaylistId>;
    /// Open playlist header (computed)
    CurrentPlaylist("currentPlaylist") => current_playlist: Option<Playlist>;
    /// Known playlists
    Playlists("playlists") => playlists: Vec<Playlist>;
    /// Songs of the open playlist
    PlaylistSongs("playlistSongs") => playlist_songs: Vec<Song>;
    /// Listening ledger
    History("history") => history: Vec<HistoryEntry>;
    /// One-shot signal channel
    LastEvent("lastEvent") => last_event: Option<Signal>;
    /// Output volume
    Volume("volume") => volume: u8;
    /// Playback rate
    PlaybackRate("playbackRate") => playback_rate: u16;
}

/// Shared handle to the session record
pub type State = Store<Session>;

/// Build the session state for `config`
///
/// Registers `currentPlaylist` as a derived field over `playlists` and
/// `currentPlaylistId`.
pub fn new_state(config: &PlaybackConfig) -> State {
    let state = Store::new(Session {
        repeat: config.repeat,
        volume: config.volume.min(100),
        playback_rate: config.playback_rate,
        ..Session::default()
    });

    state.compute::<CurrentPlaylist>(|session| {
        let id = session.current_playlist_id.as_ref()?;
        session
            .playlists
            .iter()
            .find(|playlist| &playlist.id == id)
            .cloned()
    });

    state
}

impl Store<Session> {
    /// Push a one-shot signal through `lastEvent`
    ///
    /// Returns the sequence number assigned to it.
    pub fn emit(&self, kind: SignalKind) -> u64 {
        let seq = self.with::<LastEvent, _>(|last| last.as_ref().map_or(0, |signal| signal.seq)) + 1;
        trace!(seq, ?kind, "Signal emitted");
        self.set::<LastEvent>(Some(Signal { seq, kind }));
        seq
    }

    /// Open a playlist: set its songs, then its id
    pub fn open_playlist(&self, id: PlaylistId, songs: Vec<Song>) {
        self.set::<PlaylistSongs>(songs);
        self.set::<CurrentPlaylistId>(Some(id));
    }
}
