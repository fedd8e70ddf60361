//! Next-track resolution
//!
//! Decides what plays when the current item ends or the user skips.
//! Rules are evaluated in order on every call, first match wins:
//!
//! 1. repeat `section` with a current section: replay the section in place
//! 2. repeat `song` with a current track: replay the song in place
//! 3. queue not empty: play the first playable queued item
//! 4. playlist open: play the song after the current one, or loop the
//!    playlist through the queue when repeat is `playlist`
//! 5. otherwise stop
//!
//! Only rules 1, 2 and 5 touch the transport. Everything else is a state
//! write that the player's `currentTrack` listener turns into a load.

use crate::queue::{dequeue, enqueue_next_multiple, enqueue_playlist_songs, queue_len};
use crate::state::{CurrentPlaylistId, CurrentSection, CurrentTrack, PlaylistSongs, Repeat, State};
use crate::transport::Transport;
use crate::types::{PlaybackConfig, QueueItem, RepeatMode};
use nagan_core::Playlist;
use tracing::{debug, info, warn};

/// What a resolution did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Seeked back to the current section's start
    ReplayedSection,

    /// Seeked back to the start of the current song
    ReplayedSong,

    /// Took the next item from the queue
    PlayedFromQueue,

    /// Took the next song of the open playlist
    PlayedFromPlaylist,

    /// Re-queued the open playlist and started it over
    RestartedPlaylist,

    /// Nothing left to play; playback stopped
    Stopped,
}

/// Next-track decision procedure
#[derive(Debug, Clone, Copy)]
pub struct NextTrackResolver {
    /// Queue items one resolution may take, expansions included
    max_steps: usize,
}

impl Default for NextTrackResolver {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

impl NextTrackResolver {
    /// Create a resolver taking at most `max_steps` queue items per call
    pub fn new(max_steps: usize) -> Self {
        Self {
            max_steps: max_steps.max(1),
        }
    }

    /// Create a resolver from configuration
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self::new(config.max_resolve_steps)
    }

    /// Decide and apply what plays next
    pub fn resolve(&self, state: &State, transport: &dyn Transport) -> Resolution {
        let repeat = state.get::<Repeat>();

        if repeat == RepeatMode::Section {
            if let Some(start) = state.with::<CurrentSection, _>(|s| s.as_ref().map(|s| s.start_time)) {
                debug!(start, "Replaying section");
                transport.seek(start);
                transport.play();
                return Resolution::ReplayedSection;
            }
        }

        if repeat == RepeatMode::Song && state.with::<CurrentTrack, _>(Option::is_some) {
            debug!("Replaying song");
            transport.restart();
            return Resolution::ReplayedSong;
        }

        if self.play_from_queue(state) {
            return Resolution::PlayedFromQueue;
        }

        if let Some(resolution) = self.play_from_playlist(state, repeat) {
            return resolution;
        }

        stop_playback(state, transport);
        Resolution::Stopped
    }

    /// Drain the queue until something playable is found
    ///
    /// Returns `false` once the queue is exhausted, or the step limit is
    /// reached, without playing anything. Items past the limit stay queued.
    fn play_from_queue(&self, state: &State) -> bool {
        for _ in 0..self.max_steps {
            let Some(item) = dequeue(state) else {
                return false;
            };

            match item {
                QueueItem::Song { song } => {
                    debug!(song = %song.id, "Playing from queue");
                    state.set::<CurrentSection>(None);
                    state.set::<CurrentTrack>(Some(song));
                    return true;
                }
                QueueItem::Section(section) => {
                    if !section.is_playable() {
                        warn!(
                            song = %section.song.id,
                            start = section.start_time,
                            end = section.end_time,
                            "Dropping unplayable section"
                        );
                        continue;
                    }
                    debug!(song = %section.song.id, start = section.start_time, "Playing section from queue");
                    let song = section.song.clone();
                    state.set::<CurrentSection>(Some(section));
                    state.set::<CurrentTrack>(Some(song));
                    return true;
                }
                QueueItem::Playlist { playlist } => expand_marker(state, &playlist),
            }
        }

        warn!(
            limit = self.max_steps,
            remaining = queue_len(state),
            "Resolve step limit reached, leaving the rest of the queue"
        );
        false
    }

    /// Advance within the open playlist
    fn play_from_playlist(&self, state: &State, repeat: RepeatMode) -> Option<Resolution> {
        if state.with::<CurrentPlaylistId, _>(Option::is_none) {
            return None;
        }
        let songs = state.get::<PlaylistSongs>();
        if songs.is_empty() {
            return None;
        }

        let next = state.with::<CurrentTrack, _>(|track| {
            track
                .as_ref()
                .and_then(|current| songs.iter().position(|song| song.id == current.id))
                .map_or(0, |index| index + 1)
        });

        if let Some(song) = songs.get(next) {
            debug!(song = %song.id, index = next, "Playing next playlist song");
            state.set::<CurrentSection>(None);
            state.set::<CurrentTrack>(Some(song.clone()));
            return Some(Resolution::PlayedFromPlaylist);
        }

        if repeat == RepeatMode::Playlist {
            info!(count = songs.len(), "Restarting playlist");
            enqueue_playlist_songs(state, songs);
            if self.play_from_queue(state) {
                return Some(Resolution::RestartedPlaylist);
            }
        }

        None
    }
}

/// Replace a deferred playlist marker with the open playlist's songs
///
/// Only the open playlist's songs are known here; a marker for any other
/// playlist is dropped.
fn expand_marker(state: &State, playlist: &Playlist) {
    let is_open = state.with::<CurrentPlaylistId, _>(|id| id.as_ref() == Some(&playlist.id));
    let songs = if is_open { state.get::<PlaylistSongs>() } else { Vec::new() };

    if songs.is_empty() {
        warn!(playlist = %playlist.id, "Cannot expand playlist marker, dropping it");
        return;
    }

    debug!(playlist = %playlist.id, count = songs.len(), "Expanding playlist marker");
    enqueue_next_multiple(state, songs.into_iter().map(QueueItem::song).collect());
}

/// Pause the transport and clear what is playing
pub fn stop_playback(state: &State, transport: &dyn Transport) {
    info!("Nothing left to play, stopping");
    transport.pause();
    state.set::<CurrentSection>(None);
    state.set::<CurrentTrack>(None);
}
