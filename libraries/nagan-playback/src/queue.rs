//! Playback queue operations
//!
//! The queue is a FIFO of [`QueueItem`]s held in the session's `queue`
//! field. Every mutation builds a new vector and writes it back whole, so
//! `queue` listeners fire once per operation.
//!
//! ```text
//! enqueue_next(X) -> [X, a, b, c] <- enqueue(Y)
//!                     ^ dequeue()
//! ```

use crate::events::SignalKind;
use crate::state::{Queue, State};
use crate::types::QueueItem;
use nagan_core::{Playlist, Song};
use tracing::debug;

/// Append an item to the back
pub fn enqueue(state: &State, item: QueueItem) {
    state.update::<Queue>(|queue| {
        let mut next = queue.clone();
        next.push(item);
        next
    });
}

/// Put an item at the front, so it plays next
pub fn enqueue_next(state: &State, item: QueueItem) {
    enqueue_next_multiple(state, vec![item]);
}

/// Put items at the front, keeping their relative order
pub fn enqueue_next_multiple(state: &State, items: Vec<QueueItem>) {
    if items.is_empty() {
        return;
    }
    state.update::<Queue>(|queue| {
        let mut next = items;
        next.extend(queue.iter().cloned());
        next
    });
}

/// Remove and return the front item
///
/// Returns `None` without touching the state when the queue is empty.
pub fn dequeue(state: &State) -> Option<QueueItem> {
    let (front, rest) = state.with::<Queue, _>(|queue| {
        let (front, rest) = queue.split_first()?;
        Some((front.clone(), rest.to_vec()))
    })?;

    state.set::<Queue>(rest);
    Some(front)
}

/// Empty the queue
pub fn clear_queue(state: &State) {
    state.set::<Queue>(Vec::new());
}

/// Append a whole song
pub fn enqueue_song(state: &State, song: Song) {
    enqueue(state, QueueItem::song(song));
}

/// Append whole songs in order, in one write
pub fn enqueue_songs(state: &State, songs: Vec<Song>) {
    if songs.is_empty() {
        return;
    }
    state.update::<Queue>(|queue| {
        let mut next = queue.clone();
        next.extend(songs.into_iter().map(QueueItem::song));
        next
    });
}

/// Put whole songs at the front, keeping their order
pub fn enqueue_songs_next(state: &State, songs: Vec<Song>) {
    enqueue_next_multiple(state, songs.into_iter().map(QueueItem::song).collect());
}

/// Append an excerpt of a song
pub fn enqueue_section(state: &State, song: Song, start_time: f64, end_time: f64) {
    enqueue(state, QueueItem::section(song, start_time, end_time));
}

/// Append a deferred playlist reference
///
/// The resolver expands it against the open playlist's songs when it
/// reaches the front. Prefer [`enqueue_playlist_songs`] when the songs are
/// already at hand.
pub fn enqueue_playlist(state: &State, playlist: Playlist) {
    debug!(playlist = %playlist.id, "Deferred playlist enqueued");
    enqueue(state, QueueItem::playlist(playlist));
}

/// Append a playlist's songs, expanded now
pub fn enqueue_playlist_songs(state: &State, songs: Vec<Song>) {
    debug!(count = songs.len(), "Playlist expanded into queue");
    enqueue_songs(state, songs);
}

/// Play `songs` immediately: put them at the front, then ask for the next
/// track
pub fn play_now(state: &State, songs: Vec<Song>) {
    if songs.is_empty() {
        return;
    }
    enqueue_songs_next(state, songs);
    state.emit(SignalKind::NextSong);
}

/// Number of queued items
pub fn queue_len(state: &State) -> usize {
    state.with::<Queue, _>(Vec::len)
}

/// Front item, without removing it
pub fn peek(state: &State) -> Option<QueueItem> {
    state.with::<Queue, _>(|queue| queue.first().cloned())
}
