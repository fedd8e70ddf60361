//! Next-track resolution tests
//!
//! Walks the resolver's decision order: section repeat, song repeat,
//! queue, open playlist, stop.

mod common;

use common::{current_id, fresh_state, init_tracing, queue_ids, song, Call, MockTransport};
use nagan_core::{Playlist, PlaylistId};
use nagan_playback::queue::{enqueue_playlist, enqueue_section, enqueue_song, enqueue_songs};
use nagan_playback::state::{CurrentSection, CurrentTrack, Queue};
use nagan_playback::{set_repeat_mode, NextTrackResolver, RepeatMode, Resolution, State};

fn playlist_ab(state: &State) {
    state.open_playlist(PlaylistId::new("ab"), vec![song("A"), song("B")]);
}

// ===== Repeat =====

#[test]
fn test_repeat_song_replays_without_consuming_queue() {
    init_tracing();
    let state = fresh_state();
    let transport = MockTransport::default();
    state.set::<CurrentTrack>(Some(song("A")));
    enqueue_song(&state, song("queued"));
    set_repeat_mode(&state, RepeatMode::Song);

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::ReplayedSong);
    assert_eq!(current_id(&state).as_deref(), Some("A"));
    assert_eq!(transport.take_calls(), vec![Call::Seek(0.0), Call::Play]);
    assert_eq!(queue_ids(&state), vec!["queued"]);
}

#[test]
fn test_repeat_song_without_track_falls_through() {
    let state = fresh_state();
    let transport = MockTransport::default();
    set_repeat_mode(&state, RepeatMode::Song);
    enqueue_song(&state, song("queued"));

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::PlayedFromQueue);
    assert_eq!(current_id(&state).as_deref(), Some("queued"));
}

#[test]
fn test_repeat_section_replays_section_start() {
    let state = fresh_state();
    let transport = MockTransport::default();
    let resolver = NextTrackResolver::default();
    enqueue_section(&state, song("A"), 42.5, 60.0);
    enqueue_song(&state, song("B"));
    resolver.resolve(&state, &transport);
    transport.take_calls();
    set_repeat_mode(&state, RepeatMode::Section);

    let resolution = resolver.resolve(&state, &transport);

    assert_eq!(resolution, Resolution::ReplayedSection);
    assert_eq!(transport.take_calls(), vec![Call::Seek(42.5), Call::Play]);
    assert_eq!(current_id(&state).as_deref(), Some("A"));
    assert_eq!(queue_ids(&state), vec!["B"]);
}

// ===== Queue =====

#[test]
fn test_section_and_track_are_set_together() {
    let state = fresh_state();
    let transport = MockTransport::default();
    enqueue_section(&state, song("A"), 5.0, 10.0);

    NextTrackResolver::default().resolve(&state, &transport);

    let section = state.get::<CurrentSection>().unwrap();
    assert_eq!(Some(section.song), state.get::<CurrentTrack>());
    assert!(transport.take_calls().is_empty());
}

#[test]
fn test_queue_takes_priority_over_playlist() {
    let state = fresh_state();
    let transport = MockTransport::default();
    playlist_ab(&state);
    state.set::<CurrentTrack>(Some(song("A")));
    enqueue_song(&state, song("Q"));

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::PlayedFromQueue);
    assert_eq!(current_id(&state).as_deref(), Some("Q"));
}

#[test]
fn test_deferred_playlist_expands_open_playlist() {
    let state = fresh_state();
    let transport = MockTransport::default();
    playlist_ab(&state);
    enqueue_playlist(&state, Playlist::new("ab", "A and B"));

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::PlayedFromQueue);
    assert_eq!(current_id(&state).as_deref(), Some("A"));
    assert_eq!(queue_ids(&state), vec!["B"]);
}

// ===== Playlist fallthrough =====

#[test]
fn test_playlist_advances_then_stops() {
    let state = fresh_state();
    let transport = MockTransport::default();
    let resolver = NextTrackResolver::default();
    playlist_ab(&state);
    state.set::<CurrentTrack>(Some(song("A")));

    assert_eq!(resolver.resolve(&state, &transport), Resolution::PlayedFromPlaylist);
    assert_eq!(current_id(&state).as_deref(), Some("B"));

    assert_eq!(resolver.resolve(&state, &transport), Resolution::Stopped);
    assert_eq!(current_id(&state), None);
    assert!(state.get::<CurrentSection>().is_none());
    assert_eq!(transport.take_calls(), vec![Call::Pause]);
}

#[test]
fn test_repeat_playlist_restarts_from_first_song() {
    let state = fresh_state();
    let transport = MockTransport::default();
    let resolver = NextTrackResolver::default();
    playlist_ab(&state);
    set_repeat_mode(&state, RepeatMode::Playlist);
    state.set::<CurrentTrack>(Some(song("A")));

    assert_eq!(resolver.resolve(&state, &transport), Resolution::PlayedFromPlaylist);
    assert_eq!(current_id(&state).as_deref(), Some("B"));

    assert_eq!(resolver.resolve(&state, &transport), Resolution::RestartedPlaylist);
    assert_eq!(current_id(&state).as_deref(), Some("A"));
    assert_eq!(queue_ids(&state), vec!["B"]);

    // The re-queued rest plays before the playlist is consulted again
    assert_eq!(resolver.resolve(&state, &transport), Resolution::PlayedFromQueue);
    assert_eq!(current_id(&state).as_deref(), Some("B"));
}

#[test]
fn test_closed_playlist_is_ignored() {
    let state = fresh_state();
    let transport = MockTransport::default();
    state.set::<nagan_playback::state::PlaylistSongs>(vec![song("A"), song("B")]);
    state.set::<CurrentTrack>(Some(song("A")));

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::Stopped);
}

#[test]
fn test_stop_on_empty_everything() {
    let state = fresh_state();
    let transport = MockTransport::default();

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::Stopped);
    assert!(state.get::<Queue>().is_empty());
}

#[test]
fn test_invalid_items_drain_into_playlist() {
    let state = fresh_state();
    let transport = MockTransport::default();
    playlist_ab(&state);
    state.set::<CurrentTrack>(Some(song("A")));
    enqueue_section(&state, song("X"), 10.0, 10.0);
    enqueue_playlist(&state, Playlist::new("unknown", "Gone"));
    enqueue_songs(&state, Vec::new());

    let resolution = NextTrackResolver::default().resolve(&state, &transport);

    assert_eq!(resolution, Resolution::PlayedFromPlaylist);
    assert_eq!(current_id(&state).as_deref(), Some("B"));
    assert!(state.get::<Queue>().is_empty());
}
