//! Queue management integration tests
//!
//! Real-world queue scenarios: queueing from the library, "play next",
//! sections, playlists and shuffling.

mod common;

use common::{fresh_state, queue_ids, song};
use nagan_core::Playlist;
use nagan_playback::queue::{
    clear_queue, dequeue, enqueue, enqueue_next, enqueue_next_multiple, enqueue_playlist,
    enqueue_playlist_songs, enqueue_section, enqueue_song, enqueue_songs, enqueue_songs_next, peek,
    queue_len,
};
use nagan_playback::state::Queue;
use nagan_playback::{shuffle_queue, QueueItem};
use std::cell::RefCell;
use std::rc::Rc;

// ===== Ordering =====

#[test]
fn test_play_next_goes_before_appended_songs() {
    let state = fresh_state();

    enqueue_songs(&state, vec![song("1"), song("2"), song("3")]);
    enqueue_next(&state, QueueItem::song(song("next")));
    enqueue_song(&state, song("last"));

    assert_eq!(queue_ids(&state), vec!["next", "1", "2", "3", "last"]);
}

#[test]
fn test_later_play_next_wins() {
    let state = fresh_state();

    enqueue_songs_next(&state, vec![song("a"), song("b")]);
    enqueue_songs_next(&state, vec![song("c")]);

    assert_eq!(queue_ids(&state), vec!["c", "a", "b"]);
}

#[test]
fn test_enqueue_next_multiple_mixed_items() {
    let state = fresh_state();
    enqueue_song(&state, song("tail"));

    enqueue_next_multiple(
        &state,
        vec![
            QueueItem::section(song("intro"), 0.0, 15.0),
            QueueItem::song(song("full")),
        ],
    );

    assert_eq!(queue_ids(&state), vec!["intro", "full", "tail"]);
    assert!(matches!(peek(&state), Some(QueueItem::Section(_))));
}

#[test]
fn test_enqueue_next_multiple_empty_is_noop() {
    let state = fresh_state();
    let writes = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&writes);
    state.add_listener::<Queue>(move |_| *counter.borrow_mut() += 1);

    enqueue_next_multiple(&state, Vec::new());
    enqueue_songs(&state, Vec::new());

    assert_eq!(*writes.borrow(), 0);
}

// ===== Draining =====

#[test]
fn test_dequeue_drains_in_order_then_returns_none() {
    let state = fresh_state();
    enqueue_songs(&state, vec![song("1"), song("2")]);

    let first = dequeue(&state).unwrap();
    let second = dequeue(&state).unwrap();

    assert_eq!(first.song_ref().unwrap().id.as_str(), "1");
    assert_eq!(second.song_ref().unwrap().id.as_str(), "2");
    assert_eq!(dequeue(&state), None);
    assert_eq!(queue_len(&state), 0);
}

#[test]
fn test_clear_queue_empties_everything() {
    let state = fresh_state();
    enqueue_songs(&state, vec![song("1"), song("2")]);
    enqueue_section(&state, song("3"), 10.0, 20.0);
    enqueue_playlist(&state, Playlist::new("p", "Mix"));

    clear_queue(&state);

    assert_eq!(queue_len(&state), 0);
    assert_eq!(peek(&state), None);
}

// ===== Playlists =====

#[test]
fn test_deferred_playlist_marker_is_kept_whole() {
    let state = fresh_state();
    enqueue_playlist(&state, Playlist::new("road", "Road Trip"));
    enqueue_song(&state, song("after"));

    assert_eq!(queue_ids(&state), vec!["pl:road", "after"]);
    assert_eq!(peek(&state).unwrap().song_ref(), None);
}

#[test]
fn test_eager_playlist_expansion_appends_songs() {
    let state = fresh_state();
    enqueue_song(&state, song("first"));

    enqueue_playlist_songs(&state, vec![song("p1"), song("p2"), song("p3")]);

    assert_eq!(queue_ids(&state), vec!["first", "p1", "p2", "p3"]);
}

// ===== Listeners =====

#[test]
fn test_listeners_see_whole_queue_per_operation() {
    let state = fresh_state();
    let lengths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lengths);
    state.add_listener::<Queue>(move |queue| sink.borrow_mut().push(queue.len()));

    enqueue(&state, QueueItem::song(song("1")));
    enqueue_songs(&state, vec![song("2"), song("3")]);
    dequeue(&state);
    shuffle_queue(&state);
    clear_queue(&state);

    assert_eq!(*lengths.borrow(), vec![1, 3, 2, 2, 0]);
}

#[test]
fn test_shuffle_keeps_every_item() {
    let state = fresh_state();
    let ids: Vec<String> = (0..30).map(|i| i.to_string()).collect();
    enqueue_songs(&state, ids.iter().map(|id| song(id)).collect());

    shuffle_queue(&state);

    let mut shuffled = queue_ids(&state);
    shuffled.sort();
    let mut expected = ids;
    expected.sort();
    assert_eq!(shuffled, expected);
}
