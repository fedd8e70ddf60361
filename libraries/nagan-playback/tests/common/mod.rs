//! Shared helpers for integration tests
#![allow(dead_code)]

use nagan_core::{Song, SongMetadata};
use nagan_playback::state::{new_state, CurrentTrack, Queue};
use nagan_playback::{PlaybackConfig, QueueItem, State, Transport};
use std::cell::{Cell, RefCell};

/// Transport command, as recorded by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Seek(f64),
}

/// Transport that records every command and tracks paused/position
#[derive(Debug)]
pub struct MockTransport {
    pub calls: RefCell<Vec<Call>>,
    pub paused: Cell<bool>,
    pub position: Cell<f64>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            paused: Cell::new(true),
            position: Cell::new(0.0),
        }
    }
}

impl MockTransport {
    pub fn take_calls(&self) -> Vec<Call> {
        self.calls.take()
    }
}

impl Transport for MockTransport {
    fn load(&self, song: &Song) {
        self.calls.borrow_mut().push(Call::Load(song.id.to_string()));
        self.paused.set(true);
        self.position.set(0.0);
    }

    fn play(&self) {
        self.calls.borrow_mut().push(Call::Play);
        self.paused.set(false);
    }

    fn pause(&self) {
        self.calls.borrow_mut().push(Call::Pause);
        self.paused.set(true);
    }

    fn seek(&self, seconds: f64) {
        self.calls.borrow_mut().push(Call::Seek(seconds));
        self.position.set(seconds);
    }

    fn position(&self) -> f64 {
        self.position.get()
    }

    fn is_paused(&self) -> bool {
        self.paused.get()
    }
}

pub fn song(id: &str) -> Song {
    Song::new(id, format!("/music/{}.mp3", id), SongMetadata::titled(id, 180.0))
}

pub fn fresh_state() -> State {
    new_state(&PlaybackConfig::default())
}

pub fn current_id(state: &State) -> Option<String> {
    state.get::<CurrentTrack>().map(|song| song.id.to_string())
}

/// Queue rendered as song ids (`pl:<id>` for playlist markers)
pub fn queue_ids(state: &State) -> Vec<String> {
    state
        .get::<Queue>()
        .iter()
        .map(|item| match item {
            QueueItem::Song { song } => song.id.to_string(),
            QueueItem::Section(section) => section.song.id.to_string(),
            QueueItem::Playlist { playlist } => format!("pl:{}", playlist.id),
        })
        .collect()
}

/// Install a test subscriber honoring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
