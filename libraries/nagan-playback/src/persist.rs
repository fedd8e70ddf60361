//! Persisted session state
//!
//! A JSON snapshot of the session fields worth keeping across restarts:
//! repeat mode, volume, playback rate, listening history and the queue.
//!
//! Loading merges the saved snapshot over defaults key by key, so a file
//! written by an older build (or holding only some keys) still loads, and a
//! key that cannot be read keeps its default without losing the others.
//! Saving is explicit: [`Persistence`] marks the snapshot dirty whenever a
//! watched field is written, and the host flushes it at a convenient point
//! with [`Persistence::save_if_dirty`].

use crate::error::{PlaybackError, Result};
use crate::repeat::set_repeat_mode;
use crate::state::{
    new_state, History as HistoryField, PlaybackRate, Queue as QueueField, Repeat as RepeatField,
    State, Volume,
};
use crate::store::ListenerId;
use crate::types::{HistoryEntry, PlaybackConfig, QueueItem, RepeatMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Persisted subset of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub repeat: RepeatMode,
    pub volume: u8,
    pub playback_rate: u16,
    pub history: Vec<HistoryEntry>,
    pub queue: Vec<QueueItem>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::from_config(&PlaybackConfig::default())
    }
}

impl PersistedState {
    /// Defaults for a fresh session under `config`
    pub fn from_config(config: &PlaybackConfig) -> Self {
        Self {
            repeat: config.repeat,
            volume: config.volume.min(100),
            playback_rate: config.playback_rate,
            history: Vec::new(),
            queue: Vec::new(),
        }
    }

    /// Snapshot the persisted fields of `state`
    pub fn capture(state: &State) -> Self {
        Self {
            repeat: state.get::<RepeatField>(),
            volume: state.get::<Volume>(),
            playback_rate: state.get::<PlaybackRate>(),
            history: state.get::<HistoryField>(),
            queue: state.get::<QueueField>(),
        }
    }

    /// Write the snapshot into `state`, notifying listeners
    pub fn apply(&self, state: &State) {
        set_repeat_mode(state, self.repeat);
        state.set::<Volume>(self.volume.min(100));
        state.set::<PlaybackRate>(self.playback_rate);
        state.set::<HistoryField>(self.history.clone());
        state.set::<QueueField>(self.queue.clone());
    }

    /// Replace the field for `key` with a saved value
    fn merge_key(&mut self, key: PersistKey, value: Value) -> serde_json::Result<()> {
        match key {
            PersistKey::Repeat => self.repeat = serde_json::from_value(value)?,
            PersistKey::Volume => self.volume = serde_json::from_value::<u8>(value)?.min(100),
            PersistKey::PlaybackRate => self.playback_rate = serde_json::from_value(value)?,
            PersistKey::History => self.history = serde_json::from_value(value)?,
            PersistKey::Queue => self.queue = serde_json::from_value(value)?,
        }
        Ok(())
    }
}

/// Session fields that can be persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistKey {
    Repeat,
    Volume,
    PlaybackRate,
    History,
    Queue,
}

impl PersistKey {
    /// Every persisted field
    pub const ALL: [PersistKey; 5] = [
        Self::Repeat,
        Self::Volume,
        Self::PlaybackRate,
        Self::History,
        Self::Queue,
    ];

    /// Key name in the snapshot file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Repeat => "repeat",
            Self::Volume => "volume",
            Self::PlaybackRate => "playbackRate",
            Self::History => "history",
            Self::Queue => "queue",
        }
    }

    /// Key for a snapshot file key name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

/// Read the snapshot at `path` merged over `defaults`
///
/// A missing file yields `defaults`. Keys whose value cannot be read keep
/// their default; unknown keys are ignored.
pub fn try_load_persisted(path: &Path, defaults: PersistedState) -> Result<PersistedState> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No persisted state, using defaults");
            return Ok(defaults);
        }
        Err(e) => return Err(e.into()),
    };

    let saved: Value = serde_json::from_str(&raw)?;
    let Value::Object(saved) = saved else {
        return Err(PlaybackError::InvalidConfig(format!(
            "persisted state at {} is not a JSON object",
            path.display()
        )));
    };

    let mut state = defaults;
    for (name, value) in saved {
        let Some(key) = PersistKey::from_name(&name) else {
            debug!(key = %name, "Ignoring unknown persisted key");
            continue;
        };
        if let Err(e) = state.merge_key(key, value) {
            warn!(path = %path.display(), key = key.as_str(), error = %e, "Unreadable persisted key, keeping default");
        }
    }

    info!(path = %path.display(), "Persisted state loaded");
    Ok(state)
}

/// Read the snapshot at `path` merged over `defaults`, falling back to
/// `defaults` when it cannot be read
pub fn load_persisted(path: &Path, defaults: PersistedState) -> PersistedState {
    match try_load_persisted(path, defaults.clone()) {
        Ok(state) => state,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load persisted state, using defaults");
            defaults
        }
    }
}

/// Write the `keys` of `snapshot` to `path`
pub fn save_persisted(path: &Path, snapshot: &PersistedState, keys: &[PersistKey]) -> Result<()> {
    let mut value = serde_json::to_value(snapshot)?;
    if let Value::Object(fields) = &mut value {
        fields.retain(|name, _| keys.iter().any(|key| key.as_str() == name));
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&value)?)?;

    debug!(path = %path.display(), keys = keys.len(), "Persisted state saved");
    Ok(())
}

/// Build the session for `config`, restoring `persist_path` when set
pub fn restore_state(config: &PlaybackConfig) -> State {
    let state = new_state(config);
    if let Some(path) = &config.persist_path {
        load_persisted(path, PersistedState::from_config(config)).apply(&state);
    }
    state
}

/// Keeps a snapshot file in step with the session
///
/// Watches the chosen fields and marks the snapshot dirty on every write.
/// With no keys chosen nothing is watched and every field is written on
/// [`Persistence::save_now`] or [`Persistence::detach`].
pub struct Persistence {
    state: State,
    path: PathBuf,
    keys: Vec<PersistKey>,
    watched: bool,
    dirty: Rc<Cell<bool>>,
    subscriptions: Vec<(PersistKey, ListenerId)>,
}

impl Persistence {
    /// Start watching `keys` of `state`
    pub fn attach(state: &State, path: impl Into<PathBuf>, keys: &[PersistKey]) -> Self {
        let dirty = Rc::new(Cell::new(false));
        let subscriptions = keys
            .iter()
            .map(|&key| (key, watch(state, key, &dirty)))
            .collect();

        let watched = !keys.is_empty();
        let keys = if watched {
            keys.to_vec()
        } else {
            PersistKey::ALL.to_vec()
        };

        Self {
            state: state.clone(),
            path: path.into(),
            keys,
            watched,
            dirty,
            subscriptions,
        }
    }

    /// Whether a watched field changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Snapshot file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save if a watched field changed; returns whether a save happened
    pub fn save_if_dirty(&self) -> Result<bool> {
        if !self.dirty.get() {
            return Ok(false);
        }
        self.save_now()?;
        Ok(true)
    }

    /// Save unconditionally
    pub fn save_now(&self) -> Result<()> {
        save_persisted(&self.path, &PersistedState::capture(&self.state), &self.keys)?;
        self.dirty.set(false);
        Ok(())
    }

    /// Stop watching and write a final snapshot
    ///
    /// Saves when dirty, or always when no fields were watched.
    pub fn detach(mut self) -> Result<()> {
        for (key, id) in self.subscriptions.drain(..) {
            unwatch(&self.state, key, id);
        }

        if self.dirty.get() || !self.watched {
            self.save_now()?;
        }
        Ok(())
    }
}

impl Drop for Persistence {
    fn drop(&mut self) {
        for (key, id) in self.subscriptions.drain(..) {
            unwatch(&self.state, key, id);
        }
    }
}

fn mark<V: 'static>(dirty: &Rc<Cell<bool>>) -> impl Fn(&V) + 'static {
    let dirty = Rc::clone(dirty);
    move |_| dirty.set(true)
}

fn watch(state: &State, key: PersistKey, dirty: &Rc<Cell<bool>>) -> ListenerId {
    match key {
        PersistKey::Repeat => state.add_listener::<RepeatField>(mark(dirty)),
        PersistKey::Volume => state.add_listener::<Volume>(mark(dirty)),
        PersistKey::PlaybackRate => state.add_listener::<PlaybackRate>(mark(dirty)),
        PersistKey::History => state.add_listener::<HistoryField>(mark(dirty)),
        PersistKey::Queue => state.add_listener::<QueueField>(mark(dirty)),
    }
}

fn unwatch(state: &State, key: PersistKey, id: ListenerId) -> bool {
    match key {
        PersistKey::Repeat => state.remove_listener::<RepeatField>(id),
        PersistKey::Volume => state.remove_listener::<Volume>(id),
        PersistKey::PlaybackRate => state.remove_listener::<PlaybackRate>(id),
        PersistKey::History => state.remove_listener::<HistoryField>(id),
        PersistKey::Queue => state.remove_listener::<QueueField>(id),
    }
}
