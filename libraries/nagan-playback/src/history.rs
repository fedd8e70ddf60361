//! Listening history ledger
//!
//! Per-song totals of seconds listened and completed plays, kept in the
//! session's `history` field. Every mutation replaces the whole vector.

use crate::clock::Clock;
use crate::state::{History, State};
use crate::types::HistoryEntry;
use nagan_core::SongId;
use std::cmp::Reverse;
use std::rc::Rc;
use tracing::{debug, warn};

/// Ledger over the session's `history` field
#[derive(Clone)]
pub struct HistoryLedger {
    state: State,
    clock: Rc<dyn Clock>,
}

impl HistoryLedger {
    /// Create a ledger that stamps entries with `clock`
    pub fn new(state: State, clock: Rc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    /// Entry for a song, if it has ever been played
    pub fn get_entry(&self, song_id: &SongId) -> Option<HistoryEntry> {
        self.state.with::<History, _>(|history| {
            history.iter().find(|entry| &entry.song_id == song_id).cloned()
        })
    }

    /// Add listened seconds to a song, creating its entry if needed
    ///
    /// Negative and non-finite samples count as zero.
    pub fn update_history(&self, song_id: &SongId, seconds: f64) {
        let seconds = sanitize(song_id, seconds);
        let now = self.clock.now();

        self.upsert(song_id, |entry| {
            entry.duration_played += seconds;
            entry.last_played = now;
        });
    }

    /// Record one completed play, creating the entry if needed
    pub fn increment_times_played(&self, song_id: &SongId) {
        let now = self.clock.now();

        self.upsert(song_id, |entry| {
            entry.times_played = entry.times_played.saturating_add(1);
            entry.last_played = now;
        });
        debug!(song = %song_id, "Play counted");
    }

    /// Drop every entry
    pub fn clear_history(&self) {
        self.state.set::<History>(Vec::new());
    }

    /// Entries by descending play count
    ///
    /// Ties keep ledger order.
    pub fn most_played(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let mut entries = self.state.get::<History>();
        entries.sort_by_key(|entry| Reverse(entry.times_played));
        truncate(entries, limit)
    }

    /// Entries by descending last-played time
    pub fn recently_played(&self, limit: Option<usize>) -> Vec<HistoryEntry> {
        let mut entries = self.state.get::<History>();
        entries.sort_by_key(|entry| Reverse(entry.last_played));
        truncate(entries, limit)
    }

    /// Seconds listened across every song
    pub fn total_listening_secs(&self) -> f64 {
        self.state
            .with::<History, _>(|history| history.iter().map(|entry| entry.duration_played).sum())
    }

    fn upsert(&self, song_id: &SongId, apply: impl FnOnce(&mut HistoryEntry)) {
        let now = self.clock.now();

        self.state.update::<History>(|history| {
            let mut next = history.clone();
            match next.iter_mut().find(|entry| &entry.song_id == song_id) {
                Some(entry) => apply(entry),
                None => {
                    let mut entry = HistoryEntry {
                        song_id: song_id.clone(),
                        duration_played: 0.0,
                        times_played: 0,
                        last_played: now,
                    };
                    apply(&mut entry);
                    next.push(entry);
                }
            }
            next
        });
    }
}

fn sanitize(song_id: &SongId, seconds: f64) -> f64 {
    if seconds.is_finite() && seconds >= 0.0 {
        seconds
    } else {
        warn!(song = %song_id, seconds, "Ignoring malformed listening sample");
        0.0
    }
}

fn truncate(mut entries: Vec<HistoryEntry>, limit: Option<usize>) -> Vec<HistoryEntry> {
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}
