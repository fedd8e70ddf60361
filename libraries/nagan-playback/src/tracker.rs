//! Listening session tracker
//!
//! Turns raw transport signals (play, pause, natural end) and "now playing"
//! changes into ledger updates. Duration accrues continuously; the play
//! count is promoted at most once per listening session, either when the
//! session's accumulated time reaches the threshold or when the song plays
//! to its natural end.
//!
//! No timers run: elapsed time is computed from the segment start when a
//! segment is flushed.

use crate::clock::{seconds_between, Clock};
use crate::history::HistoryLedger;
use crate::types::PlaybackConfig;
use chrono::{DateTime, Utc};
use nagan_core::SongId;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Ledger writes produced by one tracker transition
///
/// Applied in order once the tracker is no longer borrowed, so ledger
/// listeners are free to drive the player again.
#[derive(Debug, Default, Clone, PartialEq)]
#[must_use]
pub(crate) struct Credits(Vec<Credit>);

#[derive(Debug, Clone, PartialEq)]
enum Credit {
    Listened { song_id: SongId, seconds: f64 },
    Played { song_id: SongId },
}

impl Credits {
    pub(crate) fn apply(self, ledger: &HistoryLedger) {
        for credit in self.0 {
            match credit {
                Credit::Listened { song_id, seconds } => ledger.update_history(&song_id, seconds),
                Credit::Played { song_id } => ledger.increment_times_played(&song_id),
            }
        }
    }

    fn push(&mut self, credit: Credit) {
        self.0.push(credit);
    }
}

/// Per-session listening tracker
pub struct PlaybackHistoryTracker {
    ledger: HistoryLedger,
    clock: Rc<dyn Clock>,

    /// Accumulated seconds that promote a session to a play
    threshold_secs: f64,

    /// Song being listened to
    active_song_id: Option<SongId>,

    /// Start of the open play segment
    play_started_at: Option<DateTime<Utc>>,

    /// Seconds flushed in the current session
    accumulated_secs: f64,

    /// Whether the current session already counted as a play
    counted_as_played: bool,
}

impl PlaybackHistoryTracker {
    /// Create a tracker promoting plays after `threshold_secs`
    ///
    /// A negative or non-finite threshold falls back to the default.
    pub fn new(ledger: HistoryLedger, clock: Rc<dyn Clock>, threshold_secs: f64) -> Self {
        let threshold_secs = if threshold_secs.is_finite() && threshold_secs >= 0.0 {
            threshold_secs
        } else {
            let fallback = PlaybackConfig::default().played_threshold_secs;
            warn!(threshold_secs, fallback, "Invalid played threshold, using default");
            fallback
        };

        Self {
            ledger,
            clock,
            threshold_secs,
            active_song_id: None,
            play_started_at: None,
            accumulated_secs: 0.0,
            counted_as_played: false,
        }
    }

    /// Create a tracker with the configured threshold
    pub fn from_config(ledger: HistoryLedger, clock: Rc<dyn Clock>, config: &PlaybackConfig) -> Self {
        Self::new(ledger, clock, config.played_threshold_secs)
    }

    /// Switch to another song
    ///
    /// Flushes the open segment against the previous song, then starts a
    /// fresh session. Setting the active song again is a no-op.
    pub fn set_active_song_id(&mut self, song_id: Option<SongId>) {
        self.switch_song(song_id).apply(&self.ledger);
    }

    /// Start a fresh listening session for the same song
    ///
    /// Used when a song is replayed from the start without changing the
    /// active song.
    pub fn begin_new_session(&mut self) {
        self.restart_session().apply(&self.ledger);
    }

    /// Output started; open a segment unless one is already open
    pub fn on_play(&mut self) {
        if self.active_song_id.is_some() && self.play_started_at.is_none() {
            self.play_started_at = Some(self.clock.now());
        }
    }

    /// Output paused
    pub fn on_pause(&mut self) {
        self.flush();
    }

    /// The song reached its natural end; always counts as a play
    pub fn on_natural_ended(&mut self) {
        self.finish_session().apply(&self.ledger);
    }

    /// Close the open segment and credit it to the active song
    pub fn flush(&mut self) {
        self.close_segment().apply(&self.ledger);
    }

    /// Flush for session teardown
    pub fn dispose(&mut self) {
        self.flush();
    }

    /// Song being tracked
    pub fn active_song_id(&self) -> Option<&SongId> {
        self.active_song_id.as_ref()
    }

    /// Seconds flushed in the current session
    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    /// Whether the current session already counted as a play
    pub fn counted_as_played(&self) -> bool {
        self.counted_as_played
    }

    /// Whether a play segment is open
    pub fn is_timing(&self) -> bool {
        self.play_started_at.is_some()
    }

    /// [`Self::set_active_song_id`] without touching the ledger
    pub(crate) fn switch_song(&mut self, song_id: Option<SongId>) -> Credits {
        if song_id == self.active_song_id {
            return Credits::default();
        }

        let credits = self.close_segment();
        trace!(from = ?self.active_song_id, to = ?song_id, "Active song changed");
        self.active_song_id = song_id;
        self.reset_session();
        credits
    }

    /// [`Self::begin_new_session`] without touching the ledger
    pub(crate) fn restart_session(&mut self) -> Credits {
        let credits = self.close_segment();
        self.reset_session();
        credits
    }

    /// [`Self::on_natural_ended`] without touching the ledger
    pub(crate) fn finish_session(&mut self) -> Credits {
        let mut credits = self.close_segment();

        if let Some(song_id) = &self.active_song_id {
            if !self.counted_as_played {
                debug!(song = %song_id, "Natural end counted as play");
                credits.push(Credit::Played {
                    song_id: song_id.clone(),
                });
                self.counted_as_played = true;
            }
        }
        credits
    }

    /// [`Self::flush`] without touching the ledger
    pub(crate) fn close_segment(&mut self) -> Credits {
        let mut credits = Credits::default();
        let Some(song_id) = &self.active_song_id else {
            return credits;
        };
        let Some(started_at) = self.play_started_at.take() else {
            return credits;
        };

        let mut elapsed = seconds_between(started_at, self.clock.now());
        if !elapsed.is_finite() || elapsed < 0.0 {
            warn!(song = %song_id, elapsed, "Clock went backwards, discarding segment");
            elapsed = 0.0;
        }
        if elapsed == 0.0 {
            return credits;
        }

        self.accumulated_secs += elapsed;
        credits.push(Credit::Listened {
            song_id: song_id.clone(),
            seconds: elapsed,
        });
        trace!(song = %song_id, elapsed, total = self.accumulated_secs, "Segment flushed");

        if !self.counted_as_played && self.accumulated_secs >= self.threshold_secs {
            debug!(song = %song_id, threshold = self.threshold_secs, "Listening threshold reached");
            credits.push(Credit::Played {
                song_id: song_id.clone(),
            });
            self.counted_as_played = true;
        }
        credits
    }

    fn reset_session(&mut self) {
        self.play_started_at = None;
        self.accumulated_secs = 0.0;
        self.counted_as_played = false;
    }
}
