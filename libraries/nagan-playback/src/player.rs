//! Player - session wiring
//!
//! Connects the session state, the audio transport, the history tracker and
//! the next-track resolver:
//!
//! - `currentTrack` writes load and start the new song, and switch the
//!   tracker to it
//! - `currentSection` writes arm end detection and seek the loaded song to
//!   the section start; a time update past the section end counts as a
//!   natural end
//! - a `NextSong` signal on `lastEvent` advances to the next track
//! - `volume` and `playbackRate` writes are forwarded to the transport
//!
//! Transport events come back in through [`Player::on_play`],
//! [`Player::on_pause`], [`Player::on_ended`] and [`Player::on_time_update`].

use crate::clock::Clock;
use crate::events::SignalKind;
use crate::history::HistoryLedger;
use crate::queue;
use crate::resolver::{NextTrackResolver, Resolution};
use crate::state::{CurrentSection, CurrentTrack, LastEvent, PlaybackRate, State, Volume};
use crate::store::ListenerId;
use crate::tracker::PlaybackHistoryTracker;
use crate::transport::Transport;
use crate::types::{PlaybackConfig, Section};
use nagan_core::Song;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// Shared by the player and its state listeners
struct Wiring<T: Transport> {
    state: State,
    transport: Rc<T>,
    ledger: HistoryLedger,
    tracker: RefCell<PlaybackHistoryTracker>,
    resolver: NextTrackResolver,

    /// End of the playing section, while end detection is armed
    section_end: Cell<Option<f64>>,
}

/// Listener handles installed on the state
#[derive(Debug, Clone, Copy)]
struct Subscriptions {
    track: ListenerId,
    section: ListenerId,
    event: ListenerId,
    volume: ListenerId,
    rate: ListenerId,
}

/// Playback session bound to a transport
pub struct Player<T: Transport + 'static> {
    wiring: Rc<Wiring<T>>,
    subscriptions: Option<Subscriptions>,
}

impl<T: Transport + 'static> Player<T> {
    /// Wire `transport` to `state`
    pub fn new(state: State, transport: Rc<T>, clock: Rc<dyn Clock>, config: &PlaybackConfig) -> Self {
        let ledger = HistoryLedger::new(state.clone(), Rc::clone(&clock));
        let tracker = PlaybackHistoryTracker::from_config(ledger.clone(), clock, config);

        let wiring = Rc::new(Wiring {
            state,
            transport,
            ledger,
            tracker: RefCell::new(tracker),
            resolver: NextTrackResolver::from_config(config),
            section_end: Cell::new(None),
        });

        let subscriptions = Some(subscribe(&wiring));
        info!("Player wired");

        Self {
            wiring,
            subscriptions,
        }
    }

    /// Session state
    pub fn state(&self) -> &State {
        &self.wiring.state
    }

    /// Audio transport
    pub fn transport(&self) -> &Rc<T> {
        &self.wiring.transport
    }

    /// Listening history
    pub fn history(&self) -> &HistoryLedger {
        &self.wiring.ledger
    }

    /// Inspect the history tracker
    pub fn with_tracker<R>(&self, inspect: impl FnOnce(&PlaybackHistoryTracker) -> R) -> R {
        inspect(&self.wiring.tracker.borrow())
    }

    /// Transport started output
    pub fn on_play(&self) {
        self.wiring.tracker.borrow_mut().on_play();
    }

    /// Transport paused output
    pub fn on_pause(&self) {
        self.wiring.close_segment();
    }

    /// Transport reached the end of the song
    pub fn on_ended(&self) -> Resolution {
        self.wiring.advance(true)
    }

    /// Transport playhead moved
    ///
    /// Past the end of the playing section this counts as a natural end;
    /// the resolution is returned.
    pub fn on_time_update(&self, position: f64) -> Option<Resolution> {
        self.wiring.on_time_update(position)
    }

    /// User skipped to the next item
    pub fn skip(&self) -> Resolution {
        self.wiring.advance(false)
    }

    /// Play/pause button
    ///
    /// Paused with nothing loaded resolves the next item, which is returned.
    pub fn toggle_play(&self) -> Option<Resolution> {
        let wiring = &self.wiring;
        if !wiring.transport.is_paused() {
            wiring.transport.pause();
            wiring.close_segment();
            return None;
        }

        if wiring.state.with::<CurrentTrack, _>(Option::is_none) {
            return Some(wiring.advance(false));
        }

        wiring.transport.play();
        wiring.tracker.borrow_mut().on_play();
        None
    }

    /// Play `songs` right away, ahead of the queue
    pub fn play_now(&self, songs: Vec<Song>) {
        queue::play_now(&self.wiring.state, songs);
    }

    /// Flush listening time and remove every listener the player installed
    ///
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        let Some(subscriptions) = self.subscriptions.take() else {
            return;
        };

        let state = &self.wiring.state;
        state.remove_listener::<CurrentTrack>(subscriptions.track);
        state.remove_listener::<CurrentSection>(subscriptions.section);
        state.remove_listener::<LastEvent>(subscriptions.event);
        state.remove_listener::<Volume>(subscriptions.volume);
        state.remove_listener::<PlaybackRate>(subscriptions.rate);

        self.wiring.section_end.set(None);
        self.wiring.close_segment();
        info!("Player disposed");
    }
}

impl<T: Transport + 'static> Drop for Player<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn subscribe<T: Transport + 'static>(wiring: &Rc<Wiring<T>>) -> Subscriptions {
    let state = &wiring.state;

    let weak = Rc::downgrade(wiring);
    let track = state.add_listener::<CurrentTrack>(move |song| {
        if let Some(wiring) = weak.upgrade() {
            wiring.on_track_changed(song.as_ref());
        }
    });

    let weak = Rc::downgrade(wiring);
    let section = state.add_listener::<CurrentSection>(move |section| {
        if let Some(wiring) = weak.upgrade() {
            wiring.on_section_changed(section.as_ref());
        }
    });

    let weak: Weak<Wiring<T>> = Rc::downgrade(wiring);
    let event = state.add_listener::<LastEvent>(move |signal| {
        let (Some(wiring), Some(signal)) = (weak.upgrade(), signal.as_ref()) else {
            return;
        };
        if signal.kind == SignalKind::NextSong {
            debug!(seq = signal.seq, "Next song requested");
            wiring.advance(false);
        }
    });

    let weak = Rc::downgrade(wiring);
    let volume = state.add_listener::<Volume>(move |volume| {
        if let Some(wiring) = weak.upgrade() {
            wiring.transport.set_volume(f64::from((*volume).min(100)) / 100.0);
        }
    });

    let weak = Rc::downgrade(wiring);
    let rate = state.add_listener::<PlaybackRate>(move |rate| {
        if let Some(wiring) = weak.upgrade() {
            wiring.transport.set_playback_rate(f64::from(*rate) / 100.0);
        }
    });

    Subscriptions {
        track,
        section,
        event,
        volume,
        rate,
    }
}

impl<T: Transport> Wiring<T> {
    /// Resolve the next item; `natural` credits the current song with a
    /// completed play first
    fn advance(&self, natural: bool) -> Resolution {
        if natural {
            let credits = self.tracker.borrow_mut().finish_session();
            credits.apply(&self.ledger);
        }

        let resolution = self.resolver.resolve(&self.state, &*self.transport);
        debug!(?resolution, natural, "Advanced");

        if matches!(resolution, Resolution::ReplayedSong | Resolution::ReplayedSection) {
            let credits = {
                let mut tracker = self.tracker.borrow_mut();
                let credits = tracker.restart_session();
                tracker.on_play();
                credits
            };
            credits.apply(&self.ledger);
        }

        resolution
    }

    /// Flush the open segment into the ledger
    fn close_segment(&self) {
        let credits = self.tracker.borrow_mut().close_segment();
        credits.apply(&self.ledger);
    }

    fn on_track_changed(&self, song: Option<&Song>) {
        let credits = {
            let mut tracker = self.tracker.borrow_mut();
            let id = song.map(|song| song.id.clone());
            if id.is_some() && tracker.active_song_id() == id.as_ref() {
                tracker.restart_session()
            } else {
                tracker.switch_song(id)
            }
        };
        credits.apply(&self.ledger);

        let Some(song) = song else {
            return;
        };

        // A history listener may already have moved on to another track
        let still_current = self
            .state
            .with::<CurrentTrack, _>(|track| track.as_ref().is_some_and(|track| track.id == song.id));
        if !still_current {
            debug!(song = %song.id, "Track replaced during history update, not loading");
            return;
        }

        info!(song = %song.id, url = %song.url, "Loading song");
        self.transport.load(song);

        let section_start = self.state.with::<CurrentSection, _>(|section| {
            section
                .as_ref()
                .filter(|section| section.song.id == song.id)
                .map(|section| section.start_time)
        });
        if let Some(start) = section_start {
            self.transport.seek(start);
        }

        self.transport.play();
        self.tracker.borrow_mut().on_play();
    }

    fn on_section_changed(&self, section: Option<&Section>) {
        match section {
            Some(section) => {
                debug!(start = section.start_time, end = section.end_time, "Section armed");
                // A new song seeks after it loads; only the loaded song seeks here
                let loaded = self.state.with::<CurrentTrack, _>(|track| {
                    track.as_ref().is_some_and(|track| track.id == section.song.id)
                });
                if loaded {
                    self.transport.seek(section.start_time);
                }
                self.section_end.set(Some(section.end_time));
            }
            None => self.section_end.set(None),
        }
    }

    fn on_time_update(&self, position: f64) -> Option<Resolution> {
        let end = self.section_end.get()?;
        if position < end {
            return None;
        }

        // Disarm so late time updates cannot end the section twice
        self.section_end.set(None);
        debug!(position, end, "Section end reached");
        let resolution = self.advance(true);

        // A section replayed in place never rewrites the field, so re-arm here
        if self.section_end.get().is_none() {
            let end = self
                .state
                .with::<CurrentSection, _>(|section| section.as_ref().map(|section| section.end_time));
            self.section_end.set(end);
        }

        Some(resolution)
    }
}
