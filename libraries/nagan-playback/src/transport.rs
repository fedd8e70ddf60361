//! Audio transport seam
//!
//! Abstracts the component that actually decodes and outputs audio (an
//! HTML media element, a CPAL stream, a remote renderer). The playback core
//! only issues commands; the transport reports `play`, `pause`, `ended` and
//! time updates back through [`Player`](crate::Player).

use nagan_core::Song;

/// Platform audio transport
///
/// Methods take `&self`: a transport is a handle with its own interior
/// state, so state listeners can drive it while a resolution is running.
pub trait Transport {
    /// Replace the loaded source with `song`'s audio
    ///
    /// Loading may complete asynchronously; superseding it with another
    /// `load` is the only cancellation.
    fn load(&self, song: &Song);

    /// Start or resume output
    fn play(&self);

    /// Pause output
    fn pause(&self);

    /// Move the playhead, in seconds from the start of the song
    fn seek(&self, seconds: f64);

    /// Current playhead, in seconds
    fn position(&self) -> f64;

    /// Whether output is paused (or nothing is loaded)
    fn is_paused(&self) -> bool;

    /// Set output volume, `0.0..=1.0`
    ///
    /// Transports without volume control ignore it.
    fn set_volume(&self, _volume: f64) {}

    /// Set playback speed, `1.0` is normal
    fn set_playback_rate(&self, _rate: f64) {}

    /// Restart the loaded song from the beginning
    ///
    /// Equivalent to `seek(0.0)` followed by `play()`
    fn restart(&self) {
        self.seek(0.0);
        self.play();
    }
}
