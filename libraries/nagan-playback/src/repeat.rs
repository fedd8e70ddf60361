//! Repeat mode entry points
//!
//! The only two places that write the session's `repeat` field.

use crate::state::{Repeat, State};
use crate::types::RepeatMode;
use tracing::debug;

/// Set the repeat mode directly
pub fn set_repeat_mode(state: &State, mode: RepeatMode) {
    debug!(%mode, "Repeat mode set");
    state.set::<Repeat>(mode);
}

/// Advance to the next mode in the cycle and return it
pub fn cycle_repeat_mode(state: &State) -> RepeatMode {
    let next = state.get::<Repeat>().next();
    set_repeat_mode(state, next);
    next
}
