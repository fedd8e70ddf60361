//! Queue shuffling
//!
//! Pure random permutation (Fisher-Yates) of the upcoming items.

use crate::state::{Queue, State};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Shuffle the queue uniformly at random
///
/// The permutation is committed with a single whole-queue write.
pub fn shuffle_queue(state: &State) {
    shuffle_queue_with(state, &mut thread_rng());
}

/// Shuffle the queue with a caller-supplied random source
pub fn shuffle_queue_with<R: Rng + ?Sized>(state: &State, rng: &mut R) {
    state.update::<Queue>(|queue| {
        let mut shuffled = queue.clone();
        shuffled.shuffle(rng);
        shuffled
    });
}
