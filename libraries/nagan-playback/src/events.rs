//! One-shot signals
//!
//! Semantic events ("advance to the next track", "files were dropped") are
//! pushed through the session's `lastEvent` field so they reach listeners
//! through the same mechanism as data fields. Each emission carries a
//! sequence number, so two identical signals in a row stay distinguishable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A signal written to the `lastEvent` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Monotonically increasing per session, starting at 1
    pub seq: u64,

    /// What happened
    pub kind: SignalKind,
}

/// Signal payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalKind {
    /// Advance to the next track now
    NextSong,

    /// Files were dropped onto the window
    FilesDropped {
        /// Dropped paths
        paths: Vec<PathBuf>,
    },
}
