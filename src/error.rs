//! Error types for the collaborators around the game core
//!
//! Timing misses and out-of-turn input are normal game output, not errors.
//! Everything here is logged and swallowed by the session.

use thiserror::Error;

/// Failures talking to a leaderboard backend
#[derive(Error, Debug)]
pub enum ScoreboardError {
    /// No storage backend reachable (private browsing, native build, ...)
    #[error("score storage unavailable")]
    Unavailable,

    /// Backend refused the entry
    #[error("score rejected: {0}")]
    Rejected(String),

    /// Stored leaderboard could not be encoded or decoded
    #[error("score serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures on the online synchronization channel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Room connection dropped
    #[error("sync channel closed")]
    Closed,

    /// Store refused the action (stale turn, room gone, ...)
    #[error("action rejected by room: {0}")]
    Rejected(String),
}

/// Invalid balance data
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("tuning parse failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid tuning value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
