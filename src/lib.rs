//! Kick Clock - a reaction-timing football game core
//!
//! Core modules:
//! - `sim`: Game clock, variants, turns, shot resolution and the per-mode rules
//! - `platform`: Browser/native time sources and storage
//! - `highscores`: Per-mode leaderboard and the scoreboard collaborator
//! - `settings`: Player preferences injected into a session
//! - `tuning`: Data-driven game balance

pub mod error;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ScoreboardError, SyncError, TuningError};
pub use highscores::{HighScores, LocalScoreboard, Scoreboard};
pub use settings::{BotDifficulty, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Length of one loop of the visual clock
    pub const CYCLE_MS: f64 = 1000.0;

    /// Seconds a player has to act before the turn times out
    pub const TURN_LIMIT_SECS: u32 = 10;

    /// Countdown steps shown before play starts (3, 2, 1)
    pub const COUNTDOWN_STEPS: u8 = 3;
    pub const COUNTDOWN_STEP_MS: f64 = 1000.0;

    /// Suggested redraw cadence for drivers without a frame callback
    pub const TICK_MS: f64 = 10.0;

    /// Shot zone upper bounds (ms of timing error)
    pub mod shot_zones {
        /// `[0, GOAL)` is a sure goal
        pub const GOAL: f64 = 10.0;
        /// `[GOAL, PENALTY)` is the penalty zone
        pub const PENALTY: f64 = 110.0;
        /// `[PENALTY, SHOT]` is a shot on goal
        pub const SHOT: f64 = 310.0;
        /// `(SHOT, CROSS]` is a cross into the box
        pub const CROSS: f64 = 510.0;
        /// `(CROSS, FREE_KICK]` is a free kick; anything later is offside
        pub const FREE_KICK: f64 = 710.0;
    }

    /// Highest random offset drawn for the `random` and `moving` variants
    pub const MAX_ROUND_OFFSET_MS: u32 = 799;

    /// Ghost variant hides the readout after this long into each cycle
    pub const GHOST_VISIBLE_MS: f64 = 500.0;
}

/// Wrap a clock value onto the 1000ms cycle, always in `[0, CYCLE_MS)`
#[inline]
pub fn cycle_position(visual_ms: f64) -> f64 {
    visual_ms.rem_euclid(consts::CYCLE_MS)
}

/// The "last digits" a player sees, as whole milliseconds within the cycle
#[inline]
pub fn displayed_ms(visual_ms: f64) -> u32 {
    (cycle_position(visual_ms).floor() as u32).min(consts::CYCLE_MS as u32 - 1)
}
