//! Game clock
//!
//! Elapsed time is always derived from the time source, never accumulated
//! from frame deltas, so an action reads the exact instant it happened rather
//! than the last rendered tick. Pauses are subtracted as whole wall-clock
//! spans which keeps the reading continuous across any number of cycles.

use serde::{Deserialize, Serialize};

use super::state::GamePhase;

/// Locally driven clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    phase: GamePhase,
    countdown_steps: u8,
    /// Time-source instant that corresponds to elapsed 0
    start_epoch: f64,
    accumulated_pause_ms: f64,
    paused_at: f64,
    /// Last reading; frozen while paused or finished
    elapsed_ms: f64,
}

impl GameClock {
    pub fn new(countdown_steps: u8) -> Self {
        Self {
            phase: GamePhase::Idle,
            countdown_steps,
            start_epoch: 0.0,
            accumulated_pause_ms: 0.0,
            paused_at: 0.0,
            elapsed_ms: 0.0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn accumulated_pause_ms(&self) -> f64 {
        self.accumulated_pause_ms
    }

    /// Leave idle. Returns the phase entered, or `None` if not idle.
    pub fn start(&mut self, now: f64) -> Option<GamePhase> {
        if self.phase != GamePhase::Idle {
            return None;
        }
        if self.countdown_steps == 0 {
            self.begin_playing(now);
        } else {
            self.phase = GamePhase::Countdown(self.countdown_steps);
        }
        Some(self.phase)
    }

    /// Advance the countdown by one step
    pub fn countdown_step(&mut self, now: f64) -> Option<GamePhase> {
        match self.phase {
            GamePhase::Countdown(n) if n > 1 => self.phase = GamePhase::Countdown(n - 1),
            GamePhase::Countdown(_) => self.begin_playing(now),
            _ => return None,
        }
        Some(self.phase)
    }

    /// Anchor the epoch so any elapsed time carried over continues seamlessly
    fn begin_playing(&mut self, now: f64) {
        self.start_epoch = now - self.elapsed_ms;
        self.accumulated_pause_ms = 0.0;
        self.phase = GamePhase::Playing;
    }

    /// Read elapsed time at `now` and remember it
    pub fn tick(&mut self, now: f64) -> f64 {
        if self.phase == GamePhase::Playing {
            let raw = (now - self.start_epoch) - self.accumulated_pause_ms;
            // Never run backwards, even if the time source does
            self.elapsed_ms = raw.max(self.elapsed_ms);
        }
        self.elapsed_ms
    }

    /// Last reading without touching the time source
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn pause(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        self.tick(now);
        self.paused_at = now;
        self.phase = GamePhase::Paused;
        true
    }

    pub fn resume(&mut self, now: f64) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.accumulated_pause_ms += (now - self.paused_at).max(0.0);
        self.phase = GamePhase::Playing;
        true
    }

    /// Freeze the reading for good; only `reset` leaves this state
    pub fn finish(&mut self, now: f64) {
        self.tick(now);
        self.phase = GamePhase::Finished;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.countdown_steps);
    }
}

/// Clock rendered from an authoritative room state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteClock {
    /// Server epoch ms at which the current round's clock read 0
    round_start_time: f64,
    /// Server epoch ms at which the current turn began
    turn_start_time: f64,
    /// `server_now - client_now`
    offset_ms: f64,
    paused: bool,
    frozen_elapsed: f64,
    synced: bool,
}

impl RemoteClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    pub fn set_offset(&mut self, offset_ms: f64) {
        self.offset_ms = offset_ms;
    }

    pub fn turn_start_time(&self) -> f64 {
        self.turn_start_time
    }

    /// Client epoch time mapped onto the server's timeline
    pub fn server_now(&self, epoch_now: f64) -> f64 {
        epoch_now + self.offset_ms
    }

    /// Replace the timing anchors; whatever arrives last wins
    pub fn apply(&mut self, round_start_time: f64, turn_start_time: f64, is_paused: bool, epoch_now: f64) {
        self.round_start_time = round_start_time;
        self.turn_start_time = turn_start_time;
        self.synced = true;
        if is_paused {
            self.frozen_elapsed = self.running_elapsed(epoch_now);
        }
        self.paused = is_paused;
    }

    fn running_elapsed(&self, epoch_now: f64) -> f64 {
        (self.server_now(epoch_now) - self.round_start_time).max(0.0)
    }

    pub fn elapsed_ms(&self, epoch_now: f64) -> f64 {
        if !self.synced {
            0.0
        } else if self.paused {
            self.frozen_elapsed
        } else {
            self.running_elapsed(epoch_now)
        }
    }

    /// Whole seconds left on the current turn by the server's reckoning
    pub fn turn_time_left_secs(&self, limit_secs: u32, epoch_now: f64) -> u32 {
        if !self.synced {
            return limit_secs;
        }
        let now = if self.paused {
            self.round_start_time + self.frozen_elapsed
        } else {
            self.server_now(epoch_now)
        };
        let spent = ((now - self.turn_start_time).max(0.0) / 1000.0).floor() as u32;
        limit_secs.saturating_sub(spent)
    }
}
