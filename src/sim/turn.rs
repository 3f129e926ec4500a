//! Turn sequencing
//!
//! Owns whose turn it is and the per-turn countdown. Every turn gets a serial
//! number; timer callbacks carry the serial they were scheduled for so a late
//! tick from a previous turn is recognised and dropped.

use serde::{Deserialize, Serialize};

use super::state::Player;

/// How many players hold turns in a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStyle {
    /// Two players alternate (classic, bot, penalty, online)
    Alternating,
    /// One player keeps the turn; switching only resets the timer
    Single,
}

/// Result of a one-second turn timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTick {
    /// Seconds left after this tick
    Running(u32),
    /// The turn just ran out; reported once per turn
    TimedOut,
    /// Tick belongs to an older turn or the timeout already fired
    Stale,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnSequencer {
    style: TurnStyle,
    limit_secs: u32,
    active: Player,
    turn_time_left_sec: u32,
    round_index: u32,
    turn_serial: u64,
    timed_out: bool,
}

impl TurnSequencer {
    pub fn new(style: TurnStyle, limit_secs: u32) -> Self {
        Self {
            style,
            limit_secs,
            active: Player::P1,
            turn_time_left_sec: limit_secs,
            round_index: 0,
            turn_serial: 0,
            timed_out: false,
        }
    }

    pub fn style(&self) -> TurnStyle {
        self.style
    }

    pub fn active(&self) -> Player {
        self.active
    }

    pub fn turn_time_left_sec(&self) -> u32 {
        self.turn_time_left_sec
    }

    pub fn round_index(&self) -> u32 {
        self.round_index
    }

    pub fn turn_serial(&self) -> u64 {
        self.turn_serial
    }

    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    /// Begin a fresh turn for the current holder. Returns the new serial.
    pub fn start_round(&mut self) -> u64 {
        self.turn_time_left_sec = self.limit_secs;
        self.timed_out = false;
        self.turn_serial += 1;
        self.turn_serial
    }

    /// Hand the turn over (or just restart it in single-holder modes)
    pub fn switch_turn(&mut self) -> u64 {
        if self.style == TurnStyle::Alternating {
            self.active = self.active.other();
        }
        self.round_index += 1;
        self.start_round()
    }

    /// One second passed on the turn scheduled as `serial`
    pub fn decrement_turn_timer(&mut self, serial: u64) -> TurnTick {
        if serial != self.turn_serial || self.timed_out {
            return TurnTick::Stale;
        }
        self.turn_time_left_sec = self.turn_time_left_sec.saturating_sub(1);
        if self.turn_time_left_sec == 0 {
            self.timed_out = true;
            TurnTick::TimedOut
        } else {
            TurnTick::Running(self.turn_time_left_sec)
        }
    }

    /// Adopt turn ownership pushed from an authoritative room
    pub fn force(&mut self, active: Player, time_left_sec: u32) {
        if active != self.active {
            self.active = active;
            self.round_index += 1;
            self.turn_serial += 1;
            self.timed_out = false;
        }
        self.turn_time_left_sec = time_left_sec.min(self.limit_secs);
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.style, self.limit_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_switch_resets_timer() {
        let mut turns = TurnSequencer::new(TurnStyle::Alternating, 10);
        let serial = turns.start_round();
        assert_eq!(turns.decrement_turn_timer(serial), TurnTick::Running(9));
        let next = turns.switch_turn();
        assert_eq!(turns.active(), Player::P2);
        assert_eq!(turns.turn_time_left_sec(), 10);
        assert_eq!(turns.round_index(), 1);
        assert_ne!(serial, next);
    }

    #[test]
    fn test_single_holder_keeps_player() {
        let mut turns = TurnSequencer::new(TurnStyle::Single, 10);
        turns.start_round();
        turns.switch_turn();
        turns.switch_turn();
        assert_eq!(turns.active(), Player::P1);
        assert_eq!(turns.round_index(), 2);
    }

    #[test]
    fn test_timeout_fires_exactly_once() {
        let mut turns = TurnSequencer::new(TurnStyle::Alternating, 2);
        let serial = turns.start_round();
        assert_eq!(turns.decrement_turn_timer(serial), TurnTick::Running(1));
        assert_eq!(turns.decrement_turn_timer(serial), TurnTick::TimedOut);
        // Overlapping callback for the same turn
        assert_eq!(turns.decrement_turn_timer(serial), TurnTick::Stale);
        assert_eq!(turns.turn_time_left_sec(), 0);
    }

    #[test]
    fn test_stale_serial_ignored() {
        let mut turns = TurnSequencer::new(TurnStyle::Alternating, 10);
        let old = turns.start_round();
        turns.switch_turn();
        assert_eq!(turns.decrement_turn_timer(old), TurnTick::Stale);
        assert_eq!(turns.turn_time_left_sec(), 10);
    }

    #[test]
    fn test_force_from_room() {
        let mut turns = TurnSequencer::new(TurnStyle::Alternating, 10);
        let serial = turns.start_round();
        turns.force(Player::P2, 7);
        assert_eq!(turns.active(), Player::P2);
        assert_eq!(turns.turn_time_left_sec(), 7);
        assert_eq!(turns.decrement_turn_timer(serial), TurnTick::Stale);
        turns.force(Player::P2, 99);
        assert_eq!(turns.turn_time_left_sec(), 10);
    }
}
