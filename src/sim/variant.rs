//! Variant clock
//!
//! Turns raw elapsed time into the value the player sees. Variants either
//! distort the reading (unstable, random) or move the target (moving); the
//! hit test always compares the distorted cycle position with the current
//! target offset.

use std::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{CYCLE_MS, GHOST_VISIBLE_MS, MAX_ROUND_OFFSET_MS};
use crate::cycle_position;

/// Unstable noise components: (amplitude ms, angular frequency rad/s)
const UNSTABLE_WAVES: [(f64, f64); 3] = [(250.0, 1.5), (120.0, 4.2), (60.0, 9.8)];

/// Rule modifier for the clock or the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Classic,
    /// Readout disappears halfway through each cycle
    Ghost,
    /// Readout wobbles with wall-clock driven noise
    Unstable,
    /// Readout is shifted by a per-round offset
    Random,
    /// Target jumps to a new spot every round
    Moving,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Classic,
        Variant::Ghost,
        Variant::Unstable,
        Variant::Random,
        Variant::Moving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Ghost => "ghost",
            Variant::Unstable => "unstable",
            Variant::Random => "random",
            Variant::Moving => "moving",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Variant::ALL.into_iter().find(|v| v.as_str() == s.to_lowercase())
    }

    /// Next variant in rotation order
    pub fn next(self) -> Self {
        let idx = Variant::ALL.iter().position(|v| *v == self).unwrap_or(0);
        Variant::ALL[(idx + 1) % Variant::ALL.len()]
    }

    /// Cycle position after which the UI should hide the readout
    pub fn hides_display_after(&self) -> Option<f64> {
        match self {
            Variant::Ghost => Some(GHOST_VISIBLE_MS),
            _ => None,
        }
    }
}

/// Visual clock value for a variant.
///
/// `wall_secs` is real epoch time in seconds so every observer of the same
/// instant sees the same unstable wobble, independent of pauses.
pub fn compute_visual_time(elapsed_ms: f64, variant: Variant, round_seed: u32, wall_secs: f64) -> f64 {
    match variant {
        Variant::Classic | Variant::Ghost | Variant::Moving => elapsed_ms,
        Variant::Unstable => elapsed_ms + unstable_noise(wall_secs),
        Variant::Random => (elapsed_ms + f64::from(round_seed)).rem_euclid(CYCLE_MS),
    }
}

/// Sum of sinusoids; wrapped so float precision holds for large epoch values
pub fn unstable_noise(wall_secs: f64) -> f64 {
    UNSTABLE_WAVES
        .iter()
        .map(|&(amp, freq)| {
            let period = TAU / freq;
            amp * (freq * wall_secs.rem_euclid(period)).sin()
        })
        .sum()
}

/// Per-round variant data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariantState {
    pub variant: Variant,
    /// Clock shift for `random`, 0..=799, fixed for the round
    pub round_seed: u32,
    /// Where the goal instant sits inside the cycle
    pub target_offset_ms: u32,
}

impl VariantState {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            round_seed: 0,
            target_offset_ms: 0,
        }
    }

    /// Draw fresh round data. Only `random` and `moving` consume randomness.
    pub fn start_round<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.round_seed = 0;
        self.target_offset_ms = 0;
        match self.variant {
            Variant::Random => self.round_seed = rng.random_range(0..=MAX_ROUND_OFFSET_MS),
            Variant::Moving => self.target_offset_ms = rng.random_range(0..=MAX_ROUND_OFFSET_MS),
            _ => {}
        }
    }

    /// Adopt a seed chosen elsewhere (the online room) instead of drawing one
    pub fn apply_seed(&mut self, seed: u32) {
        let seed = seed % (MAX_ROUND_OFFSET_MS + 1);
        self.round_seed = 0;
        self.target_offset_ms = 0;
        match self.variant {
            Variant::Random => self.round_seed = seed,
            Variant::Moving => self.target_offset_ms = seed,
            _ => {}
        }
    }

    /// Switch variant and redraw the round data for it
    pub fn switch_to<R: Rng + ?Sized>(&mut self, variant: Variant, rng: &mut R) {
        self.variant = variant;
        self.start_round(rng);
    }

    pub fn visual_time(&self, elapsed_ms: f64, wall_secs: f64) -> f64 {
        compute_visual_time(elapsed_ms, self.variant, self.round_seed, wall_secs)
    }

    /// Distance from a cycle position to the current target
    pub fn error_at(&self, cycle_pos: f64) -> f64 {
        (cycle_pos - f64::from(self.target_offset_ms)).abs()
    }

    /// Timing error if the player acted right now
    pub fn error_for(&self, elapsed_ms: f64, wall_secs: f64) -> f64 {
        self.error_at(cycle_position(self.visual_time(elapsed_ms, wall_secs)))
    }
}
