//! Data-driven game balance
//!
//! Every number a designer might want to nudge lives here. Defaults match the
//! shipped game; a JSON document can override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::consts::{COUNTDOWN_STEPS, TURN_LIMIT_SECS};
use crate::error::TuningError;
use crate::sim::outcome::{PenaltyBuckets, ShotZones};

/// Classic and bot match limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchTuning {
    /// Whole-match elapsed cap
    pub duration_cap_ms: f64,
    /// Time each player may spend on their own turns
    pub player_budget_ms: f64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            duration_cap_ms: 180_000.0,
            player_budget_ms: 60_000.0,
        }
    }
}

/// Survival balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalTuning {
    pub starting_lives: u8,
    pub max_lives: u8,
    /// Hit radius around the target at streak 0
    pub base_window_ms: f64,
    /// Fraction the window loses per streak level
    pub window_shrink: f64,
    pub min_window_ms: f64,
    /// Clock speed added per streak level
    pub speed_step: f64,
    pub max_speed: f64,
    /// Successes per streak level
    pub level_every: u32,
    pub bonus_life_every: u32,
    pub curse_every: u32,
    /// Successful hits a curse lasts
    pub curse_hits: u32,
    pub red_target_chance: f64,
    /// Extra streak for hitting the red target (on top of the hit itself)
    pub red_target_bonus: u32,
    /// Hits this close count as critical and feed the adrenaline meter
    pub critical_ms: f64,
    pub adrenaline_per_critical: u32,
    pub adrenaline_decay_on_hit: u32,
    pub fever_duration_ms: f64,
}

impl Default for SurvivalTuning {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            max_lives: 5,
            base_window_ms: 100.0,
            window_shrink: 0.05,
            min_window_ms: 30.0,
            speed_step: 0.05,
            max_speed: 1.5,
            level_every: 5,
            bonus_life_every: 10,
            curse_every: 15,
            curse_hits: 3,
            red_target_chance: 0.15,
            red_target_bonus: 9,
            critical_ms: 15.0,
            adrenaline_per_critical: 25,
            adrenaline_decay_on_hit: 10,
            fever_duration_ms: 5_000.0,
        }
    }
}

/// Time attack balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAttackTuning {
    pub start_time_ms: f64,
    pub hit_bonus_ms: f64,
    /// Extra time for a hit inside the critical radius
    pub critical_bonus_ms: f64,
    pub critical_ms: f64,
    pub miss_penalty_ms: f64,
    pub base_points: u64,
    pub base_window_ms: f64,
    pub window_shrink: f64,
    pub min_window_ms: f64,
    pub multiplier_every: u32,
    pub max_multiplier: u32,
    pub fever_every: u32,
    pub fever_duration_ms: f64,
    pub boss_chance: f64,
    pub boss_radius_ms: f64,
    pub boss_penalty_ms: f64,
    /// Goals between variant rotations
    pub rotate_every: u32,
}

impl Default for TimeAttackTuning {
    fn default() -> Self {
        Self {
            start_time_ms: 60_000.0,
            hit_bonus_ms: 2_000.0,
            critical_bonus_ms: 1_000.0,
            critical_ms: 15.0,
            miss_penalty_ms: 3_000.0,
            base_points: 100,
            base_window_ms: 120.0,
            window_shrink: 0.03,
            min_window_ms: 35.0,
            multiplier_every: 5,
            max_multiplier: 5,
            fever_every: 10,
            fever_duration_ms: 5_000.0,
            boss_chance: 0.2,
            boss_radius_ms: 30.0,
            boss_penalty_ms: 5_000.0,
            rotate_every: 5,
        }
    }
}

/// Complete balance sheet for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub zones: ShotZones,
    pub penalty: PenaltyBuckets,
    pub turn: TurnTuning,
    pub matches: MatchTuning,
    pub survival: SurvivalTuning,
    pub time_attack: TimeAttackTuning,
}

/// Turn pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnTuning {
    pub limit_secs: u32,
    pub countdown_steps: u8,
}

impl Default for TurnTuning {
    fn default() -> Self {
        Self {
            limit_secs: TURN_LIMIT_SECS,
            countdown_steps: COUNTDOWN_STEPS,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the rules cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let z = &self.zones;
        if !(0.0 < z.goal && z.goal < z.penalty && z.penalty < z.shot && z.shot < z.cross && z.cross < z.free_kick) {
            return Err(TuningError::Invalid {
                field: "zones",
                reason: "thresholds must be positive and strictly increasing",
            });
        }
        let p = &self.penalty;
        if !(0.0 < p.goal && p.goal < p.saved && p.saved < p.post) {
            return Err(TuningError::Invalid {
                field: "penalty",
                reason: "buckets must be positive and strictly increasing",
            });
        }
        if self.turn.limit_secs == 0 {
            return Err(TuningError::Invalid {
                field: "turn.limit_secs",
                reason: "must be at least one second",
            });
        }
        let s = &self.survival;
        if s.starting_lives == 0 || s.starting_lives > s.max_lives {
            return Err(TuningError::Invalid {
                field: "survival.starting_lives",
                reason: "must be between 1 and max_lives",
            });
        }
        if s.level_every == 0 || s.bonus_life_every == 0 || s.curse_every == 0 {
            return Err(TuningError::Invalid {
                field: "survival",
                reason: "milestone periods must be non-zero",
            });
        }
        let t = &self.time_attack;
        if t.multiplier_every == 0 || t.fever_every == 0 || t.rotate_every == 0 || t.max_multiplier == 0 {
            return Err(TuningError::Invalid {
                field: "time_attack",
                reason: "milestone periods and multiplier cap must be non-zero",
            });
        }
        for (field, chance) in [
            ("survival.red_target_chance", s.red_target_chance),
            ("time_attack.boss_chance", t.boss_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(TuningError::Invalid {
                    field,
                    reason: "probability must be within 0..=1",
                });
            }
        }
        Ok(())
    }
}
