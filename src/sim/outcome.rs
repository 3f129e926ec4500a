//! Shot resolution
//!
//! Maps a timing error (absolute ms between where the clock stopped and the
//! target) to a football outcome. The classic resolver rolls fresh dice on
//! every call inside its probabilistic zones, so the same error can score once
//! and miss the next time. Nothing here keeps state between calls.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::shot_zones;

/// Penalty zone: goal / wide / (rest) saved
pub const PENALTY_GOAL_CHANCE: f64 = 0.75;
pub const PENALTY_WIDE_CHANCE: f64 = 0.15;
/// Shot zone: goal / (rest) saved
pub const SHOT_GOAL_CHANCE: f64 = 0.30;
/// Cross zone: the cross must land, then the header must go in
pub const CROSS_LAND_CHANCE: f64 = 0.40;
pub const CROSS_FINISH_CHANCE: f64 = 0.50;
/// Free kick zone: goal / post / (rest) wide
pub const FREE_KICK_GOAL_CHANCE: f64 = 0.20;
pub const FREE_KICK_POST_CHANCE: f64 = 0.60;

/// Discrete result of one action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShotResult {
    Goal,
    /// Keeper stopped it
    Saved,
    /// Missed the frame
    Wide,
    /// Hit the woodwork
    Post,
    /// Cross never reached a teammate
    Cleared,
    Offside,
    /// Player never acted before the turn clock ran out
    TimedOut,
}

impl ShotResult {
    pub fn is_goal(self) -> bool {
        self == ShotResult::Goal
    }

    /// Which effect the presentation layer should play
    pub fn effect(self) -> EffectKind {
        match self {
            ShotResult::Goal => EffectKind::Goal,
            ShotResult::Post => EffectKind::Post,
            ShotResult::Saved => EffectKind::Save,
            ShotResult::Wide | ShotResult::Cleared | ShotResult::Offside | ShotResult::TimedOut => {
                EffectKind::Miss
            }
        }
    }
}

/// Sound/visual cue for a resolved action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Goal,
    Post,
    Miss,
    Save,
}

/// Which bracket of timing error an action fell into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotZone {
    Goal,
    Penalty,
    Shot,
    Cross,
    FreeKick,
    Offside,
    /// Judged against a mode's hit window instead of the zone table
    Window,
    /// Penalty shootout bucket
    Spot,
    Timeout,
}

/// Result of one action: never stored, recomputed for every action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShotOutcome {
    pub result: ShotResult,
    pub zone: ShotZone,
    /// Localization key for the commentary line
    pub message: &'static str,
    pub is_goal: bool,
}

impl ShotOutcome {
    fn new(zone: ShotZone, result: ShotResult, message: &'static str) -> Self {
        Self {
            result,
            zone,
            message,
            is_goal: result.is_goal(),
        }
    }

    /// Synthesized outcome for a turn that ran out; always a failure
    pub fn timed_out() -> Self {
        Self::new(ShotZone::Timeout, ShotResult::TimedOut, "shot.timeout")
    }

    /// Clock stopped on a boss zone: the keeper smothers it
    pub fn boss_hit() -> Self {
        Self::new(ShotZone::Window, ShotResult::Saved, "shot.boss")
    }
}

/// Upper bounds of each zone. Goal and penalty are half-open on the right,
/// the later zones are closed on the right, so 110 is a shot and 710 is
/// still a free kick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShotZones {
    pub goal: f64,
    pub penalty: f64,
    pub shot: f64,
    pub cross: f64,
    pub free_kick: f64,
}

impl Default for ShotZones {
    fn default() -> Self {
        Self {
            goal: shot_zones::GOAL,
            penalty: shot_zones::PENALTY,
            shot: shot_zones::SHOT,
            cross: shot_zones::CROSS,
            free_kick: shot_zones::FREE_KICK,
        }
    }
}

impl ShotZones {
    /// Deterministic zone lookup
    pub fn classify(&self, error_ms: f64) -> ShotZone {
        let e = sanitize(error_ms);
        if e < self.goal {
            ShotZone::Goal
        } else if e < self.penalty {
            ShotZone::Penalty
        } else if e <= self.shot {
            ShotZone::Shot
        } else if e <= self.cross {
            ShotZone::Cross
        } else if e <= self.free_kick {
            ShotZone::FreeKick
        } else {
            ShotZone::Offside
        }
    }
}

/// Probabilistic resolver used by classic, bot and online matches
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeResolver {
    zones: ShotZones,
}

impl OutcomeResolver {
    pub fn new(zones: ShotZones) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &ShotZones {
        &self.zones
    }

    /// Resolve one action. Each call draws fresh randomness where the zone asks for it.
    pub fn resolve<R: Rng + ?Sized>(&self, error_ms: f64, rng: &mut R) -> ShotOutcome {
        match self.zones.classify(error_ms) {
            ShotZone::Goal => ShotOutcome::new(ShotZone::Goal, ShotResult::Goal, "shot.goal.perfect"),
            ShotZone::Penalty => {
                let roll: f64 = rng.random();
                if roll < PENALTY_GOAL_CHANCE {
                    ShotOutcome::new(ShotZone::Penalty, ShotResult::Goal, "shot.penalty.goal")
                } else if roll < PENALTY_GOAL_CHANCE + PENALTY_WIDE_CHANCE {
                    ShotOutcome::new(ShotZone::Penalty, ShotResult::Wide, "shot.penalty.wide")
                } else {
                    ShotOutcome::new(ShotZone::Penalty, ShotResult::Saved, "shot.penalty.saved")
                }
            }
            ShotZone::Shot => {
                if rng.random_bool(SHOT_GOAL_CHANCE) {
                    ShotOutcome::new(ShotZone::Shot, ShotResult::Goal, "shot.shot.goal")
                } else {
                    ShotOutcome::new(ShotZone::Shot, ShotResult::Saved, "shot.shot.saved")
                }
            }
            ShotZone::Cross => {
                if !rng.random_bool(CROSS_LAND_CHANCE) {
                    ShotOutcome::new(ShotZone::Cross, ShotResult::Cleared, "shot.cross.cleared")
                } else if rng.random_bool(CROSS_FINISH_CHANCE) {
                    ShotOutcome::new(ShotZone::Cross, ShotResult::Goal, "shot.cross.header_goal")
                } else {
                    ShotOutcome::new(ShotZone::Cross, ShotResult::Saved, "shot.cross.header_saved")
                }
            }
            ShotZone::FreeKick => {
                let roll: f64 = rng.random();
                if roll < FREE_KICK_GOAL_CHANCE {
                    ShotOutcome::new(ShotZone::FreeKick, ShotResult::Goal, "shot.free_kick.goal")
                } else if roll < FREE_KICK_GOAL_CHANCE + FREE_KICK_POST_CHANCE {
                    ShotOutcome::new(ShotZone::FreeKick, ShotResult::Post, "shot.free_kick.post")
                } else {
                    ShotOutcome::new(ShotZone::FreeKick, ShotResult::Wide, "shot.free_kick.wide")
                }
            }
            _ => ShotOutcome::new(ShotZone::Offside, ShotResult::Offside, "shot.offside"),
        }
    }
}

/// Resolve with the default zone table
pub fn resolve<R: Rng + ?Sized>(error_ms: f64, rng: &mut R) -> ShotOutcome {
    OutcomeResolver::default().resolve(error_ms, rng)
}

/// Fixed shootout buckets: `[0, goal)` scores, `[goal, saved)` is saved,
/// `[saved, post)` hits the post, anything later goes wide. No dice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyBuckets {
    pub goal: f64,
    pub saved: f64,
    pub post: f64,
}

impl Default for PenaltyBuckets {
    fn default() -> Self {
        Self {
            goal: 50.0,
            saved: 250.0,
            post: 400.0,
        }
    }
}

impl PenaltyBuckets {
    pub fn judge(&self, error_ms: f64) -> ShotOutcome {
        let e = sanitize(error_ms);
        if e < self.goal {
            ShotOutcome::new(ShotZone::Spot, ShotResult::Goal, "penalty.goal")
        } else if e < self.saved {
            ShotOutcome::new(ShotZone::Spot, ShotResult::Saved, "penalty.saved")
        } else if e < self.post {
            ShotOutcome::new(ShotZone::Spot, ShotResult::Post, "penalty.post")
        } else {
            ShotOutcome::new(ShotZone::Spot, ShotResult::Wide, "penalty.wide")
        }
    }
}

/// Hit-window judgment for survival and time attack. Inside the window is a
/// goal; outside is wide, or offside past the free kick line.
pub fn judge_window(error_ms: f64, window_ms: f64, zones: &ShotZones) -> ShotOutcome {
    let e = sanitize(error_ms);
    if e <= window_ms {
        ShotOutcome::new(ShotZone::Window, ShotResult::Goal, "shot.window.hit")
    } else if e > zones.free_kick {
        ShotOutcome::new(ShotZone::Offside, ShotResult::Offside, "shot.offside")
    } else {
        ShotOutcome::new(ShotZone::Window, ShotResult::Wide, "shot.window.miss")
    }
}

/// Errors are distances; NaN counts as the worst possible timing
fn sanitize(error_ms: f64) -> f64 {
    if error_ms.is_nan() { f64::INFINITY } else { error_ms.abs() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(0xC10C)
    }

    fn goal_rate(error_ms: f64, trials: usize) -> f64 {
        let mut rng = rng();
        let goals = (0..trials)
            .filter(|_| resolve(error_ms, &mut rng).is_goal)
            .count();
        goals as f64 / trials as f64
    }

    #[test]
    fn test_boundaries() {
        let mut rng = rng();
        for _ in 0..200 {
            assert_eq!(resolve(9.0, &mut rng).result, ShotResult::Goal);
            assert_eq!(resolve(shot_zones::GOAL - 1.0, &mut rng).result, ShotResult::Goal);
            assert_eq!(resolve(10.0, &mut rng).zone, ShotZone::Penalty);
            assert_ne!(resolve(710.0, &mut rng).result, ShotResult::Offside);
            assert_eq!(resolve(711.0, &mut rng).result, ShotResult::Offside);
            assert_eq!(resolve(999.0, &mut rng).result, ShotResult::Offside);
        }
    }

    #[test]
    fn test_inclusive_upper_edges() {
        let zones = ShotZones::default();
        assert_eq!(zones.classify(109.9), ShotZone::Penalty);
        assert_eq!(zones.classify(110.0), ShotZone::Shot);
        assert_eq!(zones.classify(310.0), ShotZone::Shot);
        assert_eq!(zones.classify(310.5), ShotZone::Cross);
        assert_eq!(zones.classify(510.0), ShotZone::Cross);
        assert_eq!(zones.classify(710.0), ShotZone::FreeKick);
        assert_eq!(zones.classify(f64::NAN), ShotZone::Offside);
    }

    #[test]
    fn test_penalty_zone_distribution() {
        let rate = goal_rate(50.0, 1000);
        assert!((rate - 0.75).abs() < 0.05, "penalty goal rate {rate}");
    }

    #[test]
    fn test_penalty_zone_failure_split() {
        let mut rng = rng();
        let mut wide = 0;
        let mut saved = 0;
        for _ in 0..5000 {
            match resolve(60.0, &mut rng).result {
                ShotResult::Wide => wide += 1,
                ShotResult::Saved => saved += 1,
                ShotResult::Goal => {}
                other => panic!("unexpected {other:?}"),
            }
        }
        assert!(((wide as f64 / 5000.0) - 0.15).abs() < 0.03);
        assert!(((saved as f64 / 5000.0) - 0.10).abs() < 0.03);
    }

    #[test]
    fn test_later_zone_rates() {
        assert!((goal_rate(200.0, 5000) - 0.30).abs() < 0.03);
        assert!((goal_rate(400.0, 5000) - 0.20).abs() < 0.03);
        assert!((goal_rate(600.0, 5000) - 0.20).abs() < 0.03);
    }

    #[test]
    fn test_free_kick_hits_post_most() {
        let mut rng = rng();
        let posts = (0..5000)
            .filter(|_| resolve(650.0, &mut rng).result == ShotResult::Post)
            .count();
        assert!(((posts as f64 / 5000.0) - 0.60).abs() < 0.03);
    }

    #[test]
    fn test_not_memoized() {
        let mut rng = rng();
        let results: std::collections::HashSet<_> =
            (0..100).map(|_| resolve(50.0, &mut rng).result).collect();
        assert!(results.len() > 1);
    }

    #[test]
    fn test_penalty_buckets_are_deterministic() {
        let buckets = PenaltyBuckets::default();
        assert_eq!(buckets.judge(5.0).result, ShotResult::Goal);
        assert_eq!(buckets.judge(200.0).result, ShotResult::Saved);
        assert_eq!(buckets.judge(300.0).result, ShotResult::Post);
        assert_eq!(buckets.judge(900.0).result, ShotResult::Wide);
    }

    #[test]
    fn test_window_judgment() {
        let zones = ShotZones::default();
        assert!(judge_window(40.0, 40.0, &zones).is_goal);
        assert_eq!(judge_window(41.0, 40.0, &zones).result, ShotResult::Wide);
        assert_eq!(judge_window(800.0, 40.0, &zones).result, ShotResult::Offside);
    }

    #[test]
    fn test_effect_mapping() {
        assert_eq!(ShotResult::Saved.effect(), EffectKind::Save);
        assert_eq!(ShotResult::Post.effect(), EffectKind::Post);
        assert_eq!(ShotResult::TimedOut.effect(), EffectKind::Miss);
        assert!(!ShotOutcome::timed_out().is_goal);
    }

    proptest! {
        #[test]
        fn prop_sure_zones_ignore_dice(seed in any::<u64>(), err in 0.0f64..10.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            prop_assert_eq!(resolve(err, &mut rng).result, ShotResult::Goal);
        }

        #[test]
        fn prop_past_free_kick_is_offside(seed in any::<u64>(), err in 710.001f64..5000.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            prop_assert_eq!(resolve(err, &mut rng).result, ShotResult::Offside);
        }

        #[test]
        fn prop_zone_matches_classify(seed in any::<u64>(), err in 10.0f64..710.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let outcome = resolve(err, &mut rng);
            prop_assert_eq!(outcome.zone, ShotZones::default().classify(err));
            prop_assert_eq!(outcome.is_goal, outcome.result == ShotResult::Goal);
        }
    }
}
