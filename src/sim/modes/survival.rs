//! Survival: one player, a handful of lives, and a target that gets harder
//! the longer the streak runs.
//!
//! Streak levels (every 5 hits by default) shrink the hit window and speed up
//! the clock. Further milestones hand out bonus lives and curses. Critical
//! hits fill an adrenaline meter; a full meter starts fever, which makes
//! misses free and leaves a one-shot shield behind when it runs out.

use rand::Rng;

use super::{Judged, Shot};
use crate::consts::CYCLE_MS;
use crate::sim::outcome::{ShotOutcome, ShotZones, judge_window};
use crate::sim::state::{Curse, GameEvent, MatchResult, ModeSnapshot};
use crate::sim::variant::{Variant, VariantState};
use crate::tuning::SurvivalTuning;

/// Adrenaline needed to trigger fever
pub const ADRENALINE_FULL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveCurse {
    curse: Curse,
    hits_left: u32,
}

#[derive(Debug, Clone)]
pub struct SurvivalRules {
    tuning: SurvivalTuning,
    zones: ShotZones,
    lives: u8,
    streak: u32,
    best_streak: u32,
    score: u64,
    shield: bool,
    adrenaline: u32,
    fever_until_ms: Option<f64>,
    curse: Option<ActiveCurse>,
    red_target_ms: Option<u32>,
}

/// True if going from `old` to `new` passed a multiple of `every`
fn crossed(old: u32, new: u32, every: u32) -> bool {
    every > 0 && new / every > old / every
}

impl SurvivalRules {
    pub fn new(tuning: SurvivalTuning, zones: ShotZones) -> Self {
        Self {
            lives: tuning.starting_lives,
            tuning,
            zones,
            streak: 0,
            best_streak: 0,
            score: 0,
            shield: false,
            adrenaline: 0,
            fever_until_ms: None,
            curse: None,
            red_target_ms: None,
        }
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn has_shield(&self) -> bool {
        self.shield
    }

    pub fn in_fever(&self) -> bool {
        self.fever_until_ms.is_some()
    }

    pub fn curse(&self) -> Option<Curse> {
        self.curse.map(|c| c.curse)
    }

    pub fn red_target_ms(&self) -> Option<u32> {
        self.red_target_ms
    }

    fn level(&self) -> u32 {
        self.streak / self.tuning.level_every
    }

    /// Current hit radius around the target
    pub fn window_ms(&self) -> f64 {
        let factor = (1.0 - self.tuning.window_shrink).powi(self.level() as i32);
        (self.tuning.base_window_ms * factor).max(self.tuning.min_window_ms)
    }

    pub fn speed(&self) -> f64 {
        (1.0 + self.tuning.speed_step * f64::from(self.level())).min(self.tuning.max_speed)
    }

    pub fn effective_variant(&self, base: Variant) -> Variant {
        match self.curse() {
            Some(Curse::Chaotic) => Variant::Unstable,
            Some(Curse::Relocating) => Variant::Moving,
            _ => base,
        }
    }

    pub fn map_cycle(&self, cycle_pos: f64) -> f64 {
        match self.curse() {
            Some(Curse::Reversed) => (CYCLE_MS - cycle_pos).rem_euclid(CYCLE_MS),
            _ => cycle_pos,
        }
    }

    fn fever_active_at(&self, elapsed_ms: f64) -> bool {
        self.fever_until_ms.is_some_and(|until| elapsed_ms < until)
    }

    pub fn on_action<R: Rng + ?Sized>(&mut self, shot: &Shot, rng: &mut R, events: &mut Vec<GameEvent>) -> Judged {
        let window = self.window_ms();
        let red_distance = match self.red_target_ms {
            Some(red) if !shot.is_timeout() => Some((shot.cycle_pos - f64::from(red)).abs()),
            _ => None,
        };
        // The primary target wins when both are in reach
        let red_hit = shot.error_ms > window && red_distance.is_some_and(|d| d <= window);

        let outcome = if shot.is_timeout() {
            ShotOutcome::timed_out()
        } else if let (true, Some(d)) = (red_hit, red_distance) {
            judge_window(d, window, &self.zones)
        } else {
            judge_window(shot.error_ms, window, &self.zones)
        };

        let finished = if outcome.is_goal {
            self.on_hit(shot, red_hit, rng, events);
            None
        } else {
            self.on_miss(shot, events)
        };
        Judged { outcome, finished }
    }

    fn on_hit<R: Rng + ?Sized>(&mut self, shot: &Shot, red_hit: bool, rng: &mut R, events: &mut Vec<GameEvent>) {
        let old = self.streak;
        let gain = if red_hit { 1 + self.tuning.red_target_bonus } else { 1 };
        self.streak += gain;
        self.score += u64::from(gain);
        self.best_streak = self.best_streak.max(self.streak);
        self.red_target_ms = None;

        if shot.error_ms <= self.tuning.critical_ms {
            self.adrenaline = (self.adrenaline + self.tuning.adrenaline_per_critical).min(ADRENALINE_FULL);
        } else {
            self.adrenaline = self.adrenaline.saturating_sub(self.tuning.adrenaline_decay_on_hit);
        }
        if self.adrenaline >= ADRENALINE_FULL && !self.in_fever() {
            self.adrenaline = 0;
            self.fever_until_ms = Some(shot.elapsed_ms + self.tuning.fever_duration_ms);
            events.push(GameEvent::FeverStarted);
        }

        if crossed(old, self.streak, self.tuning.bonus_life_every) && self.lives < self.tuning.max_lives {
            self.lives += 1;
            events.push(GameEvent::BonusLife { lives: self.lives });
        }

        if let Some(active) = self.curse.as_mut() {
            active.hits_left = active.hits_left.saturating_sub(1);
            if active.hits_left == 0 {
                events.push(GameEvent::CurseEnded { curse: active.curse });
                self.curse = None;
            }
        }
        if self.curse.is_none() && crossed(old, self.streak, self.tuning.curse_every) {
            let curse = Curse::ALL[rng.random_range(0..Curse::ALL.len())];
            self.curse = Some(ActiveCurse {
                curse,
                hits_left: self.tuning.curse_hits,
            });
            events.push(GameEvent::CurseStarted { curse });
        }
    }

    fn on_miss(&mut self, shot: &Shot, events: &mut Vec<GameEvent>) -> Option<MatchResult> {
        if self.fever_active_at(shot.elapsed_ms) {
            return None;
        }
        if self.shield {
            self.shield = false;
            events.push(GameEvent::ShieldUsed);
            return None;
        }
        self.lives = self.lives.saturating_sub(1);
        self.adrenaline = 0;
        events.push(GameEvent::LifeLost { lives: self.lives });
        if self.lives == 0 {
            self.streak = 0;
            return Some(MatchResult::Solo { score: self.score });
        }
        None
    }

    /// Maybe spawn a red target for the new round, away from the real one
    pub fn on_round_start<R: Rng + ?Sized>(&mut self, variant: &VariantState, rng: &mut R, events: &mut Vec<GameEvent>) {
        self.red_target_ms = None;
        if rng.random_bool(self.tuning.red_target_chance) {
            let shift = rng.random_range(250..=750);
            let offset = (variant.target_offset_ms + shift) % CYCLE_MS as u32;
            self.red_target_ms = Some(offset);
            events.push(GameEvent::RedTargetSpawned { offset_ms: offset });
        }
    }

    pub fn on_tick(&mut self, elapsed_ms: f64, events: &mut Vec<GameEvent>) {
        if let Some(until) = self.fever_until_ms {
            if elapsed_ms >= until {
                self.fever_until_ms = None;
                self.shield = true;
                events.push(GameEvent::FeverEnded);
                events.push(GameEvent::ShieldGained);
            }
        }
    }

    pub fn detail(&self) -> ModeSnapshot {
        ModeSnapshot::Survival {
            lives: self.lives,
            streak: self.streak,
            best_streak: self.best_streak,
            window_ms: self.window_ms(),
            speed: self.speed(),
            shield: self.shield,
            fever: self.in_fever(),
            adrenaline: self.adrenaline,
            curse: self.curse(),
            red_target_ms: self.red_target_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::modes::ActionSource;
    use crate::sim::outcome::ShotResult;
    use crate::sim::state::Player;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rules() -> SurvivalRules {
        SurvivalRules::new(
            SurvivalTuning {
                red_target_chance: 0.0,
                ..SurvivalTuning::default()
            },
            ShotZones::default(),
        )
    }

    fn shot(elapsed_ms: f64, error_ms: f64) -> Shot {
        Shot {
            player: Player::P1,
            source: ActionSource::Input,
            elapsed_ms,
            cycle_pos: error_ms,
            error_ms,
        }
    }

    /// Solid hit that is not critical
    fn hit(rules: &mut SurvivalRules, rng: &mut Pcg32, events: &mut Vec<GameEvent>) -> Judged {
        rules.on_action(&shot(0.0, 20.0), rng, events)
    }

    #[test]
    fn test_lives_deplete_to_zero() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        assert_eq!(rules.lives(), 3);
        for expected in [2, 1] {
            let judged = rules.on_action(&shot(0.0, 400.0), &mut rng, &mut events);
            assert_eq!(judged.outcome.result, ShotResult::Wide);
            assert_eq!(judged.finished, None);
            assert_eq!(rules.lives(), expected);
        }
        let judged = rules.on_action(&Shot::timed_out(Player::P1, 0.0), &mut rng, &mut events);
        assert_eq!(rules.lives(), 0);
        assert_eq!(judged.finished, Some(MatchResult::Solo { score: 0 }));
        rules.on_action(&shot(0.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.lives(), 0);
    }

    #[test]
    fn test_streak_survives_non_fatal_miss() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        hit(&mut rules, &mut rng, &mut events);
        hit(&mut rules, &mut rng, &mut events);
        rules.on_action(&shot(0.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.streak(), 2);
        rules.on_action(&shot(0.0, 400.0), &mut rng, &mut events);
        rules.on_action(&shot(0.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.streak(), 0);
        assert_eq!(rules.score(), 2);
    }

    #[test]
    fn test_levels_shrink_window_and_speed_up() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        assert_eq!(rules.window_ms(), 100.0);
        assert_eq!(rules.speed(), 1.0);
        for _ in 0..5 {
            hit(&mut rules, &mut rng, &mut events);
        }
        assert!((rules.window_ms() - 95.0).abs() < 1e-9);
        assert!((rules.speed() - 1.05).abs() < 1e-9);
        for _ in 0..200 {
            hit(&mut rules, &mut rng, &mut events);
        }
        assert_eq!(rules.speed(), 1.5);
        assert!(rules.window_ms() >= 30.0);
    }

    #[test]
    fn test_bonus_life_every_ten_capped() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        for _ in 0..10 {
            hit(&mut rules, &mut rng, &mut events);
        }
        assert_eq!(rules.lives(), 4);
        for _ in 0..40 {
            hit(&mut rules, &mut rng, &mut events);
        }
        assert_eq!(rules.lives(), 5);
    }

    #[test]
    fn test_curse_lasts_three_hits() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        for _ in 0..15 {
            hit(&mut rules, &mut rng, &mut events);
        }
        let curse = rules.curse().expect("curse at 15");
        assert!(events.contains(&GameEvent::CurseStarted { curse }));
        hit(&mut rules, &mut rng, &mut events);
        hit(&mut rules, &mut rng, &mut events);
        assert!(rules.curse().is_some());
        hit(&mut rules, &mut rng, &mut events);
        assert_eq!(rules.curse(), None);
        assert!(events.contains(&GameEvent::CurseEnded { curse }));
    }

    #[test]
    fn test_curse_effects() {
        let mut rules = rules();
        rules.curse = Some(ActiveCurse {
            curse: Curse::Reversed,
            hits_left: 3,
        });
        assert_eq!(rules.map_cycle(250.0), 750.0);
        assert_eq!(rules.map_cycle(0.0), 0.0);
        rules.curse = Some(ActiveCurse {
            curse: Curse::Chaotic,
            hits_left: 3,
        });
        assert_eq!(rules.effective_variant(Variant::Classic), Variant::Unstable);
        rules.curse = Some(ActiveCurse {
            curse: Curse::Relocating,
            hits_left: 3,
        });
        assert_eq!(rules.effective_variant(Variant::Ghost), Variant::Moving);
    }

    #[test]
    fn test_red_target_bonus() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        rules.red_target_ms = Some(600);
        let judged = rules.on_action(
            &Shot {
                player: Player::P1,
                source: ActionSource::Input,
                elapsed_ms: 0.0,
                cycle_pos: 605.0,
                error_ms: 605.0,
            },
            &mut rng,
            &mut events,
        );
        assert!(judged.outcome.is_goal);
        assert_eq!(rules.streak(), 10);
        assert_eq!(rules.red_target_ms(), None);
        // Crossing 10 still grants the bonus life
        assert_eq!(rules.lives(), 4);
    }

    #[test]
    fn test_red_target_spawns_away_from_target() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut events = Vec::new();
        let mut rules = SurvivalRules::new(
            SurvivalTuning {
                red_target_chance: 1.0,
                ..SurvivalTuning::default()
            },
            ShotZones::default(),
        );
        let variant = VariantState::new(Variant::Classic);
        rules.on_round_start(&variant, &mut rng, &mut events);
        let red = rules.red_target_ms().unwrap();
        assert!((250..=750).contains(&red));
    }

    #[test]
    fn test_red_target_stays_clear_of_late_target() {
        let mut rng = Pcg32::seed_from_u64(21);
        let mut events = Vec::new();
        let mut rules = SurvivalRules::new(
            SurvivalTuning {
                red_target_chance: 1.0,
                ..SurvivalTuning::default()
            },
            ShotZones::default(),
        );
        let mut variant = VariantState::new(Variant::Moving);
        variant.target_offset_ms = 700;
        for _ in 0..2000 {
            rules.on_round_start(&variant, &mut rng, &mut events);
            let red = i64::from(rules.red_target_ms().unwrap());
            let linear = (red - 700).abs();
            let wrapped = linear.min(1000 - linear);
            assert!(wrapped >= 250, "red target at {red}");
        }

        let judged = rules.on_action(
            &Shot {
                player: Player::P1,
                source: ActionSource::Input,
                elapsed_ms: 0.0,
                cycle_pos: 700.0,
                error_ms: 0.0,
            },
            &mut rng,
            &mut events,
        );
        assert!(judged.outcome.is_goal);
        assert_eq!(rules.streak(), 1);
    }

    #[test]
    fn test_primary_hit_beats_overlapping_red_target() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        rules.red_target_ms = Some(40);
        let judged = rules.on_action(&shot(0.0, 20.0), &mut rng, &mut events);
        assert!(judged.outcome.is_goal);
        assert_eq!(rules.streak(), 1);
    }

    #[test]
    fn test_fever_immunity_then_shield() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut events = Vec::new();
        let mut rules = rules();
        for _ in 0..4 {
            rules.on_action(&shot(1_000.0, 2.0), &mut rng, &mut events);
        }
        assert!(rules.in_fever());
        assert!(events.contains(&GameEvent::FeverStarted));

        rules.on_action(&shot(2_000.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.lives(), 3);

        rules.on_tick(6_000.0, &mut events);
        assert!(!rules.in_fever());
        assert!(rules.has_shield());

        rules.on_action(&shot(7_000.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.lives(), 3);
        assert!(!rules.has_shield());
        assert!(events.contains(&GameEvent::ShieldUsed));

        rules.on_action(&shot(8_000.0, 400.0), &mut rng, &mut events);
        assert_eq!(rules.lives(), 2);
    }
}
