//! Time attack: beat the countdown. Hits buy time and points scaled by the
//! combo multiplier, misses cost time, and a red boss zone near the target
//! costs a lot of time unless fever is running.

use rand::Rng;

use super::{Judged, Shot};
use crate::consts::CYCLE_MS;
use crate::sim::outcome::{ShotOutcome, ShotZones, judge_window};
use crate::sim::state::{GameEvent, MatchResult, ModeSnapshot};
use crate::sim::variant::{Variant, VariantState};
use crate::tuning::TimeAttackTuning;

#[derive(Debug, Clone)]
pub struct TimeAttackRules {
    tuning: TimeAttackTuning,
    zones: ShotZones,
    /// Starting time plus bonuses minus penalties; time left is this minus elapsed
    time_bank_ms: f64,
    score: u64,
    combo: u32,
    goals: u32,
    fever_until_ms: Option<f64>,
    fevers: u32,
    boss_ms: Option<u32>,
    /// Variant picked by goal rotation, replacing the player's choice
    rotation: Option<Variant>,
}

impl TimeAttackRules {
    pub fn new(tuning: TimeAttackTuning, zones: ShotZones) -> Self {
        Self {
            time_bank_ms: tuning.start_time_ms,
            tuning,
            zones,
            score: 0,
            combo: 0,
            goals: 0,
            fever_until_ms: None,
            fevers: 0,
            boss_ms: None,
            rotation: None,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Times fever has been triggered this run
    pub fn fevers(&self) -> u32 {
        self.fevers
    }

    pub fn in_fever(&self) -> bool {
        self.fever_until_ms.is_some()
    }

    pub fn boss_ms(&self) -> Option<u32> {
        self.boss_ms
    }

    pub fn multiplier(&self) -> u32 {
        (1 + self.combo / self.tuning.multiplier_every).min(self.tuning.max_multiplier)
    }

    pub fn window_ms(&self) -> f64 {
        let factor = (1.0 - self.tuning.window_shrink).powi(self.goals as i32);
        (self.tuning.base_window_ms * factor).max(self.tuning.min_window_ms)
    }

    pub fn time_left_ms(&self, elapsed_ms: f64) -> f64 {
        (self.time_bank_ms - elapsed_ms).max(0.0)
    }

    /// Fever steadies the clock; otherwise the rotation (if any) wins
    pub fn effective_variant(&self, base: Variant) -> Variant {
        if self.in_fever() {
            Variant::Classic
        } else {
            self.rotation.unwrap_or(base)
        }
    }

    fn adjust_time(&mut self, delta_ms: f64, events: &mut Vec<GameEvent>) {
        self.time_bank_ms += delta_ms;
        events.push(GameEvent::TimeAdjusted { delta_ms });
    }

    fn check_end(&self, elapsed_ms: f64) -> Option<MatchResult> {
        if self.time_left_ms(elapsed_ms) <= 0.0 {
            Some(MatchResult::Solo { score: self.score })
        } else {
            None
        }
    }

    pub fn on_action(&mut self, shot: &Shot, events: &mut Vec<GameEvent>) -> Judged {
        let boss_hit = match self.boss_ms {
            Some(boss) if !shot.is_timeout() && !self.in_fever() => {
                (shot.cycle_pos - f64::from(boss)).abs() <= self.tuning.boss_radius_ms
            }
            _ => false,
        };

        let outcome = if shot.is_timeout() {
            ShotOutcome::timed_out()
        } else if boss_hit {
            ShotOutcome::boss_hit()
        } else {
            judge_window(shot.error_ms, self.window_ms(), &self.zones)
        };

        if boss_hit {
            self.combo = 0;
            events.push(GameEvent::BossHit);
            self.adjust_time(-self.tuning.boss_penalty_ms, events);
        } else if outcome.is_goal {
            self.on_hit(shot, events);
        } else {
            self.combo = 0;
            self.adjust_time(-self.tuning.miss_penalty_ms, events);
        }
        self.boss_ms = None;

        Judged {
            outcome,
            finished: self.check_end(shot.elapsed_ms),
        }
    }

    fn on_hit(&mut self, shot: &Shot, events: &mut Vec<GameEvent>) {
        self.combo += 1;
        self.goals += 1;
        self.score += self.tuning.base_points * u64::from(self.multiplier());

        let mut bonus = self.tuning.hit_bonus_ms;
        if shot.error_ms <= self.tuning.critical_ms {
            bonus += self.tuning.critical_bonus_ms;
        }
        self.adjust_time(bonus, events);

        if self.combo % self.tuning.fever_every == 0 {
            self.fever_until_ms = Some(shot.elapsed_ms + self.tuning.fever_duration_ms);
            self.fevers += 1;
            events.push(GameEvent::FeverStarted);
        }
        if self.goals % self.tuning.rotate_every == 0 {
            let current = self.rotation.unwrap_or_default();
            let next = current.next();
            self.rotation = Some(next);
            events.push(GameEvent::VariantChanged { variant: next });
        }
    }

    /// Maybe place a boss zone just beside the target
    pub fn on_round_start<R: Rng + ?Sized>(&mut self, variant: &VariantState, rng: &mut R, events: &mut Vec<GameEvent>) {
        self.boss_ms = None;
        if self.in_fever() || !rng.random_bool(self.tuning.boss_chance) {
            return;
        }
        let gap = f64::from(rng.random_range(60..=150u32));
        let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let offset = (f64::from(variant.target_offset_ms) + side * gap).rem_euclid(CYCLE_MS) as u32;
        self.boss_ms = Some(offset);
        events.push(GameEvent::BossSpawned { offset_ms: offset });
    }

    pub fn on_tick(&mut self, elapsed_ms: f64, events: &mut Vec<GameEvent>) -> Option<MatchResult> {
        if let Some(until) = self.fever_until_ms {
            if elapsed_ms >= until {
                self.fever_until_ms = None;
                events.push(GameEvent::FeverEnded);
            }
        }
        self.check_end(elapsed_ms)
    }

    pub fn detail(&self, elapsed_ms: f64) -> ModeSnapshot {
        ModeSnapshot::TimeAttack {
            time_left_ms: self.time_left_ms(elapsed_ms),
            combo: self.combo,
            multiplier: self.multiplier(),
            fever: self.in_fever(),
            goals: self.goals,
            window_ms: self.window_ms(),
            boss_ms: self.boss_ms,
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

    fn rules() -> TimeAttackRules {
        TimeAttackRules::new(TimeAttackTuning::default(), ShotZones::default())
    }

    fn shot(elapsed_ms: f64, cycle_pos: f64, error_ms: f64) -> Shot {
        Shot {
            player: Player::P1,
            source: ActionSource::Input,
            elapsed_ms,
            cycle_pos,
            error_ms,
        }
    }

    #[test]
    fn test_ten_hits_one_fever_and_rising_multiplier() {
        let mut events = Vec::new();
        let mut rules = rules();
        let mut multipliers = Vec::new();
        for i in 0..10 {
            let judged = rules.on_action(&shot(f64::from(i) * 100.0, 5.0, 5.0), &mut events);
            assert!(judged.outcome.is_goal);
            multipliers.push(rules.multiplier());
            if i < 9 {
                assert_eq!(rules.fevers(), 0);
            }
        }
        assert_eq!(rules.fevers(), 1);
        assert_eq!(events.iter().filter(|e| **e == GameEvent::FeverStarted).count(), 1);
        assert!(multipliers.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(multipliers[3], 1);
        assert_eq!(multipliers[4], 2);
        assert_eq!(multipliers[9], 3);
    }

    #[test]
    fn test_multiplier_caps_at_five() {
        let mut events = Vec::new();
        let mut rules = rules();
        for i in 0..60 {
            rules.on_action(&shot(f64::from(i), 0.0, 0.0), &mut events);
        }
        assert_eq!(rules.combo(), 60);
        assert_eq!(rules.multiplier(), 5);
    }

    #[test]
    fn test_miss_costs_time_and_combo() {
        let mut events = Vec::new();
        let mut rules = rules();
        rules.on_action(&shot(0.0, 5.0, 5.0), &mut events);
        assert_eq!(rules.time_left_ms(0.0), 63_000.0);
        let judged = rules.on_action(&shot(0.0, 500.0, 500.0), &mut events);
        assert_eq!(judged.outcome.result, ShotResult::Wide);
        assert_eq!(rules.combo(), 0);
        assert_eq!(rules.time_left_ms(0.0), 60_000.0);
        assert_eq!(rules.score(), 100);
    }

    #[test]
    fn test_boss_penalty_and_fever_immunity() {
        let mut events = Vec::new();
        let mut rules = rules();
        rules.boss_ms = Some(100);
        let judged = rules.on_action(&shot(0.0, 110.0, 110.0), &mut events);
        assert_eq!(judged.outcome.result, ShotResult::Saved);
        assert!(events.contains(&GameEvent::BossHit));
        assert_eq!(rules.time_left_ms(0.0), 55_000.0);

        rules.fever_until_ms = Some(10_000.0);
        rules.boss_ms = Some(100);
        let judged = rules.on_action(&shot(0.0, 100.0, 100.0), &mut events);
        assert!(judged.outcome.is_goal);
    }

    #[test]
    fn test_rotation_every_five_goals_and_fever_override() {
        let mut events = Vec::new();
        let mut rules = rules();
        for i in 0..5 {
            rules.on_action(&shot(f64::from(i), 0.0, 0.0), &mut events);
        }
        assert_eq!(rules.effective_variant(Variant::Unstable), Variant::Ghost);
        for i in 5..10 {
            rules.on_action(&shot(f64::from(i), 0.0, 0.0), &mut events);
        }
        assert!(rules.in_fever());
        assert_eq!(rules.effective_variant(Variant::Unstable), Variant::Classic);
        rules.on_tick(60_000.0, &mut events);
        assert!(!rules.in_fever());
        assert_eq!(rules.effective_variant(Variant::Unstable), Variant::Unstable);
    }

    #[test]
    fn test_runs_out_of_time() {
        let mut events = Vec::new();
        let mut rules = rules();
        assert_eq!(rules.on_tick(59_999.0, &mut events), None);
        assert_eq!(rules.on_tick(60_000.0, &mut events), Some(MatchResult::Solo { score: 0 }));
    }

    #[test]
    fn test_boss_spawns_beside_target() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut events = Vec::new();
        let mut rules = TimeAttackRules::new(
            TimeAttackTuning {
                boss_chance: 1.0,
                ..TimeAttackTuning::default()
            },
            ShotZones::default(),
        );
        let variant = VariantState {
            variant: Variant::Moving,
            round_seed: 0,
            target_offset_ms: 500,
        };
        for _ in 0..50 {
            rules.on_round_start(&variant, &mut rng, &mut events);
            let boss = f64::from(rules.boss_ms().unwrap());
            let gap = (boss - 500.0).abs();
            assert!((60.0..=150.0).contains(&gap), "gap {gap}");
        }
    }
}
