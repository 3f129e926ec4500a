//! Classic and bot matches: two turn holders, goals are points. The match
//! ends when the overall cap runs out or one player exhausts their own
//! time budget.

use rand::Rng;

use super::{Judged, Shot, result_by_scores};
use crate::sim::outcome::{OutcomeResolver, ShotOutcome};
use crate::sim::state::{MatchResult, ModeSnapshot, Player};
use crate::tuning::MatchTuning;

#[derive(Debug, Clone)]
pub struct MatchRules {
    vs_bot: bool,
    resolver: OutcomeResolver,
    duration_cap_ms: f64,
    player_budget_ms: f64,
    scores: [u64; 2],
    budget_used_ms: [f64; 2],
    /// Elapsed time up to which budgets have been charged
    charged_until_ms: f64,
}

impl MatchRules {
    pub fn new(vs_bot: bool, resolver: OutcomeResolver, tuning: &MatchTuning) -> Self {
        Self {
            vs_bot,
            resolver,
            duration_cap_ms: tuning.duration_cap_ms,
            player_budget_ms: tuning.player_budget_ms,
            scores: [0; 2],
            budget_used_ms: [0.0; 2],
            charged_until_ms: 0.0,
        }
    }

    pub fn vs_bot(&self) -> bool {
        self.vs_bot
    }

    pub fn scores(&self) -> [u64; 2] {
        self.scores
    }

    pub fn budget_left_ms(&self, player: Player) -> f64 {
        (self.player_budget_ms - self.budget_used_ms[player.index()]).max(0.0)
    }

    /// Bill the time since the last charge to whoever held the turn
    fn charge(&mut self, elapsed_ms: f64, active: Player) {
        let delta = (elapsed_ms - self.charged_until_ms).max(0.0);
        self.budget_used_ms[active.index()] += delta;
        self.charged_until_ms = self.charged_until_ms.max(elapsed_ms);
    }

    pub fn on_action<R: Rng + ?Sized>(&mut self, shot: &Shot, rng: &mut R) -> Judged {
        self.charge(shot.elapsed_ms, shot.player);
        let outcome = if shot.is_timeout() {
            ShotOutcome::timed_out()
        } else {
            self.resolver.resolve(shot.error_ms, rng)
        };
        if outcome.is_goal {
            self.scores[shot.player.index()] += 1;
        }
        Judged {
            outcome,
            finished: self.check_end(shot.elapsed_ms),
        }
    }

    pub fn on_tick(&mut self, elapsed_ms: f64, active: Player) -> Option<MatchResult> {
        self.charge(elapsed_ms, active);
        self.check_end(elapsed_ms)
    }

    fn check_end(&self, elapsed_ms: f64) -> Option<MatchResult> {
        let budget_gone = self
            .budget_used_ms
            .iter()
            .any(|used| *used >= self.player_budget_ms);
        if elapsed_ms >= self.duration_cap_ms || budget_gone {
            Some(result_by_scores(self.scores))
        } else {
            None
        }
    }

    pub fn detail(&self, elapsed_ms: f64) -> ModeSnapshot {
        ModeSnapshot::Match {
            budget_left_ms: [self.budget_left_ms(Player::P1), self.budget_left_ms(Player::P2)],
            cap_left_ms: (self.duration_cap_ms - elapsed_ms).max(0.0),
        }
    }
}
