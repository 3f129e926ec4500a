//! Penalty shootout: five kicks each, then sudden death while level.
//! Kicks are judged by fixed buckets with no dice involved.

use super::{Judged, Shot, result_by_scores};
use crate::sim::outcome::{PenaltyBuckets, ShotOutcome, ShotResult};
use crate::sim::state::{GameEvent, ModeSnapshot, Player};

/// Paired rounds before sudden death
pub const REGULATION_ROUNDS: usize = 5;

#[derive(Debug, Clone)]
pub struct PenaltyRules {
    buckets: PenaltyBuckets,
    kicks: [Vec<ShotResult>; 2],
    scores: [u64; 2],
    sudden_death: bool,
}

impl PenaltyRules {
    pub fn new(buckets: PenaltyBuckets) -> Self {
        Self {
            buckets,
            kicks: [Vec::new(), Vec::new()],
            scores: [0; 2],
            sudden_death: false,
        }
    }

    pub fn scores(&self) -> [u64; 2] {
        self.scores
    }

    pub fn kicks(&self, player: Player) -> &[ShotResult] {
        &self.kicks[player.index()]
    }

    pub fn in_sudden_death(&self) -> bool {
        self.sudden_death
    }

    /// Paired rounds both players have completed
    pub fn completed_rounds(&self) -> usize {
        self.kicks[0].len().min(self.kicks[1].len())
    }

    pub fn on_action(&mut self, shot: &Shot, events: &mut Vec<GameEvent>) -> Judged {
        let outcome = if shot.is_timeout() {
            ShotOutcome::timed_out()
        } else {
            self.buckets.judge(shot.error_ms)
        };
        let idx = shot.player.index();
        self.kicks[idx].push(outcome.result);
        if outcome.is_goal {
            self.scores[idx] += 1;
        }

        let mut finished = None;
        let paired = self.kicks[0].len() == self.kicks[1].len();
        let rounds = self.completed_rounds();
        if paired && rounds >= REGULATION_ROUNDS {
            if self.scores[0] != self.scores[1] {
                finished = Some(result_by_scores(self.scores));
            } else {
                self.sudden_death = true;
                events.push(GameEvent::SuddenDeath {
                    round: rounds as u32 + 1,
                });
            }
        }
        Judged { outcome, finished }
    }

    pub fn detail(&self) -> ModeSnapshot {
        ModeSnapshot::Penalty {
            kicks: self.kicks.clone(),
            round: self.completed_rounds() as u32 + 1,
            sudden_death: self.sudden_death,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::modes::ActionSource;
    use crate::sim::state::MatchResult;

    fn kick(player: Player, error_ms: f64) -> Shot {
        Shot {
            player,
            source: ActionSource::Input,
            elapsed_ms: 0.0,
            cycle_pos: error_ms,
            error_ms,
        }
    }

    #[test]
    fn test_five_nil_without_sudden_death() {
        let mut events = Vec::new();
        let mut rules = PenaltyRules::new(PenaltyBuckets::default());
        let mut finished = None;
        for round in 0..5 {
            let judged = rules.on_action(&kick(Player::P1, 5.0), &mut events);
            assert_eq!(judged.outcome.result, ShotResult::Goal);
            assert_eq!(judged.finished, None);
            let judged = rules.on_action(&kick(Player::P2, 200.0), &mut events);
            assert_eq!(judged.outcome.result, ShotResult::Saved);
            if round < 4 {
                assert_eq!(judged.finished, None);
            }
            finished = judged.finished;
        }
        assert_eq!(finished, Some(MatchResult::Winner { player: Player::P1 }));
        assert_eq!(rules.scores(), [5, 0]);
        assert!(!rules.in_sudden_death());
        assert!(events.is_empty());
    }

    #[test]
    fn test_sudden_death_until_decided() {
        let mut events = Vec::new();
        let mut rules = PenaltyRules::new(PenaltyBuckets::default());
        for _ in 0..5 {
            rules.on_action(&kick(Player::P1, 5.0), &mut events);
            rules.on_action(&kick(Player::P2, 5.0), &mut events);
        }
        assert!(rules.in_sudden_death());
        assert!(events.contains(&GameEvent::SuddenDeath { round: 6 }));

        rules.on_action(&kick(Player::P1, 300.0), &mut events);
        let judged = rules.on_action(&kick(Player::P2, 300.0), &mut events);
        assert_eq!(judged.outcome.result, ShotResult::Post);
        assert_eq!(judged.finished, None);
        assert!(events.contains(&GameEvent::SuddenDeath { round: 7 }));

        let judged = rules.on_action(&kick(Player::P1, 900.0), &mut events);
        assert_eq!(judged.outcome.result, ShotResult::Wide);
        assert_eq!(judged.finished, None);
        let judged = rules.on_action(&kick(Player::P2, 10.0), &mut events);
        assert_eq!(judged.finished, Some(MatchResult::Winner { player: Player::P2 }));
        assert_eq!(rules.kicks(Player::P2).len(), 7);
    }

    #[test]
    fn test_timeout_counts_as_miss() {
        let mut events = Vec::new();
        let mut rules = PenaltyRules::new(PenaltyBuckets::default());
        let judged = rules.on_action(&Shot::timed_out(Player::P1, 0.0), &mut events);
        assert_eq!(judged.outcome.result, ShotResult::TimedOut);
        assert_eq!(rules.kicks(Player::P1), &[ShotResult::TimedOut]);
    }
}
