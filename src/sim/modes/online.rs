//! Online match: the room is authoritative. The local side renders time from
//! the room's anchors, resolves its own kick with the shared resolver and
//! reports it; scores and turn ownership only change when the room says so.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Judged, Shot, result_by_scores};
use crate::error::SyncError;
use crate::sim::outcome::{OutcomeResolver, ShotOutcome};
use crate::sim::state::{MatchResult, ModeSnapshot, Player};

/// Room state as pushed by the sync channel. Each one replaces the last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    pub current_turn: Player,
    pub scores: [u64; 2],
    /// Server epoch ms
    pub round_start_time: f64,
    /// Server epoch ms
    pub turn_start_time: f64,
    pub round_seed: u32,
    pub time_remaining: f64,
    pub is_paused: bool,
}

/// Outbound result of a local kick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionReport {
    pub player: Player,
    pub error_ms: f64,
    pub outcome: ShotOutcome,
    /// Turn the kick belongs to, so the room can drop stale reports
    pub turn_start_time: f64,
}

/// Outbound half of the room connection; inbound state arrives through
/// `GameSession::apply_remote`
pub trait SyncChannel {
    fn send_action(&mut self, report: &ActionReport) -> Result<(), SyncError>;
}

#[derive(Debug, Clone)]
pub struct OnlineRules {
    local_player: Player,
    resolver: OutcomeResolver,
    scores: [u64; 2],
    time_remaining_ms: f64,
    turn_start_time: f64,
    /// Turn we already reported for; cleared when the room moves on
    reported_turn: Option<f64>,
}

impl OnlineRules {
    pub fn new(local_player: Player, resolver: OutcomeResolver) -> Self {
        Self {
            local_player,
            resolver,
            scores: [0; 2],
            time_remaining_ms: 0.0,
            turn_start_time: 0.0,
            reported_turn: None,
        }
    }

    pub fn local_player(&self) -> Player {
        self.local_player
    }

    pub fn scores(&self) -> [u64; 2] {
        self.scores
    }

    pub fn awaiting_room(&self) -> bool {
        self.reported_turn.is_some()
    }

    /// Only the local player acts, once per turn
    pub fn accepts_action(&self, player: Player) -> bool {
        player == self.local_player && self.reported_turn != Some(self.turn_start_time)
    }

    pub fn on_action<R: Rng + ?Sized>(&mut self, shot: &Shot, rng: &mut R) -> Judged {
        let outcome = if shot.is_timeout() {
            ShotOutcome::timed_out()
        } else {
            self.resolver.resolve(shot.error_ms, rng)
        };
        self.reported_turn = Some(self.turn_start_time);
        Judged {
            outcome,
            finished: None,
        }
    }

    pub fn report(&self, shot: &Shot, outcome: ShotOutcome) -> ActionReport {
        ActionReport {
            player: shot.player,
            error_ms: if shot.error_ms.is_finite() { shot.error_ms } else { -1.0 },
            outcome,
            turn_start_time: self.turn_start_time,
        }
    }

    /// Take the room's word for scores and time
    pub fn apply(&mut self, snapshot: &RemoteSnapshot) -> Option<MatchResult> {
        self.scores = snapshot.scores;
        self.time_remaining_ms = snapshot.time_remaining;
        self.turn_start_time = snapshot.turn_start_time;
        if self.reported_turn.is_some_and(|t| t != snapshot.turn_start_time) {
            self.reported_turn = None;
        }
        if snapshot.time_remaining <= 0.0 {
            Some(result_by_scores(self.scores))
        } else {
            None
        }
    }

    pub fn detail(&self) -> ModeSnapshot {
        ModeSnapshot::Online {
            local_player: self.local_player,
            time_remaining_ms: self.time_remaining_ms,
            awaiting_room: self.awaiting_room(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::modes::ActionSource;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn snapshot(turn: Player, turn_start_time: f64) -> RemoteSnapshot {
        RemoteSnapshot {
            current_turn: turn,
            scores: [2, 1],
            round_start_time: 1_000.0,
            turn_start_time,
            round_seed: 0,
            time_remaining: 30_000.0,
            is_paused: false,
        }
    }

    #[test]
    fn test_one_report_per_turn() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut rules = OnlineRules::new(Player::P1, OutcomeResolver::default());
        rules.apply(&snapshot(Player::P1, 5_000.0));
        assert!(rules.accepts_action(Player::P1));
        assert!(!rules.accepts_action(Player::P2));

        let shot = Shot {
            player: Player::P1,
            source: ActionSource::Input,
            elapsed_ms: 0.0,
            cycle_pos: 4.0,
            error_ms: 4.0,
        };
        let judged = rules.on_action(&shot, &mut rng);
        assert!(judged.outcome.is_goal);
        // Scores wait for the room
        assert_eq!(rules.scores(), [2, 1]);
        assert!(!rules.accepts_action(Player::P1));

        // Duplicate of the same snapshot keeps us waiting
        rules.apply(&snapshot(Player::P1, 5_000.0));
        assert!(rules.awaiting_room());

        rules.apply(&snapshot(Player::P2, 9_000.0));
        assert!(!rules.awaiting_room());
    }

    #[test]
    fn test_room_ends_match() {
        let mut rules = OnlineRules::new(Player::P2, OutcomeResolver::default());
        let mut snap = snapshot(Player::P1, 0.0);
        snap.time_remaining = 0.0;
        assert_eq!(rules.apply(&snap), Some(MatchResult::Winner { player: Player::P1 }));
    }

    #[test]
    fn test_report_json() {
        let rules = OnlineRules::new(Player::P1, OutcomeResolver::default());
        let shot = Shot::timed_out(Player::P1, 0.0);
        let report = rules.report(&shot, ShotOutcome::timed_out());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["player"], "p1");
        assert_eq!(json["errorMs"], -1.0);
        assert_eq!(json["outcome"]["result"], "TimedOut");
    }
}
