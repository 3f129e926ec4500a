//! Mode rules
//!
//! Every mode shares the clock, variant and turn machinery owned by the
//! session; a `ModeController` only decides what an action is worth and when
//! the game is over. Dispatch is a plain match over the tagged variant.

pub mod match_play;
pub mod online;
pub mod penalty;
pub mod survival;
pub mod time_attack;

use rand::Rng;

use super::outcome::{OutcomeResolver, ShotOutcome};
use super::state::{GameEvent, GameMode, MatchResult, ModeSnapshot, Player};
use super::turn::TurnStyle;
use super::variant::{Variant, VariantState};
use crate::tuning::Tuning;

pub use match_play::MatchRules;
pub use online::{ActionReport, OnlineRules, RemoteSnapshot, SyncChannel};
pub use penalty::PenaltyRules;
pub use survival::SurvivalRules;
pub use time_attack::TimeAttackRules;

/// Where an action came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSource {
    Input,
    Bot,
    /// Synthesized when the turn clock ran out
    Timeout,
}

/// One action, measured at the instant it happened
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    pub player: Player,
    pub source: ActionSource,
    pub elapsed_ms: f64,
    /// Position within the cycle after distortion
    pub cycle_pos: f64,
    /// Distance to the primary target; infinite for timeouts
    pub error_ms: f64,
}

impl Shot {
    pub fn timed_out(player: Player, elapsed_ms: f64) -> Self {
        Self {
            player,
            source: ActionSource::Timeout,
            elapsed_ms,
            cycle_pos: f64::NAN,
            error_ms: f64::INFINITY,
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.source == ActionSource::Timeout
    }
}

/// What a mode made of an action
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judged {
    pub outcome: ShotOutcome,
    pub finished: Option<MatchResult>,
}

/// Winner by score, or a draw
pub fn result_by_scores(scores: [u64; 2]) -> MatchResult {
    match scores[0].cmp(&scores[1]) {
        std::cmp::Ordering::Greater => MatchResult::Winner { player: Player::P1 },
        std::cmp::Ordering::Less => MatchResult::Winner { player: Player::P2 },
        std::cmp::Ordering::Equal => MatchResult::Draw,
    }
}

#[derive(Debug, Clone)]
pub enum ModeController {
    Match(MatchRules),
    Survival(SurvivalRules),
    TimeAttack(TimeAttackRules),
    Penalty(PenaltyRules),
    Online(OnlineRules),
}

impl ModeController {
    pub fn new(mode: GameMode, tuning: &Tuning, local_player: Player) -> Self {
        let resolver = OutcomeResolver::new(tuning.zones);
        match mode {
            GameMode::Classic => ModeController::Match(MatchRules::new(false, resolver, &tuning.matches)),
            GameMode::Bot => ModeController::Match(MatchRules::new(true, resolver, &tuning.matches)),
            GameMode::Survival => {
                ModeController::Survival(SurvivalRules::new(tuning.survival.clone(), tuning.zones))
            }
            GameMode::TimeAttack => {
                ModeController::TimeAttack(TimeAttackRules::new(tuning.time_attack.clone(), tuning.zones))
            }
            GameMode::Penalty => ModeController::Penalty(PenaltyRules::new(tuning.penalty)),
            GameMode::Online => ModeController::Online(OnlineRules::new(local_player, resolver)),
        }
    }

    pub fn mode(&self) -> GameMode {
        match self {
            ModeController::Match(m) if m.vs_bot() => GameMode::Bot,
            ModeController::Match(_) => GameMode::Classic,
            ModeController::Survival(_) => GameMode::Survival,
            ModeController::TimeAttack(_) => GameMode::TimeAttack,
            ModeController::Penalty(_) => GameMode::Penalty,
            ModeController::Online(_) => GameMode::Online,
        }
    }

    pub fn turn_style(&self) -> TurnStyle {
        match self {
            ModeController::Survival(_) | ModeController::TimeAttack(_) => TurnStyle::Single,
            _ => TurnStyle::Alternating,
        }
    }

    /// Player two's turns are played by the bot
    pub fn bot_player(&self) -> Option<Player> {
        match self {
            ModeController::Match(m) if m.vs_bot() => Some(Player::P2),
            _ => None,
        }
    }

    /// Turns are switched locally after every action (the room does it online)
    pub fn drives_turns(&self) -> bool {
        !matches!(self, ModeController::Online(_))
    }

    /// Whether `player` may act right now, beyond it being their turn
    pub fn accepts_action(&self, player: Player) -> bool {
        match self {
            ModeController::Online(o) => o.accepts_action(player),
            _ => true,
        }
    }

    pub fn on_action<R: Rng + ?Sized>(&mut self, shot: &Shot, rng: &mut R, events: &mut Vec<GameEvent>) -> Judged {
        match self {
            ModeController::Match(m) => m.on_action(shot, rng),
            ModeController::Survival(s) => s.on_action(shot, rng, events),
            ModeController::TimeAttack(t) => t.on_action(shot, events),
            ModeController::Penalty(p) => p.on_action(shot, events),
            ModeController::Online(o) => o.on_action(shot, rng),
        }
    }

    /// Called after the turn advanced and the variant drew its round data
    pub fn on_round_start<R: Rng + ?Sized>(&mut self, variant: &VariantState, rng: &mut R, events: &mut Vec<GameEvent>) {
        match self {
            ModeController::Survival(s) => s.on_round_start(variant, rng, events),
            ModeController::TimeAttack(t) => t.on_round_start(variant, rng, events),
            _ => {}
        }
    }

    /// Time-driven rules (budgets, countdowns, fever expiry)
    pub fn on_tick(&mut self, elapsed_ms: f64, active: Player, events: &mut Vec<GameEvent>) -> Option<MatchResult> {
        match self {
            ModeController::Match(m) => m.on_tick(elapsed_ms, active),
            ModeController::Survival(s) => {
                s.on_tick(elapsed_ms, events);
                None
            }
            ModeController::TimeAttack(t) => t.on_tick(elapsed_ms, events),
            ModeController::Penalty(_) | ModeController::Online(_) => None,
        }
    }

    /// Variant to run this round with, given the one the player picked
    pub fn effective_variant(&self, base: Variant) -> Variant {
        match self {
            ModeController::Survival(s) => s.effective_variant(base),
            ModeController::TimeAttack(t) => t.effective_variant(base),
            _ => base,
        }
    }

    /// Clock speed multiplier
    pub fn speed(&self) -> f64 {
        match self {
            ModeController::Survival(s) => s.speed(),
            _ => 1.0,
        }
    }

    /// Remap the cycle position before measuring the error
    pub fn map_cycle(&self, cycle_pos: f64) -> f64 {
        match self {
            ModeController::Survival(s) => s.map_cycle(cycle_pos),
            _ => cycle_pos,
        }
    }

    pub fn scores(&self) -> [u64; 2] {
        match self {
            ModeController::Match(m) => m.scores(),
            ModeController::Survival(s) => [s.score(), 0],
            ModeController::TimeAttack(t) => [t.score(), 0],
            ModeController::Penalty(p) => p.scores(),
            ModeController::Online(o) => o.scores(),
        }
    }

    /// Score worth submitting to the leaderboard at the end of a run
    pub fn leaderboard_score(&self) -> Option<u64> {
        match self {
            ModeController::Match(m) if m.vs_bot() => Some(m.scores()[0]),
            ModeController::Survival(s) => Some(s.score()),
            ModeController::TimeAttack(t) => Some(t.score()),
            _ => None,
        }
    }

    pub fn detail(&self, elapsed_ms: f64) -> ModeSnapshot {
        match self {
            ModeController::Match(m) => m.detail(elapsed_ms),
            ModeController::Survival(s) => s.detail(),
            ModeController::TimeAttack(t) => t.detail(elapsed_ms),
            ModeController::Penalty(p) => p.detail(),
            ModeController::Online(o) => o.detail(),
        }
    }

    pub fn as_online_mut(&mut self) -> Option<&mut OnlineRules> {
        match self {
            ModeController::Online(o) => Some(o),
            _ => None,
        }
    }
}
