//! Shared game types: players, phases, events and the read-only snapshot
//! handed to the presentation layer every frame.

use serde::{Deserialize, Serialize};

use super::outcome::{EffectKind, ShotOutcome, ShotResult};
use super::variant::Variant;

/// Turn holder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    #[default]
    P1,
    P2,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::P1 => Player::P2,
            Player::P2 => Player::P1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::P1 => 0,
            Player::P2 => 1,
        }
    }
}

/// Session lifecycle: `Idle -> Countdown(3,2,1) -> Playing <-> Paused -> Finished`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Idle,
    /// Steps left before play (3, 2, 1)
    Countdown(u8),
    Playing,
    Paused,
    Finished,
}

/// Game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Two local players on one device
    #[default]
    Classic,
    /// Player one against a simulated opponent
    Bot,
    Survival,
    TimeAttack,
    /// Best of five plus sudden death
    Penalty,
    Online,
}

impl GameMode {
    pub const ALL: [GameMode; 6] = [
        GameMode::Classic,
        GameMode::Bot,
        GameMode::Survival,
        GameMode::TimeAttack,
        GameMode::Penalty,
        GameMode::Online,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Bot => "bot",
            GameMode::Survival => "survival",
            GameMode::TimeAttack => "time_attack",
            GameMode::Penalty => "penalty",
            GameMode::Online => "online",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        GameMode::ALL.into_iter().find(|m| m.as_str() == s.to_lowercase())
    }
}

/// Survival debuffs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curse {
    /// Target mirrored across the cycle
    Reversed,
    /// Clock wobbles like the unstable variant
    Chaotic,
    /// Target relocates every round
    Relocating,
}

impl Curse {
    pub const ALL: [Curse; 3] = [Curse::Reversed, Curse::Chaotic, Curse::Relocating];
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    Winner { player: Player },
    Draw,
    /// Single-player run
    Solo { score: u64 },
}

/// Things that happened since the last drain; presentation and sound
/// collaborators subscribe to these, the core never waits on them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Countdown { step: u8 },
    Started,
    Paused,
    Resumed,
    TurnStarted { player: Player, round_index: u32 },
    ShotResolved {
        player: Player,
        error_ms: f64,
        outcome: ShotOutcome,
    },
    Effect { kind: EffectKind, player: Player },
    LifeLost { lives: u8 },
    BonusLife { lives: u8 },
    ShieldGained,
    ShieldUsed,
    FeverStarted,
    FeverEnded,
    CurseStarted { curse: Curse },
    CurseEnded { curse: Curse },
    RedTargetSpawned { offset_ms: u32 },
    BossSpawned { offset_ms: u32 },
    BossHit,
    TimeAdjusted { delta_ms: f64 },
    VariantChanged { variant: Variant },
    SuddenDeath { round: u32 },
    Finished { result: MatchResult },
}

/// Mode-specific part of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeSnapshot {
    Match {
        budget_left_ms: [f64; 2],
        cap_left_ms: f64,
    },
    Survival {
        lives: u8,
        streak: u32,
        best_streak: u32,
        window_ms: f64,
        speed: f64,
        shield: bool,
        fever: bool,
        adrenaline: u32,
        curse: Option<Curse>,
        red_target_ms: Option<u32>,
    },
    TimeAttack {
        time_left_ms: f64,
        combo: u32,
        multiplier: u32,
        fever: bool,
        goals: u32,
        window_ms: f64,
        boss_ms: Option<u32>,
    },
    Penalty {
        kicks: [Vec<ShotResult>; 2],
        round: u32,
        sudden_death: bool,
    },
    Online {
        local_player: Player,
        time_remaining_ms: f64,
        awaiting_room: bool,
    },
}

/// Everything the presentation layer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub elapsed_ms: f64,
    /// Whole ms within the cycle as displayed (after variant distortion)
    pub display_ms: u32,
    pub target_offset_ms: u32,
    pub variant: Variant,
    /// Ghost variant: readout should be hidden right now
    pub display_hidden: bool,
    pub turn_time_left_sec: u32,
    pub active_player: Player,
    pub round_index: u32,
    pub scores: [u64; 2],
    pub detail: ModeSnapshot,
    pub result: Option<MatchResult>,
}
