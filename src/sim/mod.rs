//! Game core
//!
//! All gameplay logic lives here. Nothing in this module touches the browser:
//! - Time comes in through `TimeSource`, never from a global clock
//! - Randomness comes from a seeded `Pcg32` owned by the session
//! - Callbacks are data in a `TimerQueue`, polled from the frame loop

pub mod bot;
pub mod clock;
pub mod modes;
pub mod outcome;
pub mod session;
pub mod state;
pub mod timers;
pub mod turn;
pub mod variant;

pub use bot::{BotAgent, BotProfile};
pub use clock::{GameClock, RemoteClock};
pub use modes::{ActionReport, ActionSource, ModeController, RemoteSnapshot, Shot, SyncChannel};
pub use outcome::{EffectKind, OutcomeResolver, PenaltyBuckets, ShotOutcome, ShotResult, ShotZone, ShotZones, resolve};
pub use session::{ActionResult, GameSession, IgnoreReason};
pub use state::{Curse, GameEvent, GameMode, GamePhase, MatchResult, ModeSnapshot, Player, Snapshot};
pub use timers::{TimeBase, TimerQueue, TimerToken};
pub use turn::{TurnSequencer, TurnStyle, TurnTick};
pub use variant::{Variant, VariantState, compute_visual_time};
