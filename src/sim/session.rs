//! Game session
//!
//! Composition root for one run of one mode. The session owns the clock, the
//! turn sequencer, the variant state, the mode rules and the timer queue, and
//! is driven from outside by three kinds of calls:
//! - `tick` from the frame callback (fires due timers, runs time-based rules)
//! - `handle_action` from input
//! - `pause`/`resume`/`restart`/`exit` (and `apply_remote` in online play)
//!
//! Every timer carries the turn serial it was scheduled for and is re-checked
//! against the live phase and serial right before it mutates anything.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::bot::BotAgent;
use super::clock::{GameClock, RemoteClock};
use super::modes::{ActionSource, ModeController, RemoteSnapshot, Shot, SyncChannel};
use super::outcome::ShotOutcome;
use super::state::{GameEvent, GameMode, GamePhase, MatchResult, Player, Snapshot};
use super::timers::{TimeBase, TimerQueue, TimerToken};
use super::turn::{TurnSequencer, TurnTick};
use super::variant::{Variant, VariantState};
use crate::consts::{COUNTDOWN_STEP_MS, CYCLE_MS};
use crate::highscores::Scoreboard;
use crate::platform::TimeSource;
use crate::settings::Settings;
use crate::tuning::Tuning;
use crate::{cycle_position, displayed_ms};

/// One second on the turn clock
const TURN_TICK_MS: f64 = 1000.0;

/// Pending callbacks, as data
#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionTimer {
    /// `step` counts from 1 at the first step after the countdown began
    CountdownStep { step: u32 },
    /// `second` counts from 1 at the first decrement of the turn
    TurnSecond { turn: u64, second: u32 },
    /// `due_ms` is the game time the move is meant for
    BotMove { turn: u64, due_ms: f64 },
}

/// Why an action had no effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    NotYourTurn,
    /// The simulated opponent holds the turn
    BotTurn,
    /// Turn changed (usually a timeout) between the input and its handling
    StaleTurn,
    /// Already reported this turn to the room
    AlreadyActed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Resolved(ShotOutcome),
    Ignored(IgnoreReason),
}

pub struct GameSession {
    tuning: Tuning,
    settings: Settings,
    local_player: Player,
    mode: ModeController,
    clock: GameClock,
    /// Present in online play: the room's anchors replace the local epoch
    remote: Option<RemoteClock>,
    turns: TurnSequencer,
    base_variant: Variant,
    variant: VariantState,
    timers: TimerQueue<SessionTimer>,
    bot: BotAgent,
    rng: Pcg32,
    time: Box<dyn TimeSource>,
    scoreboard: Option<Box<dyn Scoreboard>>,
    sync: Option<Box<dyn SyncChannel>>,
    events: Vec<GameEvent>,
    result: Option<MatchResult>,
    /// Wall time the countdown began at
    countdown_started_at: f64,
    /// Game elapsed at which the current turn began
    turn_started_at: f64,
    /// Clock speed and the (elapsed, scaled) point it took effect at
    speed: f64,
    speed_anchor: (f64, f64),
    generation: u32,
}

impl GameSession {
    /// New idle session for `settings.mode`. Invalid tuning is replaced by the defaults.
    pub fn new(settings: Settings, tuning: Tuning, time: Box<dyn TimeSource>, seed: u64) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("Rejected tuning, using defaults: {e}");
                Tuning::default()
            }
        };
        let local_player = Player::P1;
        let mode = ModeController::new(settings.mode, &tuning, local_player);
        let online = settings.mode == GameMode::Online;
        Self {
            clock: Self::fresh_clock(&tuning, online),
            remote: online.then(RemoteClock::new),
            turns: TurnSequencer::new(mode.turn_style(), tuning.turn.limit_secs),
            base_variant: settings.variant,
            variant: VariantState::new(settings.variant),
            timers: TimerQueue::new(),
            bot: BotAgent::new(settings.bot_difficulty.profile()),
            rng: Pcg32::seed_from_u64(seed),
            time,
            scoreboard: None,
            sync: None,
            events: Vec::new(),
            result: None,
            countdown_started_at: 0.0,
            turn_started_at: 0.0,
            speed: 1.0,
            speed_anchor: (0.0, 0.0),
            generation: 0,
            local_player,
            mode,
            settings,
            tuning,
        }
    }

    /// The room runs its own countdown, so online play starts immediately
    fn fresh_clock(tuning: &Tuning, online: bool) -> GameClock {
        GameClock::new(if online { 0 } else { tuning.turn.countdown_steps })
    }

    pub fn with_scoreboard(mut self, scoreboard: Box<dyn Scoreboard>) -> Self {
        self.scoreboard = Some(scoreboard);
        self
    }

    pub fn with_sync(mut self, sync: Box<dyn SyncChannel>) -> Self {
        self.set_sync(Some(sync));
        self
    }

    /// Attach or drop the outbound room link
    pub fn set_sync(&mut self, sync: Option<Box<dyn SyncChannel>>) {
        self.sync = sync;
    }

    /// Seat assigned by the room
    pub fn with_local_player(mut self, player: Player) -> Self {
        self.local_player = player;
        self.mode = ModeController::new(self.settings.mode, &self.tuning, player);
        self
    }

    pub fn phase(&self) -> GamePhase {
        self.clock.phase()
    }

    pub fn mode(&self) -> &ModeController {
        &self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    /// Bumped by `restart` and `exit`
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Leave idle: countdown first, or straight into play
    pub fn start(&mut self) -> bool {
        let now = self.time.now_ms();
        match self.clock.start(now) {
            Some(GamePhase::Countdown(step)) => {
                log::info!("Countdown started for {}", self.mode.mode().as_str());
                self.events.push(GameEvent::Countdown { step });
                self.countdown_started_at = now;
                self.schedule_countdown_step(1);
                true
            }
            Some(GamePhase::Playing) => {
                self.on_started();
                true
            }
            _ => false,
        }
    }

    fn on_started(&mut self) {
        log::info!("Kick off: {}", self.mode.mode().as_str());
        self.events.push(GameEvent::Started);
        if self.remote.is_none() {
            self.turns.start_round();
            self.turn_started_at = self.clock.elapsed_ms();
            self.begin_round();
        }
    }

    /// Fresh variant data, mode hooks, turn timer and the bot's move
    fn begin_round(&mut self) {
        let effective = self.mode.effective_variant(self.base_variant);
        self.variant.switch_to(effective, &mut self.rng);
        self.mode.on_round_start(&self.variant, &mut self.rng, &mut self.events);

        let active = self.turns.active();
        let serial = self.turns.turn_serial();
        self.events.push(GameEvent::TurnStarted {
            player: active,
            round_index: self.turns.round_index(),
        });
        self.schedule_turn_second(serial, 1);
        if self.mode.bot_player() == Some(active) {
            self.schedule_bot_move(serial, self.turn_started_at);
        }
    }

    fn schedule_bot_move(&mut self, turn: u64, from_ms: f64) {
        let due_ms = from_ms + self.bot.profile().reaction_delay_ms;
        self.bot
            .schedule_move(&mut self.timers, from_ms, SessionTimer::BotMove { turn, due_ms });
    }

    fn schedule_countdown_step(&mut self, step: u32) {
        self.timers.after(
            TimeBase::Wall,
            self.countdown_started_at,
            f64::from(step) * COUNTDOWN_STEP_MS,
            SessionTimer::CountdownStep { step },
        );
    }

    fn schedule_turn_second(&mut self, turn: u64, second: u32) {
        self.timers.after(
            TimeBase::Game,
            self.turn_started_at,
            f64::from(second) * TURN_TICK_MS,
            SessionTimer::TurnSecond { turn, second },
        );
    }

    /// Current elapsed game time, read from the time source
    fn read_elapsed(&mut self) -> f64 {
        match &self.remote {
            Some(remote) => {
                self.clock.tick(self.time.now_ms());
                remote.elapsed_ms(self.time.epoch_ms())
            }
            None => self.clock.tick(self.time.now_ms()),
        }
    }

    fn scaled_elapsed(&self, elapsed_ms: f64) -> f64 {
        let (at, scaled) = self.speed_anchor;
        scaled + (elapsed_ms - at) * self.speed
    }

    /// Re-anchor when the mode changes the clock speed so the readout never jumps
    fn refresh_speed(&mut self, elapsed_ms: f64) {
        let speed = self.mode.speed();
        if speed != self.speed {
            self.speed_anchor = (elapsed_ms, self.scaled_elapsed(elapsed_ms));
            self.speed = speed;
        }
    }

    fn visual_time(&self, elapsed_ms: f64) -> f64 {
        let wall_secs = self.time.epoch_ms() / 1000.0;
        self.variant.visual_time(self.scaled_elapsed(elapsed_ms), wall_secs)
    }

    /// Advance the session to now. Returns elapsed game time.
    pub fn tick(&mut self) -> f64 {
        self.run_due_timers();
        let elapsed = self.read_elapsed();
        if self.clock.phase() != GamePhase::Playing {
            return elapsed;
        }

        if let Some(remote) = &self.remote {
            let left = remote.turn_time_left_secs(self.turns.limit_secs(), self.time.epoch_ms());
            let synced = remote.is_synced();
            self.turns.force(self.turns.active(), left);
            if synced && left == 0 && self.turns.active() == self.local_player {
                self.apply_timeout(self.local_player, elapsed);
            }
        }

        if self.clock.phase() == GamePhase::Playing {
            let active = self.turns.active();
            if let Some(result) = self.mode.on_tick(elapsed, active, &mut self.events) {
                self.finish(result);
            }
        }
        self.read_elapsed()
    }

    fn run_due_timers(&mut self) {
        loop {
            let wall = self.time.now_ms();
            let game = self.read_elapsed();
            let Some((token, timer)) = self.timers.pop_due(wall, game) else {
                break;
            };
            self.fire(token, timer);
        }
    }

    fn fire(&mut self, token: TimerToken, timer: SessionTimer) {
        match timer {
            SessionTimer::CountdownStep { step } => {
                // Play begins on the exact step boundary, not at the late frame
                let at = self.countdown_started_at + f64::from(step) * COUNTDOWN_STEP_MS;
                match self.clock.countdown_step(at) {
                    Some(GamePhase::Countdown(left)) => {
                        self.events.push(GameEvent::Countdown { step: left });
                        self.schedule_countdown_step(step + 1);
                    }
                    Some(GamePhase::Playing) => self.on_started(),
                    _ => {}
                }
            }
            SessionTimer::TurnSecond { turn, second } => {
                if self.clock.phase() != GamePhase::Playing {
                    return;
                }
                match self.turns.decrement_turn_timer(turn) {
                    TurnTick::Running(_) => self.schedule_turn_second(turn, second + 1),
                    TurnTick::TimedOut => {
                        let at = self.turn_started_at + f64::from(second) * TURN_TICK_MS;
                        self.apply_timeout(self.turns.active(), at);
                    }
                    TurnTick::Stale => {}
                }
            }
            SessionTimer::BotMove { turn, due_ms } => {
                if !self.bot.claim(token)
                    || turn != self.turns.turn_serial()
                    || self.clock.phase() != GamePhase::Playing
                {
                    return;
                }
                let error_ms = self.bot.profile().sample_error(&mut self.rng);
                let target = f64::from(self.variant.target_offset_ms);
                let shot = Shot {
                    player: self.turns.active(),
                    source: ActionSource::Bot,
                    elapsed_ms: due_ms,
                    cycle_pos: (target + error_ms).rem_euclid(CYCLE_MS),
                    error_ms,
                };
                self.apply_shot(shot);
            }
        }
    }

    fn apply_timeout(&mut self, player: Player, elapsed_ms: f64) {
        if !self.mode.accepts_action(player) {
            return;
        }
        log::debug!("{player:?} ran out of time");
        self.apply_shot(Shot::timed_out(player, elapsed_ms));
    }

    /// Input for whoever holds the turn (the local seat online)
    pub fn handle_action(&mut self) -> ActionResult {
        let player = if self.remote.is_some() {
            self.local_player
        } else {
            self.turns.active()
        };
        if self.mode.bot_player() == Some(player) && self.turns.active() == player {
            return self.ignored(IgnoreReason::BotTurn);
        }
        self.handle_action_as(player)
    }

    /// Input attributed to a specific player
    pub fn handle_action_as(&mut self, player: Player) -> ActionResult {
        let serial = self.turns.turn_serial();
        // A timeout that is already due wins over this input
        self.run_due_timers();

        if self.clock.phase() != GamePhase::Playing {
            return self.ignored(IgnoreReason::NotPlaying);
        }
        if self.remote.is_none() && self.turns.turn_serial() != serial {
            return self.ignored(IgnoreReason::StaleTurn);
        }
        if player != self.turns.active() {
            return self.ignored(IgnoreReason::NotYourTurn);
        }
        if !self.mode.accepts_action(player) {
            return self.ignored(IgnoreReason::AlreadyActed);
        }

        let elapsed_ms = self.read_elapsed();
        let cycle_pos = self.mode.map_cycle(cycle_position(self.visual_time(elapsed_ms)));
        let shot = Shot {
            player,
            source: ActionSource::Input,
            elapsed_ms,
            cycle_pos,
            error_ms: self.variant.error_at(cycle_pos),
        };
        ActionResult::Resolved(self.apply_shot(shot))
    }

    fn ignored(&self, reason: IgnoreReason) -> ActionResult {
        log::debug!("Ignored action: {reason:?}");
        ActionResult::Ignored(reason)
    }

    fn apply_shot(&mut self, shot: Shot) -> ShotOutcome {
        let judged = self.mode.on_action(&shot, &mut self.rng, &mut self.events);
        let outcome = judged.outcome;
        log::debug!(
            "{:?} {:?}: error {:.0}ms -> {:?}",
            shot.player,
            shot.source,
            shot.error_ms,
            outcome.result
        );
        self.events.push(GameEvent::ShotResolved {
            player: shot.player,
            error_ms: shot.error_ms,
            outcome,
        });
        self.events.push(GameEvent::Effect {
            kind: outcome.result.effect(),
            player: shot.player,
        });
        self.refresh_speed(shot.elapsed_ms);

        if let Some(online) = self.mode.as_online_mut() {
            let report = online.report(&shot, outcome);
            match self.sync.as_mut() {
                Some(sync) => {
                    if let Err(e) = sync.send_action(&report) {
                        log::warn!("Could not report action to room: {e}");
                    }
                }
                None => log::warn!("Online action with no sync channel attached"),
            }
        }

        if let Some(result) = judged.finished {
            self.finish(result);
        } else if self.mode.drives_turns() {
            self.next_turn(shot.elapsed_ms);
        }
        outcome
    }

    fn next_turn(&mut self, at_ms: f64) {
        self.bot.cancel(&mut self.timers);
        self.timers
            .cancel_where(|t| matches!(t, SessionTimer::TurnSecond { .. } | SessionTimer::BotMove { .. }));
        self.turns.switch_turn();
        self.turn_started_at = at_ms;
        self.begin_round();
    }

    fn finish(&mut self, result: MatchResult) {
        let now = self.time.now_ms();
        self.clock.finish(now);
        self.timers.cancel_all();
        self.bot.forget();
        self.result = Some(result);
        self.events.push(GameEvent::Finished { result });
        log::info!("Game finished ({}): {result:?}", self.mode.mode().as_str());

        let Some(score) = self.mode.leaderboard_score() else {
            return;
        };
        if let Some(board) = self.scoreboard.as_mut() {
            let mode = self.mode.mode();
            match board.submit_score(mode, self.settings.display_name(), score) {
                Ok(true) => log::info!("New high score in {}: {score}", mode.as_str()),
                Ok(false) => {}
                Err(e) => log::warn!("Score submission failed: {e}"),
            }
        }
    }

    pub fn pause(&mut self) -> bool {
        if self.remote.is_some() {
            log::debug!("Online pause is controlled by the room");
            return false;
        }
        let now = self.time.now_ms();
        if !self.clock.pause(now) {
            return false;
        }
        self.bot.cancel(&mut self.timers);
        self.events.push(GameEvent::Paused);
        log::info!("Paused at {:.0}ms", self.clock.elapsed_ms());
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.remote.is_some() {
            return false;
        }
        let now = self.time.now_ms();
        if !self.clock.resume(now) {
            return false;
        }
        self.events.push(GameEvent::Resumed);
        log::info!("Resumed");
        let active = self.turns.active();
        if self.mode.bot_player() == Some(active) && !self.bot.has_pending() {
            self.schedule_bot_move(self.turns.turn_serial(), self.clock.elapsed_ms());
        }
        true
    }

    /// Drop every pending timer and put all state back to idle
    fn teardown(&mut self) {
        self.timers.cancel_all();
        self.bot.forget();
        self.generation = self.generation.wrapping_add(1);

        let online = self.remote.is_some();
        self.mode = ModeController::new(self.settings.mode, &self.tuning, self.local_player);
        self.clock = Self::fresh_clock(&self.tuning, online);
        self.remote = online.then(RemoteClock::new);
        self.turns.reset();
        self.variant = VariantState::new(self.base_variant);
        self.result = None;
        self.countdown_started_at = 0.0;
        self.turn_started_at = 0.0;
        self.speed = 1.0;
        self.speed_anchor = (0.0, 0.0);
    }

    /// Back to idle with fresh state, ready for `start`
    pub fn restart(&mut self) {
        self.teardown();
        self.events.clear();
        log::info!("Session restarted (generation {})", self.generation);
    }

    /// Leave the mode: nothing scheduled survives and the room link is dropped
    pub fn exit(&mut self) {
        self.teardown();
        self.events.clear();
        self.sync = None;
        log::info!("Session exited");
    }

    /// Take the room's state as the truth, whatever order it arrives in
    pub fn apply_remote(&mut self, snapshot: &RemoteSnapshot) {
        if self.remote.is_none() {
            log::debug!("Ignoring room state outside online play");
            return;
        }
        match self.clock.phase() {
            GamePhase::Finished => return,
            GamePhase::Idle => {
                self.start();
            }
            _ => {}
        }

        let epoch = self.time.epoch_ms();
        let limit = self.turns.limit_secs();
        let Some(remote) = self.remote.as_mut() else {
            return;
        };
        let new_turn = !remote.is_synced() || remote.turn_start_time() != snapshot.turn_start_time;
        remote.apply(
            snapshot.round_start_time,
            snapshot.turn_start_time,
            snapshot.is_paused,
            epoch,
        );
        let left = remote.turn_time_left_secs(limit, epoch);

        self.turns.force(snapshot.current_turn, left);
        self.variant.apply_seed(snapshot.round_seed);
        if new_turn {
            self.events.push(GameEvent::TurnStarted {
                player: snapshot.current_turn,
                round_index: self.turns.round_index(),
            });
        }

        let now = self.time.now_ms();
        if snapshot.is_paused && self.clock.pause(now) {
            self.events.push(GameEvent::Paused);
        } else if !snapshot.is_paused && self.clock.resume(now) {
            self.events.push(GameEvent::Resumed);
        }

        let finished = self.mode.as_online_mut().and_then(|online| online.apply(snapshot));
        if let Some(result) = finished {
            self.finish(result);
        }
    }

    /// Server minus client clock, measured by the transport
    pub fn set_clock_offset(&mut self, offset_ms: f64) {
        if let Some(remote) = self.remote.as_mut() {
            remote.set_offset(offset_ms);
        }
    }

    /// Read-only view for the presentation layer
    pub fn snapshot(&self) -> Snapshot {
        let elapsed_ms = match &self.remote {
            Some(remote) => remote.elapsed_ms(self.time.epoch_ms()),
            None => self.clock.elapsed_ms(),
        };
        let visual = self.visual_time(elapsed_ms);
        let display_hidden = self
            .variant
            .variant
            .hides_display_after()
            .is_some_and(|after| cycle_position(visual) >= after);
        Snapshot {
            phase: self.clock.phase(),
            mode: self.mode.mode(),
            elapsed_ms,
            display_ms: displayed_ms(visual),
            target_offset_ms: self.variant.target_offset_ms,
            variant: self.variant.variant,
            display_hidden,
            turn_time_left_sec: self.turns.turn_time_left_sec(),
            active_player: self.turns.active(),
            round_index: self.turns.round_index(),
            scores: self.mode.scores(),
            detail: self.mode.detail(elapsed_ms),
            result: self.result,
        }
    }
}
