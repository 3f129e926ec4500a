//! Browser binding
//!
//! The page owns the animation frame loop and the DOM; it calls `tick` every
//! frame, forwards clicks and key presses to `handle_action`, and renders
//! from `snapshot_json`. Effect events come out of `drain_events_json`.

use wasm_bindgen::prelude::*;

use super::time::BrowserTime;
use crate::error::SyncError;
use crate::highscores::{LocalScoreboard, Scoreboard};
use crate::settings::Settings;
use crate::sim::{ActionReport, ActionResult, GameMode, GameSession, RemoteSnapshot, SyncChannel};
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Kick Clock core loaded");
}

/// Forwards action reports to a JS callback taking one JSON string
struct JsSyncChannel {
    callback: js_sys::Function,
}

impl SyncChannel for JsSyncChannel {
    fn send_action(&mut self, report: &ActionReport) -> Result<(), SyncError> {
        let json = serde_json::to_string(report).map_err(|e| SyncError::Rejected(e.to_string()))?;
        self.callback
            .call1(&JsValue::NULL, &JsValue::from_str(&json))
            .map(|_| ())
            .map_err(|e| SyncError::Rejected(format!("{e:?}")))
    }
}

#[wasm_bindgen]
pub struct WebGame {
    session: GameSession,
    tuning: Tuning,
}

impl WebGame {
    fn build(settings: Settings, tuning: Tuning) -> GameSession {
        let seed = js_sys::Date::now() as u64;
        GameSession::new(settings, tuning, Box::new(BrowserTime), seed)
            .with_scoreboard(Box::new(LocalScoreboard::load()))
    }
}

#[wasm_bindgen]
impl WebGame {
    /// Build a session from stored settings and optional tuning JSON
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> WebGame {
        let tuning = match tuning_json.as_deref().map(Tuning::from_json) {
            Some(Ok(tuning)) => tuning,
            Some(Err(e)) => {
                log::warn!("Ignoring tuning override: {e}");
                Tuning::default()
            }
            None => Tuning::default(),
        };
        let session = Self::build(Settings::load(), tuning.clone());
        WebGame { session, tuning }
    }

    /// Replace the settings (persisted) and start over with them
    pub fn configure(&mut self, settings_json: &str) -> bool {
        match serde_json::from_str::<Settings>(settings_json) {
            Ok(settings) => {
                settings.save();
                self.session.exit();
                self.session = Self::build(settings, self.tuning.clone());
                true
            }
            Err(e) => {
                log::warn!("Bad settings: {e}");
                false
            }
        }
    }

    pub fn start(&mut self) -> bool {
        self.session.start()
    }

    pub fn tick(&mut self) -> f64 {
        self.session.tick()
    }

    /// True when the input produced a shot
    pub fn handle_action(&mut self) -> bool {
        matches!(self.session.handle_action(), ActionResult::Resolved(_))
    }

    pub fn pause(&mut self) -> bool {
        self.session.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.session.resume()
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn exit(&mut self) {
        self.session.exit();
    }

    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_default()
    }

    pub fn drain_events_json(&mut self) -> String {
        serde_json::to_string(&self.session.drain_events()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn apply_remote_json(&mut self, json: &str) -> bool {
        match serde_json::from_str::<RemoteSnapshot>(json) {
            Ok(snapshot) => {
                self.session.apply_remote(&snapshot);
                true
            }
            Err(e) => {
                log::warn!("Dropping malformed room state: {e}");
                false
            }
        }
    }

    pub fn set_clock_offset(&mut self, offset_ms: f64) {
        self.session.set_clock_offset(offset_ms);
    }

    pub fn set_sync_callback(&mut self, callback: js_sys::Function) {
        self.session.set_sync(Some(Box::new(JsSyncChannel { callback })));
    }

    /// Leaderboard rows for a mode as JSON
    pub fn top_scores_json(mode: &str) -> String {
        let Some(mode) = GameMode::from_str(mode) else {
            return "[]".to_string();
        };
        match LocalScoreboard::load().fetch_top(mode) {
            Ok(rows) => serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string()),
            Err(e) => {
                log::warn!("Could not read leaderboard: {e}");
                "[]".to_string()
            }
        }
    }
}
