//! Player settings and preferences
//!
//! Passed into a session when it is created instead of living in globals.
//! Persisted separately from high scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::storage;
use crate::sim::bot::BotProfile;
use crate::sim::state::GameMode;
use crate::sim::variant::Variant;

/// Bot strength presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
    Pro,
}

impl BotDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotDifficulty::Easy => "Easy",
            BotDifficulty::Normal => "Normal",
            BotDifficulty::Hard => "Hard",
            BotDifficulty::Pro => "Pro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(BotDifficulty::Easy),
            "normal" | "medium" => Some(BotDifficulty::Normal),
            "hard" => Some(BotDifficulty::Hard),
            "pro" | "expert" => Some(BotDifficulty::Pro),
            _ => None,
        }
    }

    /// Reaction delay and accuracy for this preset
    pub fn profile(&self) -> BotProfile {
        let (reaction_delay_ms, accuracy) = match self {
            BotDifficulty::Easy => (1200.0, 0.4),
            BotDifficulty::Normal => (900.0, 0.6),
            BotDifficulty::Hard => (700.0, 0.8),
            BotDifficulty::Pro => (500.0, 0.95),
        };
        BotProfile {
            reaction_delay_ms,
            accuracy,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Silences effect playback; the core still emits effect events
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Game ===
    /// Name submitted with leaderboard scores
    pub player_name: String,
    pub bot_difficulty: BotDifficulty,
    pub variant: Variant,
    pub mode: GameMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            muted: false,
            master_volume: 0.8,
            sfx_volume: 1.0,
            player_name: "Player".to_string(),
            bot_difficulty: BotDifficulty::Normal,
            variant: Variant::Classic,
            mode: GameMode::Classic,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "kick_clock_settings";

    /// Volume actually applied to effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Name to submit, never blank
    pub fn display_name(&self) -> &str {
        let name = self.player_name.trim();
        if name.is_empty() { "Player" } else { name }
    }

    /// Load settings from LocalStorage, defaults when absent (always on native)
    pub fn load() -> Self {
        match storage::load(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings from LocalStorage");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to LocalStorage. Best effort.
    pub fn save(&self) {
        match storage::save(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::debug!("Settings not saved: {e}"),
        }
    }
}
