//! High score leaderboard system
//!
//! One top-10 table per mode, persisted to LocalStorage. The session only
//! knows the `Scoreboard` trait, so a remote service can stand in for the
//! local tables.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::ScoreboardError;
use crate::platform::{self, TimeSource, storage};
use crate::sim::state::GameMode;

/// Maximum number of high scores to keep per mode
pub const MAX_HIGH_SCORES: usize = 10;

/// A single leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) when achieved
    pub date: f64,
}

/// Leaderboard collaborator called when a run finishes
pub trait Scoreboard {
    /// Returns whether the score made it onto the board
    fn submit_score(&mut self, mode: GameMode, name: &str, score: u64) -> Result<bool, ScoreboardError>;

    fn fetch_top(&self, mode: GameMode) -> Result<Vec<ScoreRow>, ScoreboardError>;
}

/// One mode's table, sorted by score descending
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<ScoreRow>,
}

impl HighScores {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a row if it qualifies. Returns the rank achieved.
    pub fn add_score(&mut self, name: &str, score: u64, date: f64) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            ScoreRow {
                name: name.to_string(),
                score,
                date,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Per-mode tables in LocalStorage (in memory on native)
pub struct LocalScoreboard {
    tables: BTreeMap<String, HighScores>,
    clock: Box<dyn TimeSource>,
    persistent: bool,
}

impl LocalScoreboard {
    /// LocalStorage key (used only in wasm32)
    const STORAGE_KEY: &'static str = "kick_clock_highscores";

    /// Empty, memory-only board
    pub fn in_memory(clock: Box<dyn TimeSource>) -> Self {
        Self {
            tables: BTreeMap::new(),
            clock,
            persistent: false,
        }
    }

    /// Board backed by LocalStorage. Falls back to memory when storage is
    /// unreachable.
    pub fn load() -> Self {
        let mut board = Self::in_memory(platform::default_time_source());
        board.persistent = cfg!(target_arch = "wasm32");
        match storage::load::<BTreeMap<String, HighScores>>(Self::STORAGE_KEY) {
            Some(tables) => {
                log::info!("Loaded high scores for {} modes", tables.len());
                board.tables = tables;
            }
            None => log::info!("No high scores found, starting fresh"),
        }
        board
    }

    pub fn table(&self, mode: GameMode) -> Option<&HighScores> {
        self.tables.get(mode.as_str())
    }

    pub fn qualifies(&self, mode: GameMode, score: u64) -> bool {
        match self.table(mode) {
            Some(table) => table.qualifies(score),
            None => score > 0,
        }
    }

    pub fn potential_rank(&self, mode: GameMode, score: u64) -> Option<usize> {
        match self.table(mode) {
            Some(table) => table.potential_rank(score),
            None => (score > 0).then_some(1),
        }
    }

    fn save(&self) -> Result<(), ScoreboardError> {
        if !self.persistent {
            return Ok(());
        }
        storage::save(Self::STORAGE_KEY, &self.tables)?;
        log::info!("High scores saved");
        Ok(())
    }
}

impl Scoreboard for LocalScoreboard {
    fn submit_score(&mut self, mode: GameMode, name: &str, score: u64) -> Result<bool, ScoreboardError> {
        let date = self.clock.epoch_ms();
        let rank = self
            .tables
            .entry(mode.as_str().to_string())
            .or_default()
            .add_score(name, score, date);
        match rank {
            Some(rank) => {
                log::info!("{name} placed #{rank} in {} with {score}", mode.as_str());
                self.save()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn fetch_top(&self, mode: GameMode) -> Result<Vec<ScoreRow>, ScoreboardError> {
        Ok(self.table(mode).map(|t| t.entries.clone()).unwrap_or_default())
    }
}

/// Format a timestamp relative to `now` ("3 mins ago", "Yesterday", "4/7/26")
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{days} days ago")
        } else {
            match DateTime::from_timestamp_millis(timestamp as i64) {
                Some(date) => date.format("%-m/%-d/%y").to_string(),
                None => "N/A".to_string(),
            }
        }
    } else if diff_hours >= 1.0 {
        match diff_hours.floor() as i64 {
            1 => "1 hour ago".to_string(),
            hours => format!("{hours} hours ago"),
        }
    } else if diff_mins >= 1.0 {
        match diff_mins.floor() as i64 {
            1 => "1 min ago".to_string(),
            mins => format!("{mins} mins ago"),
        }
    } else {
        "Just now".to_string()
    }
}
