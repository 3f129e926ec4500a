//! Simulated opponent
//!
//! The bot does not watch the clock. After its reaction delay it invents a
//! timing error whose spread depends on accuracy and feeds it to the same
//! resolver a human action goes through.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::timers::{TimeBase, TimerQueue, TimerToken};

/// How quickly and how precisely the bot plays
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    pub reaction_delay_ms: f64,
    /// 0.0 (hopeless) to 1.0 (sharp)
    pub accuracy: f64,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self {
            reaction_delay_ms: 900.0,
            accuracy: 0.6,
        }
    }
}

impl BotProfile {
    /// Largest error the bot can produce on this attempt
    pub fn max_error_ms<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.accuracy >= 0.9 {
            rng.random_range(25.0..=40.0)
        } else if self.accuracy >= 0.7 {
            rng.random_range(50.0..=150.0)
        } else if self.accuracy >= 0.5 {
            rng.random_range(200.0..=300.0)
        } else {
            700.0
        }
    }

    pub fn sample_error<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let max = self.max_error_ms(rng);
        rng.random_range(0.0..=max)
    }
}

/// Tracks at most one scheduled move
#[derive(Debug, Clone, Default)]
pub struct BotAgent {
    profile: BotProfile,
    pending: Option<TimerToken>,
}

impl BotAgent {
    pub fn new(profile: BotProfile) -> Self {
        Self {
            profile,
            pending: None,
        }
    }

    pub fn profile(&self) -> BotProfile {
        self.profile
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Schedule a move on the game clock. Any earlier move is cancelled first.
    pub fn schedule_move<K: Copy>(&mut self, timers: &mut TimerQueue<K>, game_now: f64, kind: K) -> TimerToken {
        self.cancel(timers);
        let token = timers.after(TimeBase::Game, game_now, self.profile.reaction_delay_ms, kind);
        self.pending = Some(token);
        token
    }

    /// Abort the pending move, if any
    pub fn cancel<K: Copy>(&mut self, timers: &mut TimerQueue<K>) -> bool {
        match self.pending.take() {
            Some(token) => timers.cancel(token),
            None => false,
        }
    }

    /// Claim a fired timer. Only the currently pending token is accepted.
    pub fn claim(&mut self, token: TimerToken) -> bool {
        if self.pending == Some(token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Forget the pending move without touching the queue (queue was torn down)
    pub fn forget(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_error_tiers() {
        let mut rng = Pcg32::seed_from_u64(3);
        let tiers = [(0.95, 40.0), (0.75, 150.0), (0.55, 300.0), (0.1, 700.0)];
        for (accuracy, bound) in tiers {
            let profile = BotProfile {
                reaction_delay_ms: 0.0,
                accuracy,
            };
            for _ in 0..500 {
                let err = profile.sample_error(&mut rng);
                assert!((0.0..=bound).contains(&err), "{accuracy}: {err}");
            }
        }
    }

    #[test]
    fn test_sharper_bot_is_closer_on_average() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mean = |accuracy: f64, rng: &mut Pcg32| {
            let profile = BotProfile {
                reaction_delay_ms: 0.0,
                accuracy,
            };
            (0..1000).map(|_| profile.sample_error(rng)).sum::<f64>() / 1000.0
        };
        assert!(mean(0.95, &mut rng) < mean(0.6, &mut rng));
    }

    #[test]
    fn test_schedule_and_claim() {
        let mut timers: TimerQueue<u8> = TimerQueue::new();
        let mut bot = BotAgent::new(BotProfile {
            reaction_delay_ms: 500.0,
            accuracy: 0.8,
        });
        let token = bot.schedule_move(&mut timers, 1_000.0, 7);
        assert_eq!(timers.pop_due(0.0, 1_499.0), None);
        let (fired, kind) = timers.pop_due(0.0, 1_500.0).unwrap();
        assert_eq!((fired, kind), (token, 7));
        assert!(bot.claim(fired));
        assert!(!bot.claim(fired));
    }

    #[test]
    fn test_cancelled_move_never_fires() {
        let mut timers: TimerQueue<u8> = TimerQueue::new();
        let mut bot = BotAgent::new(BotProfile::default());
        let stale = bot.schedule_move(&mut timers, 0.0, 1);
        let fresh = bot.schedule_move(&mut timers, 0.0, 2);
        assert!(!timers.is_live(stale));
        assert!(!bot.claim(stale));
        assert!(bot.cancel(&mut timers));
        assert!(!timers.is_live(fresh));
        assert_eq!(timers.pop_due(0.0, 10_000.0), None);
    }
}
