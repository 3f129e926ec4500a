//! Pending-callback queue
//!
//! Timers are plain data: the session polls `pop_due` from its frame callback
//! and dispatches on the returned kind. Game-time timers are measured on the
//! game clock, so a pause holds them exactly where they were. `cancel_all`
//! bumps the generation, and tokens from an older generation never match.

/// Handle for one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    id: u64,
    generation: u32,
}

impl TimerToken {
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Which clock a timer's deadline is measured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeBase {
    /// Monotonic real time; keeps running through pauses
    Wall,
    /// Game clock elapsed; frozen while paused
    Game,
}

#[derive(Debug, Clone)]
struct Pending<K> {
    token: TimerToken,
    base: TimeBase,
    due_ms: f64,
    kind: K,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    pending: Vec<Pending<K>>,
    next_id: u64,
    generation: u32,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
            generation: 0,
        }
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `kind` to fire `delay_ms` after `now` on the given base
    pub fn after(&mut self, base: TimeBase, now: f64, delay_ms: f64, kind: K) -> TimerToken {
        let token = TimerToken {
            id: self.next_id,
            generation: self.generation,
        };
        self.next_id += 1;
        self.pending.push(Pending {
            token,
            base,
            due_ms: now + delay_ms.max(0.0),
            kind,
        });
        token
    }

    pub fn is_live(&self, token: TimerToken) -> bool {
        token.generation == self.generation && self.pending.iter().any(|p| p.token == token)
    }

    /// Drop one timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.token != token);
        self.pending.len() != before
    }

    /// Drop every timer whose kind matches
    pub fn cancel_where(&mut self, mut matches: impl FnMut(&K) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !matches(&p.kind));
        before - self.pending.len()
    }

    /// Tear everything down and invalidate outstanding tokens
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Remove and return the most overdue timer, if any is due
    pub fn pop_due(&mut self, wall_now: f64, game_now: f64) -> Option<(TimerToken, K)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                let now = match p.base {
                    TimeBase::Wall => wall_now,
                    TimeBase::Game => game_now,
                };
                p.due_ms <= now
            })
            .min_by(|(_, a), (_, b)| {
                a.base
                    .cmp(&b.base)
                    .then(a.due_ms.total_cmp(&b.due_ms))
                    .then(a.token.id.cmp(&b.token.id))
            })
            .map(|(i, _)| i)?;
        let fired = self.pending.remove(idx);
        Some((fired.token, fired.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        A,
        B,
        C,
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut q = TimerQueue::new();
        q.after(TimeBase::Game, 0.0, 300.0, Kind::A);
        q.after(TimeBase::Game, 0.0, 100.0, Kind::B);
        assert_eq!(q.pop_due(1_000.0, 50.0), None);
        assert_eq!(q.pop_due(1_000.0, 500.0).map(|(_, k)| k), Some(Kind::B));
        assert_eq!(q.pop_due(1_000.0, 500.0).map(|(_, k)| k), Some(Kind::A));
        assert!(q.is_empty());
    }

    #[test]
    fn test_bases_are_independent() {
        let mut q = TimerQueue::new();
        q.after(TimeBase::Wall, 0.0, 1_000.0, Kind::A);
        q.after(TimeBase::Game, 0.0, 1_000.0, Kind::B);
        // Game clock paused at 200 while wall time moves on
        assert_eq!(q.pop_due(5_000.0, 200.0).map(|(_, k)| k), Some(Kind::A));
        assert_eq!(q.pop_due(9_000.0, 200.0), None);
        assert_eq!(q.pop_due(9_000.0, 1_000.0).map(|(_, k)| k), Some(Kind::B));
    }

    #[test]
    fn test_cancel_and_generation() {
        let mut q = TimerQueue::new();
        let a = q.after(TimeBase::Game, 0.0, 10.0, Kind::A);
        q.after(TimeBase::Game, 0.0, 10.0, Kind::B);
        q.after(TimeBase::Game, 0.0, 10.0, Kind::C);
        assert!(q.is_live(a));
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.cancel_where(|k| *k == Kind::B), 1);
        let c = q.after(TimeBase::Game, 0.0, 10.0, Kind::C);
        q.cancel_all();
        assert!(!q.is_live(c));
        assert_eq!(q.pop_due(100.0, 100.0), None);
        let d = q.after(TimeBase::Game, 0.0, 10.0, Kind::A);
        assert_eq!(d.generation(), 1);
    }
}
