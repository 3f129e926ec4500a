//! Time sources
//!
//! The core never reads a global clock. Everything goes through a
//! `TimeSource` so the session can be driven by real time in a browser or
//! natively, and by a hand-cranked clock in tests.

use std::cell::Cell;
use std::rc::Rc;

pub trait TimeSource {
    /// Monotonic milliseconds from an arbitrary origin
    fn now_ms(&self) -> f64;

    /// Milliseconds since the Unix epoch. Shared across devices, so it seeds
    /// anything several observers must agree on (unstable wobble, room time).
    fn epoch_ms(&self) -> f64;
}

/// Native time: `Instant` for the game clock, `SystemTime` for epoch
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn epoch_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Browser time: `performance.now()` and `Date.now()`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserTime;

#[cfg(target_arch = "wasm32")]
impl TimeSource for BrowserTime {
    fn now_ms(&self) -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_else(js_sys::Date::now)
    }

    fn epoch_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// Hand-driven clock. Clones share the same time, so a test keeps one handle
/// and gives the other to the session.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
    epoch_origin: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch reading corresponding to `now_ms() == 0`
    pub fn with_epoch(epoch_origin_ms: f64) -> Self {
        let time = Self::default();
        time.epoch_origin.set(epoch_origin_ms);
        time
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }

    fn epoch_ms(&self) -> f64 {
        self.epoch_origin.get() + self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_time_is_shared() {
        let time = ManualTime::with_epoch(1_000_000.0);
        let handle = time.clone();
        handle.advance(250.0);
        assert_eq!(time.now_ms(), 250.0);
        assert_eq!(time.epoch_ms(), 1_000_250.0);
        handle.set(10.0);
        assert_eq!(time.now_ms(), 10.0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_system_time_moves_forward() {
        let time = SystemTimeSource::new();
        let a = time.now_ms();
        let b = time.now_ms();
        assert!(b >= a);
        assert!(time.epoch_ms() > 1.0e12);
    }
}
