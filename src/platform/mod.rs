//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic clock plus epoch time for cross-device agreement)
//! - Storage (LocalStorage on web, in-memory on native)
//! - The wasm binding the page drives the session through

pub mod storage;
pub mod time;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use time::{ManualTime, TimeSource};
#[cfg(not(target_arch = "wasm32"))]
pub use time::SystemTimeSource;
#[cfg(target_arch = "wasm32")]
pub use time::BrowserTime;

/// Default time source for the current target
pub fn default_time_source() -> Box<dyn TimeSource> {
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(BrowserTime)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Box::new(SystemTimeSource::new())
    }
}
