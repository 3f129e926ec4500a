//! LocalStorage helpers
//!
//! Values are stored as JSON under a fixed key. Native builds have no
//! persistent store: reads find nothing and writes report `Unavailable`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ScoreboardError;

/// Read and decode a stored value. Missing or corrupt entries read as `None`.
#[cfg(target_arch = "wasm32")]
pub fn load<T: DeserializeOwned>(key: &str) -> Option<T> {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()?;
    let json = storage.get_item(key).ok().flatten()?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Discarding unreadable {key}: {e}");
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn save<T: Serialize>(key: &str, value: &T) -> Result<(), ScoreboardError> {
    let storage = web_sys::window()
        .and_then(|w| w.local_storage().ok())
        .flatten()
        .ok_or(ScoreboardError::Unavailable)?;
    let json = serde_json::to_string(value)?;
    storage
        .set_item(key, &json)
        .map_err(|_| ScoreboardError::Rejected(format!("could not write {key}")))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load<T: DeserializeOwned>(_key: &str) -> Option<T> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save<T: Serialize>(_key: &str, _value: &T) -> Result<(), ScoreboardError> {
    Err(ScoreboardError::Unavailable)
}
