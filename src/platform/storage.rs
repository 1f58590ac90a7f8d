//! JSON values in LocalStorage
//!
//! Native builds have no storage: loads miss and saves are dropped.

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Load and decode the value under `key`. Missing or unreadable values are `None`.
pub fn load_json<T: DeserializeOwned>(key: &str) -> Option<T> {
    decode(key, &read(key)?)
}

/// Encode `value` and store it under `key`
pub fn save_json<T: Serialize>(key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => write(key, &json),
        Err(e) => log::warn!("Could not encode {key}: {e}"),
    }
}

fn decode<T: DeserializeOwned>(key: &str, json: &str) -> Option<T> {
    match serde_json::from_str(json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring unreadable {key}: {e}");
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok()).flatten()
}

#[cfg(target_arch = "wasm32")]
fn read(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

#[cfg(target_arch = "wasm32")]
fn write(key: &str, json: &str) {
    if let Some(storage) = local_storage() {
        if let Err(e) = storage.set_item(key, json) {
            log::warn!("Could not save {key}: {e:?}");
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read(_key: &str) -> Option<String> {
    None
}

#[cfg(not(target_arch = "wasm32"))]
fn write(_key: &str, _json: &str) {}
