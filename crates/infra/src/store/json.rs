//! Typed JSON documents on top of [`KeyValueStore`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use super::kv_store::KeyValueStore;

/// Read and decode the document under `key`.
///
/// A missing key and an undecodable value both yield `None`; the latter is
/// logged so a corrupted entry does not take the terminal down.
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "discarding undecodable stored value");
            None
        }
    }
}

/// Encode `value` and store it under `key`.
pub fn save_json<T, S>(store: &S, key: &str, value: &T)
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, raw),
        Err(err) => error!(key, error = %err, "failed to encode value for store"),
    }
}
