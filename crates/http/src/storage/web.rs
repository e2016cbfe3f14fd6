//! Browser `localStorage` backend

use super::{KeyValueStore, StorageError};
use web_sys::Storage;

/// Reads and writes `window.localStorage`
///
/// The handle is looked up on every call so the type stays `Send + Sync`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .ok_or_else(|| StorageError::Unavailable("localStorage is not accessible".into()))
    }
}

fn js_error(context: &str) -> StorageError {
    StorageError::Unavailable(format!("localStorage {context} failed"))
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::storage()?.get_item(key).map_err(|_| js_error("read"))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|_| js_error("write"))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key)
            .map_err(|_| js_error("remove"))
    }
}
