//! `window.sessionStorage` backend

use super::describe;
use crate::error::{PlaybackError, Result};
use crate::storage::SessionStorage;

/// Session storage of the current browser tab
pub struct BrowserSessionStorage {
    storage: web_sys::Storage,
}

impl BrowserSessionStorage {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| PlaybackError::storage("no window"))?;
        let storage = window
            .session_storage()
            .map_err(|e| PlaybackError::storage(describe(&e)))?
            .ok_or_else(|| PlaybackError::storage("sessionStorage unavailable"))?;
        Ok(Self { storage })
    }
}

impl SessionStorage for BrowserSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(|e| PlaybackError::storage(describe(&e)))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        // Throws QuotaExceededError when full
        self.storage
            .set_item(key, value)
            .map_err(|e| PlaybackError::storage(describe(&e)))
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|e| PlaybackError::storage(describe(&e)))
    }
}
