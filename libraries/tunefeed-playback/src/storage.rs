//! Ephemeral per-tab persistence
//!
//! Mirrors the session into the browser's `sessionStorage` so a full reload
//! can restore the active video, its placement and its transport state.
//!
//! Keys:
//! - `videoPlayerState`: JSON `{activeVideo, isMinimized, playback}`
//! - `videoTime_<videoRef>`: last known time of one video, as a plain number

use crate::error::{PlaybackError, Result};
use crate::types::{ActiveVideo, Playback, PlaybackState};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use tunefeed_core::VideoRef;

/// Key holding the serialized session
pub const STATE_KEY: &str = "videoPlayerState";

/// Prefix of the per-video time keys
pub const VIDEO_TIME_PREFIX: &str = "videoTime_";

/// Key holding the last known time of `video_ref`
pub fn video_time_key(video_ref: &VideoRef) -> String {
    format!("{VIDEO_TIME_PREFIX}{video_ref}")
}

/// Parse a stored per-video time
///
/// Returns `None` for anything that is not a finite, non-negative number.
pub fn parse_video_time(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|time| time.is_finite() && *time >= 0.0)
}

/// String key-value store scoped to one browser tab
pub trait SessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// In-memory session storage
///
/// Clones share the same backing map, like two references to the same
/// `window.sessionStorage`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.borrow().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Copy of every stored item
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.items.borrow().clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Persisted form of [`PlaybackState`]
///
/// `is_navigating` is transient and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub active_video: Option<ActiveVideo>,
    pub is_minimized: bool,
    pub playback: Playback,
}

impl PersistedState {
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild the live state
    pub fn into_state(self) -> PlaybackState {
        let is_minimized = self.active_video.is_some() && self.is_minimized;
        PlaybackState {
            active_video: self.active_video,
            is_minimized,
            is_navigating: false,
            playback: Playback {
                volume: self.playback.volume.min(100),
                ..self.playback
            },
        }
    }
}

impl From<&PlaybackState> for PersistedState {
    fn from(state: &PlaybackState) -> Self {
        Self {
            active_video: state.active_video.clone(),
            is_minimized: state.is_minimized,
            playback: state.playback.clone(),
        }
    }
}

/// Load the persisted session, if any
pub fn load_state(storage: &dyn SessionStorage) -> Result<Option<PlaybackState>> {
    match storage.get_item(STATE_KEY)? {
        Some(json) => Ok(Some(PersistedState::decode(&json)?.into_state())),
        None => Ok(None),
    }
}

/// Persist the session
///
/// Nothing is kept while no video is active.
pub fn save_state(storage: &mut dyn SessionStorage, state: &PlaybackState) -> Result<()> {
    if state.active_video.is_none() {
        return storage.remove_item(STATE_KEY);
    }
    let json = PersistedState::from(state).encode()?;
    storage.set_item(STATE_KEY, &json)
}

/// Load the last known time of `video_ref`
pub fn load_video_time(storage: &dyn SessionStorage, video_ref: &VideoRef) -> Result<Option<f64>> {
    Ok(storage
        .get_item(&video_time_key(video_ref))?
        .as_deref()
        .and_then(parse_video_time))
}

/// Store the last known time of `video_ref`
pub fn save_video_time(
    storage: &mut dyn SessionStorage,
    video_ref: &VideoRef,
    seconds: f64,
) -> Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(PlaybackError::storage(format!(
            "refusing to store time {seconds} for {video_ref}"
        )));
    }
    storage.set_item(&video_time_key(video_ref), &seconds.to_string())
}

/// Remove the session and the per-video time of `video_ref`
pub fn clear_state(storage: &mut dyn SessionStorage, video_ref: Option<&VideoRef>) -> Result<()> {
    storage.remove_item(STATE_KEY)?;
    if let Some(video_ref) = video_ref {
        storage.remove_item(&video_time_key(video_ref))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunefeed_core::PostRef;

    fn active_state() -> PlaybackState {
        PlaybackState {
            active_video: Some(ActiveVideo::new(
                VideoRef::new("dQw4w9WgXcQ"),
                PostRef::new("7"),
            )),
            is_minimized: true,
            is_navigating: true,
            playback: Playback {
                is_playing: true,
                current_time_seconds: 42.5,
                volume: 80,
            },
        }
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = PersistedState::from(&active_state()).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["activeVideo"]["videoRef"], "dQw4w9WgXcQ");
        assert_eq!(value["activeVideo"]["ownerPostRef"], "7");
        assert_eq!(value["isMinimized"], true);
        assert_eq!(value["playback"]["currentTimeSeconds"], 42.5);
        assert!(value.get("isNavigating").is_none());
    }

    #[test]
    fn save_then_load_drops_navigating_flag() {
        let mut storage = MemoryStorage::new();
        let state = active_state();
        save_state(&mut storage, &state).unwrap();

        let loaded = load_state(&storage).unwrap().unwrap();
        assert!(!loaded.is_navigating);
        assert_eq!(loaded.active_video, state.active_video);
        assert_eq!(loaded.playback, state.playback);
        assert!(loaded.is_minimized);
    }

    #[test]
    fn minimized_without_video_is_dropped_on_load() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(
                STATE_KEY,
                r#"{"activeVideo":null,"isMinimized":true,"playback":{"isPlaying":false,"currentTimeSeconds":0.0,"volume":100}}"#,
            )
            .unwrap();

        let loaded = load_state(&storage).unwrap().unwrap();
        assert!(!loaded.is_minimized);
    }

    #[test]
    fn saving_empty_state_removes_key() {
        let mut storage = MemoryStorage::new();
        save_state(&mut storage, &active_state()).unwrap();
        save_state(&mut storage, &PlaybackState::default()).unwrap();
        assert!(!storage.contains_key(STATE_KEY));
    }

    #[test]
    fn corrupt_json_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.set_item(STATE_KEY, "{not json").unwrap();
        assert!(matches!(
            load_state(&storage),
            Err(PlaybackError::Serialization(_))
        ));
    }

    #[test]
    fn video_times() {
        let mut storage = MemoryStorage::new();
        let video = VideoRef::new("dQw4w9WgXcQ");

        save_video_time(&mut storage, &video, 12.25).unwrap();
        assert!(storage.contains_key("videoTime_dQw4w9WgXcQ"));
        assert_eq!(load_video_time(&storage, &video).unwrap(), Some(12.25));

        assert!(save_video_time(&mut storage, &video, f64::NAN).is_err());
        assert_eq!(parse_video_time("-3"), None);
        assert_eq!(parse_video_time(" 7 "), Some(7.0));

        clear_state(&mut storage, Some(&video)).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn clones_share_items() {
        let mut storage = MemoryStorage::new();
        let view = storage.clone();
        storage.set_item("a", "1").unwrap();
        assert_eq!(view.get_item("a").unwrap().as_deref(), Some("1"));
    }
}
