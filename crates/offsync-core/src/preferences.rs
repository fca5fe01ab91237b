// ── User preferences ──
//
// Two small keys that live beside the cache in the same key-value store.
// Reads never fail: a missing or unreadable value is the default.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::persist::KvError;
use crate::source::KeyValueStore;

const TUTORIAL_COMPLETED_KEY: &str = "tutorial_completed";
const ACCESSIBILITY_KEY: &str = "accessibility_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilitySettings {
    /// Text scale multiplier; `1.0` is the platform default.
    pub font_scale: f32,
    pub high_contrast: bool,
    pub reduce_motion: bool,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            font_scale: 1.0,
            high_contrast: false,
            reduce_motion: false,
        }
    }
}

pub struct Preferences {
    kv: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn tutorial_completed(&self) -> bool {
        self.read_json(TUTORIAL_COMPLETED_KEY).await.unwrap_or(false)
    }

    pub async fn set_tutorial_completed(&self, completed: bool) -> Result<(), KvError> {
        self.write_json(TUTORIAL_COMPLETED_KEY, &completed).await
    }

    pub async fn accessibility(&self) -> AccessibilitySettings {
        self.read_json(ACCESSIBILITY_KEY).await.unwrap_or_default()
    }

    pub async fn set_accessibility(&self, settings: &AccessibilitySettings) -> Result<(), KvError> {
        self.write_json(ACCESSIBILITY_KEY, settings).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.kv.read(key).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                warn!(key, error = %e, "preference read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed preference");
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let bytes = serde_json::to_vec(value).map_err(KvError::Encode)?;
        self.kv.write(key, &bytes).await
    }
}
