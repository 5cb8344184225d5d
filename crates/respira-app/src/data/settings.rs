//! Application settings management
//!
//! User preferences and remembered state.

use crate::data::storage;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Settings data file name
const SETTINGS_FILE: &str = "settings.json";

/// Settings file format version for migrations
const SETTINGS_VERSION: u32 = 1;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// File format version
    #[serde(default = "default_version")]
    pub version: u32,

    // === Audio ===
    /// Master volume (0.0 - 2.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Play the ambient bed during sessions
    #[serde(default = "default_true")]
    pub ambient: bool,

    /// Force-stop in-flight cue audio when the session is paused
    #[serde(default)]
    pub stop_cues_on_pause: bool,

    // === Breathing ===
    /// Preset to start with
    #[serde(default = "default_pattern")]
    pub default_pattern: String,

    // === Remembered state ===
    /// Last mood the user picked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_mood: Option<String>,

    /// Last phrase category shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_category: Option<String>,

    // === Endpoints ===
    /// Base URL for per-user profile records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalization_base: Option<String>,

    /// Base URL of the external auth plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_base: Option<String>,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_volume() -> f32 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    "box".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            volume: default_volume(),
            ambient: true,
            stop_cues_on_pause: false,
            default_pattern: default_pattern(),
            last_mood: None,
            last_category: None,
            personalization_base: None,
            auth_base: None,
        }
    }
}

impl Settings {
    /// Load settings from default storage location, falling back to defaults
    pub fn load() -> Result<Self> {
        match storage::load::<Settings>(SETTINGS_FILE)? {
            Some(settings) => Ok(settings),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        match storage::load_from::<Settings>(path)? {
            Some(settings) => Ok(settings),
            None => Ok(Self::default()),
        }
    }

    /// Save settings to default storage location
    pub fn save(&self) -> Result<()> {
        storage::save(SETTINGS_FILE, self)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        storage::save_to(path, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_path() -> std::path::PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        temp_dir().join(format!("respira_settings_test_{}.json", id))
    }

    #[test]
    fn defaults_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.volume, 0.8);
        assert!(s.ambient);
        assert!(!s.stop_cues_on_pause);
        assert_eq!(s.default_pattern, "box");
        assert!(s.last_mood.is_none());
    }

    #[test]
    fn load_nonexistent_gives_defaults() {
        let s = Settings::load_from(&temp_path()).unwrap();
        assert_eq!(s.default_pattern, "box");
    }

    #[test]
    fn save_and_load_roundtrip() {
        let path = temp_path();

        let mut s = Settings::default();
        s.volume = 0.5;
        s.default_pattern = "478".to_string();
        s.last_mood = Some("calma".to_string());
        s.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.volume, 0.5);
        assert_eq!(loaded.default_pattern, "478");
        assert_eq!(loaded.last_mood.as_deref(), Some("calma"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let path = temp_path();
        fs::write(&path, r#"{"volume": 0.3}"#).unwrap();

        let s = Settings::load_from(&path).unwrap();
        assert_eq!(s.volume, 0.3);
        assert_eq!(s.default_pattern, "box");
        assert!(s.ambient);

        let _ = fs::remove_file(&path);
    }
}
