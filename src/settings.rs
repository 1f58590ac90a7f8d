//! Player preferences
//!
//! Persisted separately from scores in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::platform::storage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Music preference, shown on the HUD toggle
    pub music_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { music_on: true }
    }
}

impl Settings {
    const STORAGE_KEY: &'static str = "kiss_cam_settings";

    /// Flip the music preference and persist it. Returns the new value.
    pub fn toggle_music(&mut self) -> bool {
        self.music_on = !self.music_on;
        log::info!("Music {}", if self.music_on { "on" } else { "off" });
        self.save();
        self.music_on
    }

    /// HUD label and colour for the music indicator
    pub fn music_label(&self) -> (&'static str, &'static str) {
        if self.music_on {
            ("♪ ON", "#FFD700")
        } else {
            ("♪ OFF", "#666")
        }
    }

    /// Saved settings, or the defaults
    pub fn load() -> Self {
        storage::load_json(Self::STORAGE_KEY).unwrap_or_else(|| {
            log::info!("Using default settings");
            Self::default()
        })
    }

    pub fn save(&self) {
        storage::save_json(Self::STORAGE_KEY, self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_music_defaults_on_and_toggles() {
        let mut settings = Settings::default();
        assert!(settings.music_on);
        assert_eq!(settings.music_label(), ("♪ ON", "#FFD700"));

        assert!(!settings.toggle_music());
        assert_eq!(settings.music_label(), ("♪ OFF", "#666"));
        assert!(settings.toggle_music());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
        let settings: Settings = serde_json::from_str(r#"{"music_on":false}"#).unwrap();
        assert!(!settings.music_on);
    }

    #[test]
    fn test_load_without_storage_uses_defaults() {
        Settings { music_on: false }.save();
        assert_eq!(Settings::load(), Settings::default());
    }
}
