//! Persisted view preferences.
//!
//! The display timezone, granularity, and resource selection survive across
//! sessions as TOML at `~/.config/timegrid/config.toml`. The engine itself
//! only ever sees resolved values; reading and writing the file happens out
//! here, behind [`PreferencesStore`], never inside a render cycle.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{TimeGridError, TimeGridResult};
use crate::tz::SYSTEM_TIMEZONE;
use crate::window::Granularity;

fn default_timezone() -> String {
    SYSTEM_TIMEZONE.to_string()
}

/// View preferences as stored on disk. Everything has a default so a
/// missing or partial file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewPreferences {
    /// Display timezone id, or the `"system"` sentinel.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    #[serde(default)]
    pub granularity: Granularity,

    /// Resource ids deselected by the user. Stored inverted so newly
    /// appearing resources default to visible.
    #[serde(default)]
    pub hidden_resources: Vec<String>,

    /// Where the ICS event directory lives. `None` means `~/calendar`.
    #[serde(default)]
    pub calendar_dir: Option<PathBuf>,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        ViewPreferences {
            timezone: default_timezone(),
            granularity: Granularity::default(),
            hidden_resources: Vec::new(),
            calendar_dir: None,
        }
    }
}

/// Loads and saves [`ViewPreferences`] at a fixed path.
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    /// Store at `~/.config/timegrid/config.toml`.
    pub fn default_location() -> TimeGridResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TimeGridError::Config("Could not determine config directory".into()))?
            .join("timegrid");
        Ok(PreferencesStore {
            path: config_dir.join("config.toml"),
        })
    }

    /// Store at an explicit path (used by tests).
    pub fn at(path: &Path) -> Self {
        PreferencesStore {
            path: path.to_path_buf(),
        }
    }

    /// Load preferences; a missing file yields the defaults.
    pub fn load(&self) -> TimeGridResult<ViewPreferences> {
        if !self.path.exists() {
            return Ok(ViewPreferences::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        toml::from_str(&raw)
            .map_err(|e| TimeGridError::Config(format!("Invalid preferences file: {}", e)))
    }

    pub fn save(&self, prefs: &ViewPreferences) -> TimeGridResult<()> {
        let content = toml::to_string_pretty(prefs)
            .map_err(|e| TimeGridError::Serialization(e.to_string()))?;

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        // Write-then-rename so a crash never leaves a torn file
        let temp = self.path.with_extension("toml.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::at(&dir.path().join("config.toml"));

        let prefs = store.load().unwrap();
        assert_eq!(prefs, ViewPreferences::default());
        assert_eq!(prefs.timezone, "system");
        assert_eq!(prefs.granularity, Granularity::Week);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferencesStore::at(&dir.path().join("config.toml"));

        let prefs = ViewPreferences {
            timezone: "Europe/Stockholm".to_string(),
            granularity: Granularity::Day,
            hidden_resources: vec!["personal".to_string()],
            calendar_dir: Some(PathBuf::from("/tmp/calendars")),
        };
        store.save(&prefs).unwrap();

        assert_eq!(store.load().unwrap(), prefs);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timezone = \"Asia/Tokyo\"\n").unwrap();

        let prefs = PreferencesStore::at(&path).load().unwrap();
        assert_eq!(prefs.timezone, "Asia/Tokyo");
        assert_eq!(prefs.granularity, Granularity::Week);
        assert!(prefs.hidden_resources.is_empty());
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "granularity = 7\n").unwrap();

        let err = PreferencesStore::at(&path).load().unwrap_err();
        assert!(matches!(err, TimeGridError::Config(_)));
    }
}
