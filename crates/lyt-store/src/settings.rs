//! Persisted engine settings (`settings.toml`).

use std::fs;
use std::path::Path;

use lyt_core::{EngineSettings, MemoryMode};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Current settings layout version. Files without a version predate the
/// first-run bootstrap.
pub const SETTINGS_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    memory_mode: MemoryMode,
    #[serde(default)]
    current_layout: String,
    #[serde(default)]
    last_non_assigned_layout: String,
    #[serde(default = "default_show_info_window")]
    show_info_window: bool,
}

fn default_show_info_window() -> bool {
    true
}

/// Settings plus the version they were stored with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredSettings {
    pub version: u32,
    pub engine: EngineSettings,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            version: 0,
            engine: EngineSettings::default(),
        }
    }
}

impl StoredSettings {
    /// Read `path`; a missing file yields defaults with version 0.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let file: SettingsFile = toml::from_str(&content)?;
        Ok(Self {
            version: file.version,
            engine: EngineSettings {
                memory_mode: file.memory_mode,
                current_layout: file.current_layout,
                last_non_assigned_layout: file.last_non_assigned_layout,
                show_info_window: file.show_info_window,
            },
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = SettingsFile {
            version: self.version,
            memory_mode: self.engine.memory_mode,
            current_layout: self.engine.current_layout.clone(),
            last_non_assigned_layout: self.engine.last_non_assigned_layout.clone(),
            show_info_window: self.engine.show_info_window,
        };
        fs::write(path, toml::to_string_pretty(&file)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let loaded = StoredSettings::load(&tmp.path().join("settings.toml")).unwrap();
        assert_eq!(loaded, StoredSettings::default());
        assert!(loaded.engine.show_info_window);
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        let settings = StoredSettings {
            version: SETTINGS_VERSION,
            engine: EngineSettings {
                memory_mode: MemoryMode::Multiple,
                current_layout: "Work".into(),
                last_non_assigned_layout: "Home".into(),
                show_info_window: false,
            },
        };
        settings.save(&path).unwrap();
        assert_eq!(StoredSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "memory_mode = \"multiple\"\n").unwrap();

        let loaded = StoredSettings::load(&path).unwrap();
        assert_eq!(loaded.version, 0);
        assert_eq!(loaded.engine.memory_mode, MemoryMode::Multiple);
        assert!(loaded.engine.show_info_window);
        assert_eq!(loaded.engine.current_layout, "");
    }

    #[test]
    fn test_unknown_mode_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.toml");
        fs::write(&path, "memory_mode = \"both\"\n").unwrap();
        assert!(StoredSettings::load(&path).is_err());
    }
}
