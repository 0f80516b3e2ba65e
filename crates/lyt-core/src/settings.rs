use serde::{Deserialize, Serialize};

use crate::constants::{DEBOUNCE_WITH_NOTICE_MS, DEBOUNCE_WITHOUT_NOTICE_MS};

/// How many layouts may be active at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryMode {
    /// Exactly one layout is loaded; activity changes switch it.
    #[default]
    Single,
    /// One layout per running activity set, plus the master layout.
    Multiple,
}

impl std::fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryMode::Single => write!(f, "single"),
            MemoryMode::Multiple => write!(f, "multiple"),
        }
    }
}

impl std::str::FromStr for MemoryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(MemoryMode::Single),
            "multiple" => Ok(MemoryMode::Multiple),
            other => Err(format!("unknown memory mode '{other}' (expected single|multiple)")),
        }
    }
}

/// Process-wide settings the engine reads and updates.
///
/// Owned by the engine while it runs; the embedder persists it between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub memory_mode: MemoryMode,
    /// Current layout in Single mode, and the last switch target in Multiple mode.
    #[serde(default)]
    pub current_layout: String,
    /// Most recent switch target that had no activity assignment.
    #[serde(default)]
    pub last_non_assigned_layout: String,
    #[serde(default = "default_show_info_window")]
    pub show_info_window: bool,
}

fn default_show_info_window() -> bool {
    true
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            memory_mode: MemoryMode::Single,
            current_layout: String::new(),
            last_non_assigned_layout: String::new(),
            show_info_window: default_show_info_window(),
        }
    }
}

impl EngineSettings {
    /// Debounce interval for dynamic switching. Longer when the pre-switch
    /// notice is shown so it can render before the switch commits.
    pub fn debounce_interval_ms(&self) -> u64 {
        if self.show_info_window {
            DEBOUNCE_WITH_NOTICE_MS
        } else {
            DEBOUNCE_WITHOUT_NOTICE_MS
        }
    }

    pub fn last_non_assigned(&self) -> Option<&str> {
        if self.last_non_assigned_layout.is_empty() {
            None
        } else {
            Some(&self.last_non_assigned_layout)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("Single".parse::<MemoryMode>().unwrap(), MemoryMode::Single);
        assert_eq!(" multiple ".parse::<MemoryMode>().unwrap(), MemoryMode::Multiple);
        assert!("both".parse::<MemoryMode>().is_err());
    }

    #[test]
    fn test_debounce_interval_longer_with_notice() {
        let mut s = EngineSettings::default();
        s.show_info_window = true;
        let with = s.debounce_interval_ms();
        s.show_info_window = false;
        assert!(with > s.debounce_interval_ms());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let s: EngineSettings = serde_json::from_str(r#"{"current_layout":"Work"}"#).unwrap();
        assert_eq!(s.memory_mode, MemoryMode::Single);
        assert!(s.show_info_window);
        assert_eq!(s.last_non_assigned(), None);
    }
}
