//! On-disk format of a single layout.
//!
//! ```toml
//! activities = ["work", "research"]
//! show_in_menu = true
//! last_used_activity = "work"
//! shared_layout = "Panels"
//!
//! [[containments]]
//! id = "5f1c..."
//! plugin = "panel"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use lyt_core::LayoutDefinition;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const LAYOUT_SUFFIX: &str = ".layout.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentEntry {
    pub id: String,
    #[serde(default)]
    pub plugin: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutFile {
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default = "default_show_in_menu")]
    pub show_in_menu: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_layout: Option<String>,
    #[serde(default)]
    pub containments: Vec<ContainmentEntry>,
}

fn default_show_in_menu() -> bool {
    true
}

impl Default for LayoutFile {
    fn default() -> Self {
        Self {
            activities: Vec::new(),
            show_in_menu: true,
            last_used_activity: None,
            shared_layout: None,
            containments: Vec::new(),
        }
    }
}

impl LayoutFile {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn containment_ids(&self) -> Vec<String> {
        self.containments.iter().map(|c| c.id.clone()).collect()
    }

    pub fn to_definition(&self, name: &str, path: PathBuf) -> LayoutDefinition {
        LayoutDefinition {
            name: name.to_string(),
            path,
            activities: self.activities.clone(),
            show_in_menu: self.show_in_menu,
            last_used_activity: self.last_used_activity.clone(),
            shared_layout: self.shared_layout.clone(),
        }
    }
}

/// Layout name encoded in a file name, if it is a layout file.
pub fn layout_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    file_name
        .strip_suffix(LAYOUT_SUFFIX)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let file: LayoutFile = toml::from_str("").unwrap();
        assert_eq!(file, LayoutFile::default());
        assert!(file.show_in_menu);
    }

    #[test]
    fn test_parse_full_file() {
        let file: LayoutFile = toml::from_str(
            r#"
            activities = ["a1", "a2"]
            show_in_menu = false
            last_used_activity = "a2"
            shared_layout = "Panels"

            [[containments]]
            id = "c1"
            plugin = "panel"

            [[containments]]
            id = "c2"
            "#,
        )
        .unwrap();

        assert_eq!(file.activities, vec!["a1", "a2"]);
        assert!(!file.show_in_menu);
        assert_eq!(file.shared_layout.as_deref(), Some("Panels"));
        assert_eq!(file.containment_ids(), vec!["c1", "c2"]);
        assert_eq!(file.containments[1].plugin, "");
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Work.layout.toml");
        let file = LayoutFile {
            activities: vec!["a1".into()],
            last_used_activity: Some("a1".into()),
            containments: vec![ContainmentEntry {
                id: "c1".into(),
                plugin: "panel".into(),
            }],
            ..LayoutFile::default()
        };
        file.write(&path).unwrap();
        assert_eq!(LayoutFile::read(&path).unwrap(), file);
    }

    #[test]
    fn test_layout_name_from_path() {
        assert_eq!(
            layout_name(Path::new("/d/My Layout.layout.toml")).as_deref(),
            Some("My Layout")
        );
        assert_eq!(
            layout_name(Path::new("/d/.multiple-layouts.layout.toml")).as_deref(),
            Some(".multiple-layouts")
        );
        assert_eq!(layout_name(Path::new("/d/notes.txt")), None);
        assert_eq!(layout_name(Path::new("/d/.layout.toml")), None);
    }
}
