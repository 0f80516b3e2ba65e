//! The directory holding one TOML file per layout.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use lyt_core::{LayoutDefinition, MULTIPLE_LAYOUTS_NAME};
use regex::Regex;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::layout_file::{ContainmentEntry, LAYOUT_SUFFIX, LayoutFile, layout_name};

static COUNTER_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)-[0-9]+$").unwrap());

#[derive(Clone, Debug)]
pub struct LayoutDirectory {
    root: PathBuf,
}

impl LayoutDirectory {
    /// Open (creating if needed) the directory. The hidden master layout is
    /// created when missing.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", root.display()))
        })?;

        let dir = Self {
            root: root.to_path_buf(),
        };

        let master = dir.path_for(MULTIPLE_LAYOUTS_NAME);
        if !master.exists() {
            let file = LayoutFile {
                show_in_menu: false,
                ..LayoutFile::default()
            };
            file.write(&master)?;
            tracing::info!("created master layout at {}", master.display());
        }

        Ok(dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}{LAYOUT_SUFFIX}"))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Every layout file, sorted by name. Unreadable files come back as
    /// `Err` entries.
    pub fn list(&self) -> Result<Vec<(PathBuf, Result<LayoutDefinition>)>> {
        let mut paths: Vec<(String, PathBuf)> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter_map(|path| layout_name(&path).map(|name| (name, path)))
            .collect();
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|(name, path)| {
                let definition = LayoutFile::read(&path).map(|f| f.to_definition(&name, path.clone()));
                (path, definition)
            })
            .collect())
    }

    /// A name no existing layout uses. A trailing `-N` counter on a taken
    /// name is replaced rather than stacked.
    pub fn unique_layout_name(&self, name: &str) -> String {
        if !self.exists(name) {
            return name.to_string();
        }

        let base = COUNTER_SUFFIX
            .captures(name)
            .and_then(|c| c.get(1))
            .map_or(name, |m| m.as_str());

        let mut counter = 2;
        loop {
            let candidate = format!("{base}-{counter}");
            if !self.exists(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Write a new layout with one fresh containment. Returns the name used.
    pub fn create_layout(
        &self,
        name: &str,
        activities: &[String],
        show_in_menu: bool,
    ) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
            return Err(StoreError::InvalidData(format!(
                "invalid layout name '{name}'"
            )));
        }

        let name = self.unique_layout_name(trimmed);
        let file = LayoutFile {
            activities: activities.to_vec(),
            show_in_menu,
            containments: vec![ContainmentEntry {
                id: Uuid::new_v4().to_string(),
                plugin: "panel".to_string(),
            }],
            ..LayoutFile::default()
        };
        file.write(&self.path_for(&name))?;
        tracing::info!("created layout '{name}'");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> (tempfile::TempDir, LayoutDirectory) {
        let tmp = tempfile::tempdir().unwrap();
        let dir = LayoutDirectory::open(&tmp.path().join("layouts")).unwrap();
        (tmp, dir)
    }

    #[test]
    fn test_open_creates_hidden_master() {
        let (_tmp, dir) = open();
        assert!(dir.exists(MULTIPLE_LAYOUTS_NAME));

        let listed = dir.list().unwrap();
        assert_eq!(listed.len(), 1);
        let master = listed[0].1.as_ref().unwrap();
        assert_eq!(master.name, MULTIPLE_LAYOUTS_NAME);
        assert!(!master.show_in_menu);
    }

    #[test]
    fn test_list_reports_bad_files_individually() {
        let (_tmp, dir) = open();
        dir.create_layout("Work", &["a1".into()], true).unwrap();
        fs::write(dir.path_for("Broken"), "activities = 3").unwrap();
        fs::write(dir.root().join("README"), "not a layout").unwrap();

        let listed = dir.list().unwrap();
        let names: Vec<String> = listed
            .iter()
            .filter_map(|(_, d)| d.as_ref().ok().map(|d| d.name.clone()))
            .collect();
        assert_eq!(names, vec![MULTIPLE_LAYOUTS_NAME, "Work"]);
        assert_eq!(listed.iter().filter(|(_, d)| d.is_err()).count(), 1);
    }

    #[test]
    fn test_unique_layout_name() {
        let (_tmp, dir) = open();
        assert_eq!(dir.unique_layout_name("Work"), "Work");

        dir.create_layout("Work", &[], true).unwrap();
        assert_eq!(dir.unique_layout_name("Work"), "Work-2");

        dir.create_layout("Work", &[], true).unwrap();
        assert!(dir.exists("Work-2"));
        assert_eq!(dir.unique_layout_name("Work-2"), "Work-3");
    }

    #[test]
    fn test_create_layout_writes_containment() {
        let (_tmp, dir) = open();
        let name = dir
            .create_layout("  Home ", &["a1".into()], false)
            .unwrap();
        assert_eq!(name, "Home");

        let file = LayoutFile::read(&dir.path_for("Home")).unwrap();
        assert_eq!(file.activities, vec!["a1"]);
        assert!(!file.show_in_menu);
        assert_eq!(file.containments.len(), 1);
    }

    #[test]
    fn test_create_layout_rejects_paths() {
        let (_tmp, dir) = open();
        assert!(dir.create_layout("../evil", &[], true).is_err());
        assert!(dir.create_layout("   ", &[], true).is_err());
    }
}
