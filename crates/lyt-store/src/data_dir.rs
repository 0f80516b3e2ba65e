use std::path::{Path, PathBuf};
use std::{env, fs};

use lyt_core::MULTIPLE_LAYOUTS_NAME;

use crate::directory::LayoutDirectory;
use crate::error::{Result, StoreError};
use crate::linked::LinkedStore;
use crate::settings::{SETTINGS_VERSION, StoredSettings};
use crate::storage::FileStorage;

/// Name of the layout created on first run.
pub const FIRST_LAYOUT_NAME: &str = "My Layout";

/// Default base directory for all lyt storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".lyt")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Everything lyt keeps on disk.
///
/// ```text
/// ~/.lyt/
/// ├── settings.toml
/// ├── linked.db
/// └── layouts/
///     ├── .multiple-layouts.layout.toml
///     ├── My Layout.layout.toml
///     └── ...
/// ```
pub struct DataDir {
    root: PathBuf,
    layouts: LayoutDirectory,
}

impl DataDir {
    /// Open the data directory, creating it and the layout directory as
    /// needed. `base_dir` overrides the default location.
    pub fn open(base_dir: Option<&Path>) -> Result<Self> {
        let root = base_dir.map(PathBuf::from).unwrap_or_else(default_base_dir);
        fs::create_dir_all(&root).map_err(|e| {
            StoreError::InvalidData(format!("failed to create {}: {e}", root.display()))
        })?;
        let layouts = LayoutDirectory::open(&root.join("layouts"))?;
        Ok(Self { root, layouts })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layouts(&self) -> &LayoutDirectory {
        &self.layouts
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.toml")
    }

    pub fn linked_path(&self) -> PathBuf {
        self.root.join("linked.db")
    }

    pub fn load_settings(&self) -> Result<StoredSettings> {
        StoredSettings::load(&self.settings_path())
    }

    pub fn save_settings(&self, settings: &StoredSettings) -> Result<()> {
        settings.save(&self.settings_path())
    }

    /// First-run setup: when the settings predate the current version and no
    /// content layout exists, create one and make it current.
    pub fn bootstrap(&self) -> Result<StoredSettings> {
        let mut settings = self.load_settings()?;
        if settings.version >= SETTINGS_VERSION {
            return Ok(settings);
        }

        let has_content = self
            .layouts
            .list()?
            .iter()
            .any(|(_, d)| d.as_ref().is_ok_and(|d| d.name != MULTIPLE_LAYOUTS_NAME));
        if !has_content {
            let name = self.layouts.create_layout(FIRST_LAYOUT_NAME, &[], true)?;
            tracing::info!("first run, created '{name}'");
            if settings.engine.current_layout.is_empty() {
                settings.engine.current_layout = name;
            }
        }

        settings.version = SETTINGS_VERSION;
        self.save_settings(&settings)?;
        Ok(settings)
    }

    /// A storage collaborator over this directory.
    pub fn storage(&self) -> Result<FileStorage> {
        let linked = LinkedStore::open(&self.linked_path())?;
        Ok(FileStorage::new(self.layouts.clone(), linked))
    }

    /// Forget every linked layout so the next start does not report a
    /// repair. Call after the engine has unloaded everything.
    pub fn mark_clean_shutdown(&self) -> Result<()> {
        LinkedStore::open(&self.linked_path())?.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyt_core::LayoutStorage;

    #[test]
    fn test_open_creates_layout_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("data");
        let dir = DataDir::open(Some(&base)).unwrap();
        assert!(base.join("layouts").is_dir());
        assert!(dir.layouts().exists(MULTIPLE_LAYOUTS_NAME));
    }

    #[test]
    fn test_bootstrap_creates_first_layout_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::open(Some(tmp.path())).unwrap();

        let settings = dir.bootstrap().unwrap();
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.engine.current_layout, FIRST_LAYOUT_NAME);
        assert!(dir.layouts().exists(FIRST_LAYOUT_NAME));

        dir.bootstrap().unwrap();
        assert!(!dir.layouts().exists(&format!("{FIRST_LAYOUT_NAME}-2")));
    }

    #[test]
    fn test_bootstrap_keeps_existing_layouts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::open(Some(tmp.path())).unwrap();
        dir.layouts().create_layout("Work", &[], true).unwrap();

        let settings = dir.bootstrap().unwrap();
        assert!(!dir.layouts().exists(FIRST_LAYOUT_NAME));
        assert_eq!(settings.engine.current_layout, "");
    }

    #[test]
    fn test_clean_shutdown_clears_linked_layouts() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::open(Some(tmp.path())).unwrap();
        dir.layouts().create_layout("Work", &[], true).unwrap();

        let mut storage = dir.storage().unwrap();
        let path = storage.layout_path("Work").unwrap();
        storage.load_layout(&path).unwrap();
        drop(storage);

        dir.mark_clean_shutdown().unwrap();
        let mut storage = dir.storage().unwrap();
        assert!(storage.check_repair_linked_state().unwrap().is_empty());
    }
}
