//! `LayoutStorage` over a layout directory plus the linked store.

use std::path::{Path, PathBuf};

use lyt_core::{
    ContainmentId, LayoutDefinition, LayoutError, LayoutHandle, LayoutStorage,
    MULTIPLE_LAYOUTS_NAME,
};

use crate::directory::LayoutDirectory;
use crate::layout_file::{LayoutFile, layout_name};
use crate::linked::LinkedStore;

pub struct FileStorage {
    directory: LayoutDirectory,
    linked: LinkedStore,
}

impl FileStorage {
    pub fn new(directory: LayoutDirectory, linked: LinkedStore) -> Self {
        Self { directory, linked }
    }

    pub fn directory(&self) -> &LayoutDirectory {
        &self.directory
    }

    pub fn linked(&self) -> &LinkedStore {
        &self.linked
    }
}

impl LayoutStorage for FileStorage {
    fn list_layout_definitions(&self) -> Vec<lyt_core::Result<LayoutDefinition>> {
        match self.directory.list() {
            Ok(entries) => entries
                .into_iter()
                .map(|(path, definition)| definition.map_err(|e| e.into_layout_error(&path)))
                .collect(),
            Err(e) => {
                tracing::warn!("cannot list {}: {e}", self.directory.root().display());
                vec![Err(e.into_layout_error(self.directory.root()))]
            }
        }
    }

    fn layout_path(&self, name: &str) -> Option<PathBuf> {
        let path = self.directory.path_for(name);
        path.is_file().then_some(path)
    }

    fn load_layout(&mut self, path: &Path) -> lyt_core::Result<LayoutHandle> {
        let name = layout_name(path)
            .ok_or_else(|| LayoutError::NotFound(path.display().to_string()))?;
        let file = LayoutFile::read(path).map_err(|e| e.into_layout_error(path))?;

        // the master's containments never leave the linked store
        if name != MULTIPLE_LAYOUTS_NAME {
            self.linked
                .link(&name, path, &file.containments)
                .map_err(|e| e.into_layout_error(path))?;
        }

        tracing::debug!("read '{name}' with {} containments", file.containments.len());
        Ok(LayoutHandle {
            containments: file.containment_ids(),
            last_used_activity: file.last_used_activity,
            name,
            path: path.to_path_buf(),
        })
    }

    fn flush(&mut self, handle: &LayoutHandle) -> lyt_core::Result<()> {
        let path = handle.path.as_path();
        let mut file = LayoutFile::read(path).map_err(|e| e.into_layout_error(path))?;

        let linked = self
            .linked
            .containments_of(&handle.name)
            .map_err(|e| e.into_layout_error(path))?;
        if !linked.is_empty() {
            file.containments = linked;
        }
        if handle.last_used_activity.is_some() {
            file.last_used_activity = handle.last_used_activity.clone();
        }

        file.write(path).map_err(|e| e.into_layout_error(path))?;
        tracing::debug!("flushed '{}' to {}", handle.name, path.display());
        Ok(())
    }

    fn delete_entries(&mut self, containments: &[ContainmentId]) -> lyt_core::Result<()> {
        let removed = self
            .linked
            .delete_containments(containments)
            .map_err(|e| e.into_layout_error(self.directory.root()))?;
        tracing::debug!("purged {removed} containments from the linked store");
        Ok(())
    }

    fn check_repair_linked_state(&mut self) -> lyt_core::Result<Vec<String>> {
        self.linked
            .check_repair()
            .map_err(|e| e.into_layout_error(self.directory.root()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, FileStorage) {
        let tmp = tempfile::tempdir().unwrap();
        let directory = LayoutDirectory::open(&tmp.path().join("layouts")).unwrap();
        let linked = LinkedStore::open(&tmp.path().join("linked.db")).unwrap();
        (tmp, FileStorage::new(directory, linked))
    }

    #[test]
    fn test_list_and_resolve() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &["a1".into()], true).unwrap();

        let names: Vec<String> = s
            .list_layout_definitions()
            .into_iter()
            .map(|d| d.unwrap().name)
            .collect();
        assert_eq!(names, vec![MULTIPLE_LAYOUTS_NAME, "Work"]);

        assert!(s.layout_path("Work").is_some());
        assert!(s.layout_path("Nope").is_none());
        let missing = s.directory().path_for("Nope");
        assert_eq!(
            s.load_layout(&missing).unwrap_err(),
            LayoutError::NotFound(missing.display().to_string())
        );
    }

    #[test]
    fn test_load_links_originals_but_not_master() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &[], true).unwrap();

        let master = s.layout_path(MULTIPLE_LAYOUTS_NAME).unwrap();
        s.load_layout(&master).unwrap();
        assert!(!s.linked().is_linked(MULTIPLE_LAYOUTS_NAME).unwrap());

        let path = s.layout_path("Work").unwrap();
        let handle = s.load_layout(&path).unwrap();
        assert_eq!(handle.name, "Work");
        assert_eq!(handle.containments.len(), 1);
        assert!(s.linked().is_linked("Work").unwrap());
    }

    #[test]
    fn test_flush_persists_last_used_activity() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &["a1".into()], true).unwrap();
        let path = s.layout_path("Work").unwrap();

        let mut handle = s.load_layout(&path).unwrap();
        handle.last_used_activity = Some("a1".into());
        s.flush(&handle).unwrap();

        let file = LayoutFile::read(&path).unwrap();
        assert_eq!(file.last_used_activity.as_deref(), Some("a1"));
        assert_eq!(file.containment_ids(), handle.containments);
    }

    #[test]
    fn test_flush_of_deleted_file_fails() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &[], true).unwrap();
        let path = s.layout_path("Work").unwrap();
        let handle = s.load_layout(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        assert!(s.flush(&handle).is_err());
    }

    #[test]
    fn test_purge_then_repair_finds_nothing() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &[], true).unwrap();
        let path = s.layout_path("Work").unwrap();
        let handle = s.load_layout(&path).unwrap();

        s.delete_entries(&handle.containments).unwrap();
        assert!(s.check_repair_linked_state().unwrap().is_empty());
    }

    #[test]
    fn test_unreleased_layout_is_repaired() {
        let (_tmp, mut s) = storage();
        s.directory().create_layout("Work", &[], true).unwrap();
        let path = s.layout_path("Work").unwrap();
        s.load_layout(&path).unwrap();

        assert_eq!(s.check_repair_linked_state().unwrap(), vec!["Work"]);
        assert!(s.check_repair_linked_state().unwrap().is_empty());
    }
}
