use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::collaborators::{ActivityId, LayoutStorage};

/// A layout as declared in storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDefinition {
    pub name: String,
    pub path: PathBuf,
    /// Assigned activities. Empty means the layout serves orphan activities.
    pub activities: Vec<ActivityId>,
    pub show_in_menu: bool,
    pub last_used_activity: Option<ActivityId>,
    /// Name of a shared layout this layout joins in Multiple mode.
    pub shared_layout: Option<String>,
}

impl LayoutDefinition {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
            activities: Vec::new(),
            show_in_menu: true,
            last_used_activity: None,
            shared_layout: None,
        }
    }

    pub fn with_activities(mut self, activities: &[&str]) -> Self {
        self.activities = activities.iter().map(|a| a.to_string()).collect();
        self
    }
}

/// Outcome of a catalog rescan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReloadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Catalog of known layouts, keyed by name.
#[derive(Debug, Default)]
pub struct LayoutRegistry {
    layouts: BTreeMap<String, LayoutDefinition>,
    menu: Vec<String>,
}

impl LayoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog with a fresh scan of storage.
    ///
    /// Activity ids the host does not know are dropped from each definition.
    /// Unreadable definitions are skipped.
    pub fn reload(
        &mut self,
        storage: &dyn LayoutStorage,
        known_activities: &[ActivityId],
    ) -> ReloadReport {
        let mut layouts = BTreeMap::new();
        let mut menu = Vec::new();
        let mut report = ReloadReport::default();

        for entry in storage.list_layout_definitions() {
            let mut definition = match entry {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("skipping layout definition: {e}");
                    report.skipped += 1;
                    continue;
                }
            };

            definition
                .activities
                .retain(|a| known_activities.iter().any(|k| k == a));

            if definition.show_in_menu {
                menu.push(definition.name.clone());
            }
            layouts.insert(definition.name.clone(), definition);
            report.loaded += 1;
        }

        self.layouts = layouts;
        self.menu = menu;
        tracing::debug!(
            loaded = report.loaded,
            skipped = report.skipped,
            "layout catalog reloaded"
        );
        report
    }

    pub fn get(&self, name: &str) -> Option<&LayoutDefinition> {
        self.layouts.get(name)
    }

    pub fn layout_exists(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.layouts.keys().cloned().collect()
    }

    pub fn definitions(&self) -> impl Iterator<Item = &LayoutDefinition> {
        self.layouts.values()
    }

    /// Layouts that opted into the selection menu, in scan order.
    pub fn menu_names(&self) -> &[String] {
        &self.menu
    }

    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
