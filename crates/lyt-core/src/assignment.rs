use std::collections::HashMap;

use crate::collaborators::ActivityId;
use crate::registry::LayoutRegistry;

/// Derived index from activity id to the layout that claims it.
///
/// Rebuilt from the registry after every reload; never edited directly.
#[derive(Debug, Default, Clone)]
pub struct AssignmentMap {
    by_activity: HashMap<ActivityId, String>,
}

impl AssignmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the registry. When two layouts claim the same activity the
    /// one later in catalog order wins.
    pub fn rebuild(registry: &LayoutRegistry) -> Self {
        let mut by_activity = HashMap::new();
        for definition in registry.definitions() {
            for activity in &definition.activities {
                by_activity.insert(activity.clone(), definition.name.clone());
            }
        }
        Self { by_activity }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            by_activity: pairs
                .into_iter()
                .map(|(a, l)| (a.to_string(), l.to_string()))
                .collect(),
        }
    }

    pub fn assignment_for(&self, activity: &str) -> Option<&str> {
        self.by_activity.get(activity).map(String::as_str)
    }

    /// Whether any activity is assigned to the layout.
    pub fn is_assigned(&self, layout: &str) -> bool {
        self.by_activity.values().any(|l| l == layout)
    }

    /// Activities from `all` that have no assignment, in the given order.
    pub fn orphans(&self, all: &[ActivityId]) -> Vec<ActivityId> {
        all.iter()
            .filter(|a| !self.by_activity.contains_key(a.as_str()))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_activity.is_empty()
    }
}
