use std::path::Path;

use crate::collaborators::{ActivityId, ContainmentId, LayoutHandle};
use crate::constants::MULTIPLE_LAYOUTS_NAME;
use crate::registry::LayoutDefinition;

/// A loaded layout. Owned by the engine; everything else refers to it by name.
#[derive(Debug, Clone)]
pub struct Layout {
    handle: LayoutHandle,
    activities: Vec<ActivityId>,
    shared_layout: Option<String>,
}

impl Layout {
    /// Combine a storage handle with the catalog entry it was loaded for.
    /// The master layout and layouts missing from the catalog carry no
    /// activities.
    pub fn new(handle: LayoutHandle, definition: Option<&LayoutDefinition>) -> Self {
        let (activities, shared_layout) = match definition {
            Some(d) => (d.activities.clone(), d.shared_layout.clone()),
            None => (Vec::new(), None),
        };
        Self {
            handle,
            activities,
            shared_layout,
        }
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    pub fn path(&self) -> &Path {
        &self.handle.path
    }

    pub fn handle(&self) -> &LayoutHandle {
        &self.handle
    }

    pub fn activities(&self) -> &[ActivityId] {
        &self.activities
    }

    /// Every layout except the Multiple-mode master is an original layout.
    pub fn is_original(&self) -> bool {
        self.handle.name != MULTIPLE_LAYOUTS_NAME
    }

    pub fn is_master(&self) -> bool {
        !self.is_original()
    }

    /// An original layout with no declared activities handles orphans.
    pub fn is_orphan_handler(&self) -> bool {
        self.is_original() && self.activities.is_empty()
    }

    pub fn shared_layout(&self) -> Option<&str> {
        self.shared_layout.as_deref()
    }

    pub fn last_used_activity(&self) -> Option<&str> {
        self.handle.last_used_activity.as_deref()
    }

    pub fn set_last_used_activity(&mut self, activity: &str) {
        self.handle.last_used_activity = Some(activity.to_string());
    }

    pub fn containments(&self) -> &[ContainmentId] {
        &self.handle.containments
    }

    /// Activities the layout is shown on: its own, or the orphans when it
    /// declares none.
    pub fn applied_activities(&self, orphans: &[ActivityId]) -> Vec<ActivityId> {
        if self.activities.is_empty() {
            orphans.to_vec()
        } else {
            self.activities.clone()
        }
    }
}

/// A layout presented on behalf of several loaded layouts in Multiple mode.
#[derive(Debug, Clone)]
pub struct SharedLayout {
    handle: LayoutHandle,
    members: Vec<String>,
}

impl SharedLayout {
    pub fn new(handle: LayoutHandle, first_member: &str) -> Self {
        Self {
            handle,
            members: vec![first_member.to_string()],
        }
    }

    pub fn name(&self) -> &str {
        &self.handle.name
    }

    pub fn path(&self) -> &Path {
        &self.handle.path
    }

    pub fn handle(&self) -> &LayoutHandle {
        &self.handle
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn add_member(&mut self, layout: &str) {
        if !self.members.iter().any(|m| m == layout) {
            self.members.push(layout.to_string());
        }
    }

    /// Remove a member; returns true when no members remain.
    pub fn remove_member(&mut self, layout: &str) -> bool {
        self.members.retain(|m| m != layout);
        self.members.is_empty()
    }
}
