//! Service boundaries the engine depends on.
//!
//! The engine never touches files, windows, or the activity manager
//! directly. Everything it needs from the outside world goes through these
//! traits, which lets the store crate provide real persistence and tests
//! provide recording fakes.

use std::path::PathBuf;

use crate::error::Result;
use crate::registry::LayoutDefinition;

pub type ActivityId = String;
pub type ContainmentId = String;

/// A loaded layout as returned by storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutHandle {
    pub name: String,
    pub path: PathBuf,
    pub containments: Vec<ContainmentId>,
    pub last_used_activity: Option<ActivityId>,
}

/// Persisted layout definitions and the shared containment store.
pub trait LayoutStorage {
    /// Every definition found in storage. A single unreadable definition is
    /// reported as an `Err` entry and does not fail the whole listing.
    fn list_layout_definitions(&self) -> Vec<Result<LayoutDefinition>>;

    /// Resolve a layout name to its storage location, if it exists.
    fn layout_path(&self, name: &str) -> Option<PathBuf>;

    fn load_layout(&mut self, path: &std::path::Path) -> Result<LayoutHandle>;

    /// Write the handle's current state back to its own storage.
    fn flush(&mut self, handle: &LayoutHandle) -> Result<()>;

    /// Purge containment entries from the shared store.
    fn delete_entries(&mut self, containments: &[ContainmentId]) -> Result<()>;

    /// Detect and repair state left behind by a run that ended mid-transition.
    /// Returns the names of the repaired layouts.
    fn check_repair_linked_state(&mut self) -> Result<Vec<String>>;
}

/// The environment that owns activities and their running state.
pub trait ActivityHost {
    fn all_activities(&self) -> Vec<ActivityId>;
    fn running_activities(&self) -> Vec<ActivityId>;
    fn current_activity(&self) -> Option<ActivityId>;
    fn start_activity(&mut self, id: &str);
    fn stop_activity(&mut self, id: &str);
    fn set_current_activity(&mut self, id: &str);
}

/// Creates and destroys the visual surfaces of a layout.
pub trait Presentation {
    fn instantiate_surfaces(&mut self, handle: &LayoutHandle);

    /// Tear the surfaces down and return the containments that were unloaded.
    fn tear_down_surfaces(&mut self, handle: &LayoutHandle) -> Vec<ContainmentId>;
}

pub trait Notifier {
    fn notify(&mut self, message: &str, duration_ms: u64, activities: &[ActivityId]);
}

/// The bundle of collaborators an engine is built from.
pub struct Services {
    pub storage: Box<dyn LayoutStorage>,
    pub host: Box<dyn ActivityHost>,
    pub presentation: Box<dyn Presentation>,
    pub notifier: Box<dyn Notifier>,
}
