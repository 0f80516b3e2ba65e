//! Multiple-mode reconciliation planning.
//!
//! `plan_sync` is pure: it looks at the running activities, the assignment
//! map and a summary of what is loaded, and returns the edit that brings the
//! loaded set in line with policy. The engine applies the edit (unloads
//! first, then loads).

use serde::Serialize;

use crate::assignment::AssignmentMap;
use crate::collaborators::ActivityId;
use crate::constants::MULTIPLE_LAYOUTS_NAME;
use crate::settings::MemoryMode;

/// What the planner needs to know about a loaded layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedSummary {
    pub name: String,
    pub declares_activities: bool,
}

pub struct SyncInput<'a> {
    pub mode: MemoryMode,
    pub running: &'a [ActivityId],
    pub assignments: &'a AssignmentMap,
    pub loaded: &'a [LoadedSummary],
    /// Explicitly requested orphan handler; ignored when it is assigned.
    pub layout_for_orphans: Option<&'a str>,
    pub last_non_assigned: Option<&'a str>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncEdit {
    /// Loaded layouts to unload, in loaded order. Never contains the master.
    pub to_unload: Vec<String>,
    /// Layouts to load, orphan handler first. Never contains a loaded name.
    pub to_load: Vec<String>,
    pub orphan_layout: Option<String>,
    /// Every running activity has an assignment.
    pub all_reserved: bool,
}

impl SyncEdit {
    pub fn is_empty(&self) -> bool {
        self.to_unload.is_empty() && self.to_load.is_empty()
    }
}

/// Pick the layout that handles unassigned activities.
pub fn orphan_layout_for(
    assignments: &AssignmentMap,
    layout_for_orphans: Option<&str>,
    last_non_assigned: Option<&str>,
) -> Option<String> {
    layout_for_orphans
        .filter(|name| !name.is_empty() && !assignments.is_assigned(name))
        .or(last_non_assigned)
        .filter(|name| !name.is_empty() && *name != MULTIPLE_LAYOUTS_NAME)
        .map(str::to_string)
}

pub fn plan_sync(input: &SyncInput<'_>) -> SyncEdit {
    if input.mode != MemoryMode::Multiple {
        return SyncEdit::default();
    }

    let orphan_layout = orphan_layout_for(
        input.assignments,
        input.layout_for_orphans,
        input.last_non_assigned,
    );

    let mut wanted: Vec<String> = vec![MULTIPLE_LAYOUTS_NAME.to_string()];
    let mut all_reserved = true;

    for activity in input.running {
        match input.assignments.assignment_for(activity) {
            Some(layout) => {
                if !wanted.iter().any(|w| w == layout) {
                    wanted.push(layout.to_string());
                }
            }
            None => all_reserved = false,
        }
    }

    let mut to_unload: Vec<String> = Vec::new();
    for loaded in input.loaded {
        if loaded.name == MULTIPLE_LAYOUTS_NAME {
            continue;
        }
        let unwanted = !wanted.contains(&loaded.name)
            && orphan_layout.as_deref() != Some(loaded.name.as_str());
        let idle_orphan_handler = !loaded.declares_activities && all_reserved;

        if (unwanted || idle_orphan_handler) && !to_unload.contains(&loaded.name) {
            to_unload.push(loaded.name.clone());
        }
    }

    let stays_loaded =
        |name: &str| input.loaded.iter().any(|l| l.name == name) && !to_unload.iter().any(|u| u == name);

    let mut to_load: Vec<String> = Vec::new();
    if !all_reserved
        && let Some(orphan) = &orphan_layout
        && !stays_loaded(orphan)
    {
        to_load.push(orphan.clone());
    }
    for name in &wanted {
        if !stays_loaded(name) && !to_load.contains(name) {
            to_load.push(name.clone());
        }
    }

    tracing::debug!(?to_unload, ?to_load, ?orphan_layout, all_reserved, "sync plan");

    SyncEdit {
        to_unload,
        to_load,
        orphan_layout,
        all_reserved,
    }
}
