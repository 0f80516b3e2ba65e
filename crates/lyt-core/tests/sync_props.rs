//! Reconciliation properties over random activity/assignment worlds.

mod common;

use common::{World, engine_with, layout};
use lyt_core::{
    AssignmentMap, EngineSettings, LoadedSummary, MULTIPLE_LAYOUTS_NAME, MemoryMode, SyncEdit,
    SyncInput, plan_sync,
};
use proptest::prelude::*;

const ACTIVITIES: usize = 6;
const LAYOUTS: [&str; 3] = ["L0", "L1", "L2"];
const ORPHAN_LAYOUT: &str = "Work";

fn activity(i: usize) -> String {
    format!("a{i}")
}

/// `owners[i]` is the index of the layout activity i is assigned to.
fn assignment_pairs(owners: &[Option<usize>]) -> Vec<(String, String)> {
    owners
        .iter()
        .enumerate()
        .filter_map(|(i, o)| o.map(|l| (activity(i), LAYOUTS[l].to_string())))
        .collect()
}

fn running_from(mask: &[bool]) -> Vec<String> {
    mask.iter()
        .enumerate()
        .filter(|(_, on)| **on)
        .map(|(i, _)| activity(i))
        .collect()
}

fn summary(name: &str, assignments: &AssignmentMap) -> LoadedSummary {
    LoadedSummary {
        name: name.to_string(),
        declares_activities: assignments.is_assigned(name),
    }
}

fn apply(loaded: &[LoadedSummary], edit: &SyncEdit, assignments: &AssignmentMap) -> Vec<LoadedSummary> {
    let mut next: Vec<LoadedSummary> = loaded
        .iter()
        .filter(|l| !edit.to_unload.contains(&l.name))
        .cloned()
        .collect();
    next.extend(edit.to_load.iter().map(|n| summary(n, assignments)));
    next
}

fn plan(
    running: &[String],
    assignments: &AssignmentMap,
    loaded: &[LoadedSummary],
    last_non_assigned: Option<&str>,
) -> SyncEdit {
    plan_sync(&SyncInput {
        mode: MemoryMode::Multiple,
        running,
        assignments,
        loaded,
        layout_for_orphans: None,
        last_non_assigned,
    })
}

fn world_strategy() -> impl Strategy<Value = (Vec<Option<usize>>, Vec<bool>, Vec<bool>, bool)> {
    (
        prop::collection::vec(prop::option::of(0usize..LAYOUTS.len()), ACTIVITIES),
        prop::collection::vec(any::<bool>(), ACTIVITIES),
        prop::collection::vec(any::<bool>(), LAYOUTS.len() + 2),
        any::<bool>(),
    )
}

proptest! {
    #[test]
    fn reconcile_is_idempotent((owners, running_mask, loaded_mask, has_orphan) in world_strategy()) {
        let pairs = assignment_pairs(&owners);
        let assignments = AssignmentMap::from_pairs(pairs.iter().map(|(a, l)| (a.as_str(), l.as_str())));
        let running = running_from(&running_mask);
        let last_non_assigned = has_orphan.then_some(ORPHAN_LAYOUT);

        let candidates: Vec<&str> = LAYOUTS
            .iter()
            .copied()
            .chain([ORPHAN_LAYOUT, MULTIPLE_LAYOUTS_NAME])
            .collect();
        let loaded: Vec<LoadedSummary> = candidates
            .iter()
            .zip(&loaded_mask)
            .filter(|(_, on)| **on)
            .map(|(n, _)| summary(n, &assignments))
            .collect();

        let first = plan(&running, &assignments, &loaded, last_non_assigned);
        let after = apply(&loaded, &first, &assignments);
        let second = plan(&running, &assignments, &after, last_non_assigned);

        prop_assert!(second.is_empty(), "second pass not empty: {:?}", second);
    }

    #[test]
    fn reconcile_covers_running_activities((owners, running_mask, _loaded, has_orphan) in world_strategy()) {
        let pairs = assignment_pairs(&owners);
        let assignments = AssignmentMap::from_pairs(pairs.iter().map(|(a, l)| (a.as_str(), l.as_str())));
        let running = running_from(&running_mask);
        let last_non_assigned = has_orphan.then_some(ORPHAN_LAYOUT);

        let edit = plan(&running, &assignments, &[], last_non_assigned);
        let after = apply(&[], &edit, &assignments);
        let is_loaded = |name: &str| after.iter().any(|l| l.name == name);

        prop_assert!(is_loaded(MULTIPLE_LAYOUTS_NAME));
        prop_assert!(!edit.to_unload.iter().any(|n| n == MULTIPLE_LAYOUTS_NAME));
        for act in &running {
            if let Some(owner) = assignments.assignment_for(act) {
                prop_assert!(is_loaded(owner), "{} missing for {}", owner, act);
            }
        }

        let orphan_running = running.iter().any(|a| assignments.assignment_for(a).is_none());
        prop_assert_eq!(edit.all_reserved, !orphan_running);
        prop_assert_eq!(is_loaded(ORPHAN_LAYOUT), orphan_running && has_orphan);
    }

    #[test]
    fn engine_second_sync_is_empty((owners, running_mask, _loaded, _orphan) in world_strategy()) {
        let w = World::new();
        let all: Vec<String> = (0..ACTIVITIES).map(activity).collect();
        let all_refs: Vec<&str> = all.iter().map(String::as_str).collect();
        w.activities(&all_refs);

        for (idx, name) in LAYOUTS.iter().enumerate() {
            let acts: Vec<&str> = owners
                .iter()
                .enumerate()
                .filter(|(_, o)| **o == Some(idx))
                .map(|(i, _)| all_refs[i])
                .collect();
            w.add_layout(layout(name, &acts));
        }
        w.add_layout(layout(ORPHAN_LAYOUT, &[]));

        let running = running_from(&running_mask);
        let running_refs: Vec<&str> = running.iter().map(String::as_str).collect();
        w.run(&running_refs, running_refs.first().copied());

        let settings = EngineSettings {
            memory_mode: MemoryMode::Multiple,
            last_non_assigned_layout: ORPHAN_LAYOUT.to_string(),
            ..EngineSettings::default()
        };
        let mut e = engine_with(&w, settings);
        e.start(ORPHAN_LAYOUT).unwrap();
        e.advance(350);

        let edit = e.sync_multiple_layouts_to_activities(None);
        prop_assert!(edit.is_empty(), "engine not converged: {:?}", edit);
        prop_assert!(e.is_loaded(MULTIPLE_LAYOUTS_NAME));
    }
}
