//! The layout engine: switch state machine, Multiple-mode synchronizer,
//! orphan activation and dynamic switching, wired to the collaborators.
//!
//! All mutation happens on the caller's thread. Deferred steps go through
//! the scheduler and only run when the embedder advances time.

use std::path::Path;

use crate::assignment::AssignmentMap;
use crate::collaborators::{ActivityId, ContainmentId, LayoutHandle, Services};
use crate::constants::{
    ACTIVATION_NOTICE_MS, ACTIVITY_STAGGER_MS, CONFIRM_SWITCH_DELAY_MS, LINKED_STATE_WARNING_MS,
    MULTIPLE_LAYOUTS_NAME, STAGED_TRANSITION_DELAY_MS, SWITCH_NOTICE_MS,
};
use crate::debounce::{DynamicSwitch, Verdict, should_switch};
use crate::error::{LayoutError, Result};
use crate::events::EngineEvent;
use crate::layout::{Layout, SharedLayout};
use crate::registry::{LayoutRegistry, ReloadReport};
use crate::scheduler::{Guard, ScheduledTask, Scheduler, Task};
use crate::settings::{EngineSettings, MemoryMode};
use crate::sync::{LoadedSummary, SyncEdit, SyncInput, plan_sync};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Unloading,
    Loading,
    Active(String),
}

/// What a `switch_to` call did right away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Target is already current; nothing happens.
    AlreadyCurrent,
    /// Target was loaded; the host was asked to move to one of its activities.
    ContextSwitched(ActivityId),
    /// A staged transition was scheduled.
    Scheduled,
}

pub struct LayoutEngine {
    services: Services,
    settings: EngineSettings,
    registry: LayoutRegistry,
    assignments: AssignmentMap,
    loaded: Vec<Layout>,
    shared: Vec<SharedLayout>,
    multi_current: String,
    state: EngineState,
    scheduler: Scheduler,
    dynamic: DynamicSwitch,
    events: Vec<EngineEvent>,
}

impl LayoutEngine {
    pub fn new(services: Services, settings: EngineSettings) -> Self {
        Self {
            services,
            settings,
            registry: LayoutRegistry::new(),
            assignments: AssignmentMap::new(),
            loaded: Vec::new(),
            shared: Vec::new(),
            multi_current: String::new(),
            state: EngineState::Idle,
            scheduler: Scheduler::new(),
            dynamic: DynamicSwitch::new(),
            events: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    /// Rescan storage and rebuild the assignment map.
    pub fn reload_layouts(&mut self) -> ReloadReport {
        let known = self.services.host.all_activities();
        let report = self.registry.reload(self.services.storage.as_ref(), &known);
        self.assignments = AssignmentMap::rebuild(&self.registry);
        self.events.push(EngineEvent::CatalogChanged);
        self.events.push(EngineEvent::MenuChanged);
        report
    }

    /// Load the catalog, repair leftovers from an unclean shutdown, and
    /// switch to the startup layout.
    pub fn start(&mut self, startup_layout: &str) -> Result<SwitchOutcome> {
        self.reload_layouts();
        let target = self.resolve_startup_layout(startup_layout);

        match self.services.storage.check_repair_linked_state() {
            Ok(repaired) if !repaired.is_empty() => {
                let warning = LayoutError::InconsistentLinkedState(repaired);
                tracing::warn!("{warning}");
                self.services
                    .notifier
                    .notify(&warning.to_string(), LINKED_STATE_WARNING_MS, &[]);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("linked state check failed: {e}"),
        }

        self.switch_to(&target)
    }

    /// `preferred` if the catalog still has it, otherwise the first menu
    /// entry.
    pub fn resolve_startup_layout(&self, preferred: &str) -> String {
        if self.layout_exists(preferred) {
            return preferred.to_string();
        }
        self.registry
            .menu_names()
            .first()
            .cloned()
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Switch engine
    // -----------------------------------------------------------------------

    pub fn switch_to(&mut self, target: &str) -> Result<SwitchOutcome> {
        self.switch_to_with(target, None)
    }

    /// Change the memory mode and rebuild the loaded set for it.
    pub fn set_memory_mode(&mut self, mode: MemoryMode) -> Result<SwitchOutcome> {
        let previous = self.settings.memory_mode;
        if previous == mode {
            return Ok(SwitchOutcome::AlreadyCurrent);
        }

        let mut target = self.current_layout_name();
        if target.is_empty() {
            target = self.settings.current_layout.clone();
        }

        tracing::info!("memory mode {previous} -> {mode}, reloading with '{target}'");
        self.settings.memory_mode = mode;
        self.dynamic.disarm(&mut self.scheduler);
        self.events.push(EngineEvent::MemoryModeChanged(mode));

        self.switch_to_with(&target, Some(previous))
    }

    fn switch_to_with(
        &mut self,
        target: &str,
        previous_mode: Option<MemoryMode>,
    ) -> Result<SwitchOutcome> {
        let mode = self.settings.memory_mode;

        if previous_mode.is_none() && !self.loaded.is_empty() && self.current_layout_name() == target
        {
            return Ok(SwitchOutcome::AlreadyCurrent);
        }

        if mode == MemoryMode::Multiple
            && previous_mode.is_none()
            && let Some(next) = self.activity_to_reveal(target)
        {
            tracing::info!("'{target}' is already loaded, switching host to activity {next}");
            self.services.host.set_current_activity(&next);
            return Ok(SwitchOutcome::ContextSwitched(next));
        }

        let Some(path) = self.services.storage.layout_path(target) else {
            tracing::warn!("layout '{target}' was not found");
            return Err(LayoutError::NotFound(target.to_string()));
        };

        self.announce_switch(target, mode, previous_mode.is_some());

        let guard = match previous_mode {
            Some(_) => Guard::mode(mode),
            None => Guard::mode(mode).and_current_is_not(target),
        };
        self.scheduler.schedule(
            STAGED_TRANSITION_DELAY_MS,
            Task::StagedTransition {
                target: target.to_string(),
                path,
                previous_mode,
            },
            guard,
        );
        Ok(SwitchOutcome::Scheduled)
    }

    /// For a loaded target seen from a foreign activity, the activity the
    /// host should move to.
    fn activity_to_reveal(&self, target: &str) -> Option<ActivityId> {
        let layout = self.find_loaded(target)?;
        let orphans = self.orphaned_activities();
        let applied = layout.applied_activities(&orphans);
        let first = applied.first()?;

        let current = self.services.host.current_activity();
        if current.is_some_and(|c| applied.contains(&c)) {
            return None;
        }

        Some(
            layout
                .last_used_activity()
                .map(str::to_string)
                .unwrap_or_else(|| first.clone()),
        )
    }

    fn announce_switch(&mut self, target: &str, mode: MemoryMode, mode_change: bool) {
        if mode_change {
            for layout in self.loaded.iter().filter(|l| l.is_original()) {
                self.events
                    .push(EngineEvent::LayoutIsAboutToSwitch(layout.name().to_string()));
            }
            for shared in &self.shared {
                self.events
                    .push(EngineEvent::LayoutIsAboutToSwitch(shared.name().to_string()));
            }
            return;
        }

        if mode != MemoryMode::Multiple || target == MULTIPLE_LAYOUTS_NAME {
            return;
        }

        let target_declares = self
            .registry
            .get(target)
            .is_some_and(|d| !d.activities.is_empty());
        if target_declares {
            return;
        }
        if let Some(handler) = self.loaded.iter().find(|l| l.is_orphan_handler())
            && handler.name() != target
        {
            self.events
                .push(EngineEvent::LayoutIsAboutToSwitch(handler.name().to_string()));
        }
    }

    fn run_staged_transition(
        &mut self,
        target: &str,
        path: &Path,
        previous_mode: Option<MemoryMode>,
    ) -> Result<()> {
        if self.services.storage.layout_path(target).is_none() {
            return Err(LayoutError::StaleTransition(format!(
                "layout '{target}' disappeared before its transition ran"
            )));
        }

        let mode = self.settings.memory_mode;
        let initializing_multiple =
            mode == MemoryMode::Multiple && self.find_loaded(MULTIPLE_LAYOUTS_NAME).is_none();

        if mode == MemoryMode::Single
            || initializing_multiple
            || previous_mode == Some(MemoryMode::Multiple)
        {
            self.unload();

            if initializing_multiple {
                match self.services.storage.layout_path(MULTIPLE_LAYOUTS_NAME) {
                    Some(master_path) => {
                        self.load_one(MULTIPLE_LAYOUTS_NAME, &master_path);
                    }
                    None => tracing::warn!("master layout is missing from storage"),
                }
            } else if !self.load_one(target, path) {
                self.state = EngineState::Idle;
                self.events.push(EngineEvent::ActiveSetChanged);
                return Err(LayoutError::StorageUnavailable {
                    path: path.display().to_string(),
                    reason: format!("layout '{target}' could not be loaded"),
                });
            }

            self.events.push(EngineEvent::ActiveSetChanged);
        }

        if mode == MemoryMode::Multiple {
            if !initializing_multiple && self.find_loaded(target).is_none() {
                self.activate_dormant(target);
            } else {
                self.sync_multiple_layouts_to_activities(Some(target));
            }
        }

        self.settings.current_layout = target.to_string();
        if !self.assignments.is_assigned(target) {
            self.settings.last_non_assigned_layout = target.to_string();
        }
        if mode == MemoryMode::Single {
            self.state = EngineState::Active(target.to_string());
        }

        tracing::info!("switched to layout '{target}'");
        self.events
            .push(EngineEvent::CurrentNameChanged(self.current_layout_name()));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Loading and unloading
    // -----------------------------------------------------------------------

    fn path_in_use(&self, path: &Path) -> bool {
        self.loaded.iter().any(|l| l.path() == path) || self.shared.iter().any(|s| s.path() == path)
    }

    /// Load a layout unless it is already loaded. Returns true if it is
    /// loaded afterwards.
    fn load_one(&mut self, name: &str, path: &Path) -> bool {
        if self.find_loaded(name).is_some() {
            return true;
        }
        if self.path_in_use(path) {
            tracing::warn!(
                "refusing to load '{name}': {} is held by another layout",
                path.display()
            );
            return false;
        }

        let previous_state = std::mem::replace(&mut self.state, EngineState::Loading);
        let handle = match self.services.storage.load_layout(path) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!("failed to load '{name}': {e}");
                self.state = previous_state;
                return false;
            }
        };

        self.services.presentation.instantiate_surfaces(&handle);
        let layout = Layout::new(handle, self.registry.get(name));
        let shared_name = layout.shared_layout().map(str::to_string);
        self.loaded.push(layout);
        tracing::info!("loaded layout '{name}'");

        if let Some(shared_name) = shared_name {
            self.assign_to_shared(name, &shared_name);
        }

        self.state = EngineState::Active(name.to_string());
        true
    }

    fn assign_to_shared(&mut self, member: &str, shared_name: &str) {
        if self.settings.memory_mode == MemoryMode::Single {
            return;
        }

        if let Some(shared) = self.shared.iter_mut().find(|s| s.name() == shared_name) {
            shared.add_member(member);
            return;
        }

        let Some(path) = self.services.storage.layout_path(shared_name) else {
            tracing::warn!("shared layout '{shared_name}' for '{member}' was not found");
            return;
        };
        if self.path_in_use(&path) {
            tracing::warn!("shared layout '{shared_name}' is already loaded as a layout");
            return;
        }

        match self.services.storage.load_layout(&path) {
            Ok(handle) => {
                self.services.presentation.instantiate_surfaces(&handle);
                self.shared.push(SharedLayout::new(handle, member));
                tracing::info!("created shared layout '{shared_name}' for '{member}'");
            }
            Err(e) => tracing::warn!("failed to load shared layout '{shared_name}': {e}"),
        }
    }

    fn detach_from_shared(&mut self, member: &str) {
        let mut emptied = Vec::new();
        for (idx, shared) in self.shared.iter_mut().enumerate() {
            if shared.members().iter().any(|m| m == member) && shared.remove_member(member) {
                emptied.push(idx);
            }
        }

        for idx in emptied.into_iter().rev() {
            let shared = self.shared.remove(idx);
            if let Err(e) = self.services.storage.flush(shared.handle()) {
                tracing::warn!("failed to flush shared layout '{}': {e}", shared.name());
            }
            let unloaded = self.services.presentation.tear_down_surfaces(shared.handle());
            self.purge_unreferenced(&unloaded);
            tracing::info!("removed shared layout '{}'", shared.name());
        }
    }

    /// Drop containments from the shared store unless a loaded layout still
    /// owns them.
    fn purge_unreferenced(&mut self, containments: &[ContainmentId]) {
        let orphaned: Vec<ContainmentId> = containments
            .iter()
            .filter(|id| {
                !self.loaded.iter().any(|l| l.containments().contains(id))
                    && !self.shared.iter().any(|s| s.handle().containments.contains(id))
            })
            .cloned()
            .collect();

        if orphaned.is_empty() {
            return;
        }
        if let Err(e) = self.services.storage.delete_entries(&orphaned) {
            tracing::warn!("failed to purge {} containments: {e}", orphaned.len());
        }
    }

    fn tear_down(&mut self, handle: &LayoutHandle, purge: bool) {
        let unloaded = self.services.presentation.tear_down_surfaces(handle);
        if purge {
            self.purge_unreferenced(&unloaded);
        }
    }

    /// Unload one layout during synchronization. Original layouts are flushed
    /// first; a failed flush keeps the layout loaded.
    fn unload_one(&mut self, name: &str) -> bool {
        let Some(idx) = self.loaded.iter().position(|l| l.name() == name) else {
            return false;
        };

        if self.loaded[idx].is_original()
            && let Err(e) = self.services.storage.flush(self.loaded[idx].handle())
        {
            tracing::warn!("keeping '{name}' loaded, flush failed: {e}");
            return false;
        }

        let layout = self.loaded.remove(idx);
        self.tear_down(layout.handle(), true);
        self.detach_from_shared(name);
        tracing::info!("unloaded layout '{name}'");
        true
    }

    /// Unload every layout and shared layout. When leaving Multiple mode each
    /// one is flushed and its containments purged from the shared store.
    pub fn unload(&mut self) {
        let multiple_env = self.find_loaded(MULTIPLE_LAYOUTS_NAME).is_some();
        self.state = EngineState::Unloading;

        while !self.loaded.is_empty() {
            let layout = self.loaded.remove(0);
            let persist = layout.is_original() && multiple_env;

            if persist && let Err(e) = self.services.storage.flush(layout.handle()) {
                tracing::warn!("failed to flush '{}' before unload: {e}", layout.name());
            }
            self.tear_down(layout.handle(), persist);
            tracing::info!("unloaded layout '{}'", layout.name());
        }

        while !self.shared.is_empty() {
            let shared = self.shared.remove(0);
            if multiple_env && let Err(e) = self.services.storage.flush(shared.handle()) {
                tracing::warn!("failed to flush shared '{}' before unload: {e}", shared.name());
            }
            self.tear_down(shared.handle(), multiple_env);
        }

        self.state = EngineState::Idle;
    }

    // -----------------------------------------------------------------------
    // Multiple-mode synchronization
    // -----------------------------------------------------------------------

    /// Bring the loaded set in line with the running activities.
    pub fn sync_multiple_layouts_to_activities(&mut self, layout_for_orphans: Option<&str>) -> SyncEdit {
        if self.settings.memory_mode != MemoryMode::Multiple {
            tracing::debug!("sync requested outside Multiple mode, ignoring");
            return SyncEdit::default();
        }

        let running = self.services.host.running_activities();
        let summaries: Vec<LoadedSummary> = self
            .loaded
            .iter()
            .map(|l| LoadedSummary {
                name: l.name().to_string(),
                declares_activities: !l.activities().is_empty(),
            })
            .collect();

        let edit = plan_sync(&SyncInput {
            mode: self.settings.memory_mode,
            running: &running,
            assignments: &self.assignments,
            loaded: &summaries,
            layout_for_orphans,
            last_non_assigned: self.settings.last_non_assigned(),
        });

        if !edit.to_unload.is_empty() {
            self.state = EngineState::Unloading;
        }
        for name in &edit.to_unload {
            self.unload_one(name);
        }

        for name in &edit.to_load {
            let Some(path) = self.services.storage.layout_path(name) else {
                tracing::warn!("cannot activate '{name}': not found in storage");
                continue;
            };
            if !self.load_one(name, &path) {
                continue;
            }
            tracing::info!("activated layout '{name}'");
            self.notify_activation(name);
        }

        self.update_current_name_multi();
        self.events.push(EngineEvent::ActiveSetChanged);
        edit
    }

    fn notify_activation(&mut self, name: &str) {
        if !self.settings.show_info_window {
            return;
        }
        let orphans = self.orphaned_activities();
        let Some(layout) = self.find_loaded(name).filter(|l| l.is_original()) else {
            return;
        };
        let applied = layout.applied_activities(&orphans);
        let message = format!("Activating layout: {name} ...");
        self.services
            .notifier
            .notify(&message, ACTIVATION_NOTICE_MS, &applied);
    }

    /// Start the activities of a layout that no running activity uses.
    fn activate_dormant(&mut self, target: &str) {
        let Some(definition) = self.registry.get(target).cloned() else {
            tracing::warn!("'{target}' is not in the catalog, synchronizing only");
            self.sync_multiple_layouts_to_activities(Some(target));
            return;
        };
        let last_used = definition.last_used_activity.clone();
        let guard = Guard::mode(MemoryMode::Multiple);

        if self.assignments.is_assigned(target) {
            if definition.activities.is_empty() {
                return;
            }
            for (i, activity) in definition.activities.iter().enumerate() {
                self.scheduler.schedule(
                    i as u64 * ACTIVITY_STAGGER_MS,
                    Task::StartActivity {
                        activity: activity.clone(),
                        make_current: last_used.as_deref() == Some(activity.as_str()),
                    },
                    guard.clone(),
                );
            }
            let last_used_declared = last_used
                .as_ref()
                .is_some_and(|a| definition.activities.contains(a));
            if !last_used_declared {
                self.services
                    .host
                    .set_current_activity(&definition.activities[0]);
            }
            return;
        }

        let orphans = self.orphaned_activities();
        let running = self.services.host.running_activities();
        let dormant: Vec<&ActivityId> = orphans.iter().filter(|a| !running.contains(a)).collect();

        for (i, activity) in dormant.iter().enumerate() {
            self.scheduler.schedule(
                i as u64 * ACTIVITY_STAGGER_MS,
                Task::StartActivity {
                    activity: (*activity).clone(),
                    make_current: last_used.as_deref() == Some(activity.as_str()),
                },
                guard.clone(),
            );
        }

        let current = self.services.host.current_activity();
        let on_orphan = current.as_ref().is_some_and(|c| orphans.contains(c));
        if !on_orphan
            && let Some(last) = &last_used
            && running.contains(last)
            && orphans.contains(last)
        {
            self.services.host.set_current_activity(last);
        }

        self.sync_multiple_layouts_to_activities(Some(target));
    }

    fn update_current_name_multi(&mut self) {
        let current = self.services.host.current_activity();

        let idx = self
            .loaded
            .iter()
            .position(|l| {
                l.is_original() && current.as_ref().is_some_and(|c| l.activities().contains(c))
            })
            .or_else(|| self.loaded.iter().position(|l| l.is_orphan_handler()));

        let Some(idx) = idx else {
            return;
        };

        if let Some(activity) = &current {
            self.loaded[idx].set_last_used_activity(activity);
        }
        let name = self.loaded[idx].name().to_string();
        self.state = EngineState::Active(name.clone());
        if self.multi_current != name {
            self.multi_current = name.clone();
            self.events.push(EngineEvent::CurrentNameChanged(name));
        }
    }

    /// Stop every activity of a loaded layout, one at a time.
    pub fn pause_layout(&mut self, name: &str) -> Result<usize> {
        if !self.registry.layout_exists(name) {
            return Err(LayoutError::NotFound(name.to_string()));
        }
        if self.settings.memory_mode != MemoryMode::Multiple {
            return Ok(0);
        }
        let Some(layout) = self.find_loaded(name) else {
            return Ok(0);
        };

        let activities = layout.activities().to_vec();
        for (i, activity) in activities.iter().enumerate() {
            self.scheduler.schedule(
                i as u64 * ACTIVITY_STAGGER_MS,
                Task::StopActivity {
                    activity: activity.clone(),
                },
                Guard::mode(MemoryMode::Multiple),
            );
        }
        Ok(activities.len())
    }

    /// Flush every loaded original layout to its own storage (Multiple mode).
    pub fn flush_active_layouts(&mut self) -> usize {
        if self.settings.memory_mode != MemoryMode::Multiple {
            return 0;
        }
        let mut flushed = 0;
        for layout in self.loaded.iter().filter(|l| l.is_original()) {
            match self.services.storage.flush(layout.handle()) {
                Ok(()) => flushed += 1,
                Err(e) => tracing::warn!("failed to flush '{}': {e}", layout.name()),
            }
        }
        flushed
    }

    // -----------------------------------------------------------------------
    // Host notifications
    // -----------------------------------------------------------------------

    pub fn on_current_activity_changed(&mut self, activity: &str) {
        match self.settings.memory_mode {
            MemoryMode::Single => {
                tracing::debug!("activity changed: {activity}");
                let candidate = should_switch(
                    Some(activity),
                    &self.assignments,
                    &self.settings.current_layout,
                    self.settings.last_non_assigned(),
                );
                let interval = self.settings.debounce_interval_ms();
                self.dynamic.arm(candidate, interval, &mut self.scheduler);
            }
            MemoryMode::Multiple => self.update_current_name_multi(),
        }
    }

    pub fn on_running_activities_changed(&mut self) {
        if self.settings.memory_mode == MemoryMode::Multiple {
            self.sync_multiple_layouts_to_activities(None);
        }
    }

    fn confirm_dynamic_switch(&mut self) {
        let activity = self.services.host.current_activity();
        let current = self.current_layout_name();
        let recomputed = should_switch(
            activity.as_deref(),
            &self.assignments,
            &current,
            self.settings.last_non_assigned(),
        );

        match self.dynamic.evaluate(recomputed, &current) {
            Verdict::Idle => {}
            Verdict::Restart => {
                let interval = self.settings.debounce_interval_ms();
                self.dynamic.restart(interval, &mut self.scheduler);
            }
            Verdict::Confirm(target) => {
                tracing::debug!("dynamic switch to layout '{target}'");
                self.events.push(EngineEvent::LayoutIsAboutToSwitch(current));
                if self.settings.show_info_window {
                    let message = format!("Switching to layout {target} ...");
                    self.services.notifier.notify(&message, SWITCH_NOTICE_MS, &[]);
                }
                self.scheduler.schedule(
                    CONFIRM_SWITCH_DELAY_MS,
                    Task::CommitDynamicSwitch {
                        target: target.clone(),
                    },
                    Guard::mode(MemoryMode::Single).and_current_is_not(&target),
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    pub fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_deadline()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn advance(&mut self, delta_ms: u64) {
        let until = self.scheduler.now_ms().saturating_add(delta_ms);
        self.advance_to(until);
    }

    /// Run every task due at or before `now_ms`, including tasks scheduled
    /// by the ones that run.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some(task) = self.scheduler.pop_due(now_ms) {
            self.dispatch(task);
        }
        self.scheduler.set_now(now_ms);
    }

    /// The current layout name as seen by task guards. Empty while nothing
    /// is loaded, so a remembered name never blocks the first load.
    fn guard_current(&self) -> String {
        if self.loaded.is_empty() {
            return String::new();
        }
        self.current_layout_name()
    }

    fn dispatch(&mut self, scheduled: ScheduledTask) {
        let current = self.guard_current();
        if let Err(reason) = scheduled.guard.check(self.settings.memory_mode, &current) {
            tracing::debug!(
                "discarding task {}: {}",
                scheduled.id,
                LayoutError::StaleTransition(reason)
            );
            return;
        }

        match scheduled.task {
            Task::StagedTransition {
                target,
                path,
                previous_mode,
            } => {
                match self.run_staged_transition(&target, &path, previous_mode) {
                    Ok(()) => {}
                    Err(e @ LayoutError::StaleTransition(_)) => {
                        tracing::debug!("transition to '{target}' dropped: {e}");
                    }
                    Err(e) => tracing::warn!("transition to '{target}' failed: {e}"),
                }
            }
            Task::StartActivity {
                activity,
                make_current,
            } => {
                self.services.host.start_activity(&activity);
                if make_current {
                    self.services.host.set_current_activity(&activity);
                }
            }
            Task::StopActivity { activity } => self.services.host.stop_activity(&activity),
            Task::ConfirmDynamicSwitch => self.confirm_dynamic_switch(),
            Task::CommitDynamicSwitch { target } => {
                if let Err(e) = self.switch_to(&target) {
                    tracing::warn!("dynamic switch to '{target}' failed: {e}");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn memory_mode(&self) -> MemoryMode {
        self.settings.memory_mode
    }

    pub fn set_show_info_window(&mut self, show: bool) {
        self.settings.show_info_window = show;
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Drain queued change notifications.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn current_layout_name(&self) -> String {
        match self.settings.memory_mode {
            MemoryMode::Single => self.settings.current_layout.clone(),
            MemoryMode::Multiple => self.multi_current.clone(),
        }
    }

    pub fn find_loaded(&self, name: &str) -> Option<&Layout> {
        self.loaded.iter().find(|l| l.name() == name)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.find_loaded(name).is_some()
    }

    pub fn loaded_layouts(&self) -> &[Layout] {
        &self.loaded
    }

    pub fn loaded_names(&self) -> Vec<String> {
        self.loaded.iter().map(|l| l.name().to_string()).collect()
    }

    pub fn shared_layouts(&self) -> &[SharedLayout] {
        &self.shared
    }

    pub fn layout_exists(&self, name: &str) -> bool {
        self.registry.layout_exists(name)
    }

    pub fn layouts(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Names of the active content layouts.
    pub fn active_layout_names(&self) -> Vec<String> {
        match self.settings.memory_mode {
            MemoryMode::Single => {
                let current = self.current_layout_name();
                if current.is_empty() { vec![] } else { vec![current] }
            }
            MemoryMode::Multiple => self
                .loaded
                .iter()
                .filter(|l| l.is_original())
                .map(|l| l.name().to_string())
                .collect(),
        }
    }

    /// Menu entries, with active layouts that opted out of the menu prepended.
    pub fn layouts_for_menu(&self) -> Vec<String> {
        let mut menu = self.registry.menu_names().to_vec();
        match self.settings.memory_mode {
            MemoryMode::Single => {
                let current = self.current_layout_name();
                if !current.is_empty() && !menu.contains(&current) {
                    menu.insert(0, current);
                }
            }
            MemoryMode::Multiple => {
                for layout in self.loaded.iter().filter(|l| l.is_original()) {
                    if !menu.iter().any(|m| m == layout.name()) {
                        menu.insert(0, layout.name().to_string());
                    }
                }
            }
        }
        menu
    }

    pub fn orphaned_activities(&self) -> Vec<ActivityId> {
        self.assignments
            .orphans(&self.services.host.all_activities())
    }
}
