//! Simulated activity host, presentation and notifier.
//!
//! The engine owns its collaborators, so the simulation keeps its state
//! behind a shared handle. Changes the engine cannot see on its own (the
//! running set or current activity moving) are queued and delivered by
//! the session after every step.

use std::cell::RefCell;
use std::rc::Rc;

use lyt_core::{
    ActivityHost, ActivityId, ContainmentId, LayoutHandle, LayoutStorage, Notifier,
    Presentation, Services,
};

#[derive(Debug, Default)]
struct HostState {
    all: Vec<ActivityId>,
    running: Vec<ActivityId>,
    current: Option<ActivityId>,
    running_changed: bool,
    current_changed: bool,
    output: Vec<String>,
}

/// Host-side changes the engine has not been told about yet.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HostChanges {
    pub running: bool,
    pub current: Option<ActivityId>,
}

impl HostChanges {
    pub fn is_empty(&self) -> bool {
        !self.running && self.current.is_none()
    }
}

#[derive(Clone, Default)]
pub struct SimHost(Rc<RefCell<HostState>>);

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_activities(&self, all: Vec<ActivityId>) {
        let mut s = self.0.borrow_mut();
        s.running.retain(|a| all.contains(a));
        if s.current.as_ref().is_some_and(|c| !all.contains(c)) {
            s.current = None;
            s.current_changed = true;
        }
        s.all = all;
        s.running_changed = true;
    }

    pub fn set_running(&self, running: Vec<ActivityId>) {
        let mut s = self.0.borrow_mut();
        s.running = running;
        s.running_changed = true;
    }

    pub fn set_current(&self, activity: &str) {
        let mut s = self.0.borrow_mut();
        if !s.running.iter().any(|a| a == activity) {
            s.running.push(activity.to_string());
            s.running_changed = true;
        }
        s.current = Some(activity.to_string());
        s.current_changed = true;
    }

    pub fn start(&self, activity: &str) {
        let mut s = self.0.borrow_mut();
        if !s.running.iter().any(|a| a == activity) {
            s.running.push(activity.to_string());
            s.running_changed = true;
        }
    }

    pub fn stop(&self, activity: &str) {
        let mut s = self.0.borrow_mut();
        let before = s.running.len();
        s.running.retain(|a| a != activity);
        if s.running.len() != before {
            s.running_changed = true;
        }
        if s.current.as_deref() == Some(activity) {
            s.current = s.running.first().cloned();
            s.current_changed = s.current.is_some();
        }
    }

    pub fn activities(&self) -> Vec<ActivityId> {
        self.0.borrow().all.clone()
    }

    pub fn running(&self) -> Vec<ActivityId> {
        self.0.borrow().running.clone()
    }

    pub fn current(&self) -> Option<ActivityId> {
        self.0.borrow().current.clone()
    }

    pub fn take_changes(&self) -> HostChanges {
        let mut s = self.0.borrow_mut();
        let running = std::mem::take(&mut s.running_changed);
        let current = if std::mem::take(&mut s.current_changed) {
            s.current.clone()
        } else {
            None
        };
        HostChanges { running, current }
    }

    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut self.0.borrow_mut().output)
    }

    fn say(&self, line: String) {
        self.0.borrow_mut().output.push(line);
    }

    /// Collaborators for an engine, all backed by this host.
    pub fn services(&self, storage: Box<dyn LayoutStorage>) -> Services {
        Services {
            storage,
            host: Box::new(HostHandle(self.clone())),
            presentation: Box::new(ConsolePresentation(self.clone())),
            notifier: Box::new(ConsoleNotifier(self.clone())),
        }
    }
}

struct HostHandle(SimHost);

impl ActivityHost for HostHandle {
    fn all_activities(&self) -> Vec<ActivityId> {
        self.0.activities()
    }

    fn running_activities(&self) -> Vec<ActivityId> {
        self.0.running()
    }

    fn current_activity(&self) -> Option<ActivityId> {
        self.0.current()
    }

    fn start_activity(&mut self, id: &str) {
        self.0.say(format!("host: start {id}"));
        self.0.start(id);
    }

    fn stop_activity(&mut self, id: &str) {
        self.0.say(format!("host: stop {id}"));
        self.0.stop(id);
    }

    fn set_current_activity(&mut self, id: &str) {
        self.0.say(format!("host: current {id}"));
        self.0.set_current(id);
    }
}

struct ConsolePresentation(SimHost);

impl Presentation for ConsolePresentation {
    fn instantiate_surfaces(&mut self, handle: &LayoutHandle) {
        self.0.say(format!(
            "surfaces: up '{}' ({} containments)",
            handle.name,
            handle.containments.len()
        ));
    }

    fn tear_down_surfaces(&mut self, handle: &LayoutHandle) -> Vec<ContainmentId> {
        self.0.say(format!("surfaces: down '{}'", handle.name));
        handle.containments.clone()
    }
}

struct ConsoleNotifier(SimHost);

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, message: &str, duration_ms: u64, activities: &[ActivityId]) {
        if activities.is_empty() {
            self.0.say(format!("notice ({duration_ms}ms): {message}"));
        } else {
            self.0.say(format!(
                "notice ({duration_ms}ms) on [{}]: {message}",
                activities.join(",")
            ));
        }
    }
}
