//! Dynamic layout switching in Single mode.
//!
//! Activity changes can arrive in bursts (a login cycling through several
//! activities, a user flicking through them). A switch is only confirmed when
//! the same target is still wanted after a full quiet interval.

use crate::assignment::AssignmentMap;
use crate::scheduler::{Guard, Scheduler, Task, TaskId};
use crate::settings::MemoryMode;

/// The layout the engine should switch to for `activity`, if any.
pub fn should_switch(
    activity: Option<&str>,
    assignments: &AssignmentMap,
    current: &str,
    last_non_assigned: Option<&str>,
) -> Option<String> {
    match activity.and_then(|a| assignments.assignment_for(a)) {
        Some(assigned) if assigned != current => Some(assigned.to_string()),
        Some(_) => None,
        None => last_non_assigned
            .filter(|l| !l.is_empty() && *l != current)
            .map(str::to_string),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to switch to.
    Idle,
    /// Target was stable across the interval.
    Confirm(String),
    /// Target changed during the interval; wait again.
    Restart,
}

#[derive(Debug, Default)]
pub struct DynamicSwitch {
    candidate: Option<String>,
    timer: Option<TaskId>,
}

impl DynamicSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate(&self) -> Option<&str> {
        self.candidate.as_deref()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Store the candidate and (re)start the single-shot timer.
    pub fn arm(&mut self, candidate: Option<String>, interval_ms: u64, scheduler: &mut Scheduler) {
        self.candidate = candidate;
        self.restart(interval_ms, scheduler);
    }

    pub fn restart(&mut self, interval_ms: u64, scheduler: &mut Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
        let id = scheduler.schedule(
            interval_ms,
            Task::ConfirmDynamicSwitch,
            Guard::mode(MemoryMode::Single),
        );
        self.timer = Some(id);
    }

    pub fn disarm(&mut self, scheduler: &mut Scheduler) {
        if let Some(id) = self.timer.take() {
            scheduler.cancel(id);
        }
        self.candidate = None;
    }

    /// Called when the timer fires with the target recomputed for whatever
    /// activity is current now.
    pub fn evaluate(&mut self, recomputed: Option<String>, current: &str) -> Verdict {
        self.timer = None;
        let Some(target) = recomputed else {
            return Verdict::Idle;
        };

        if self.candidate.as_deref() == Some(target.as_str()) && target != current {
            self.candidate = None;
            Verdict::Confirm(target)
        } else {
            self.candidate = Some(target);
            Verdict::Restart
        }
    }
}
