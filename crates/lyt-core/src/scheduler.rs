//! Virtual-clock queue of deferred engine work.
//!
//! Every delayed step of the engine (staged transitions, staggered activity
//! starts, the debounce timer) is a `ScheduledTask` with a `Guard`. The guard
//! is checked when the task fires, not when it is scheduled; a task whose
//! guard fails is stale and is dropped.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::collaborators::ActivityId;
use crate::settings::MemoryMode;

pub type TaskId = u64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Second half of `switch_to`: unload/load or reconcile.
    StagedTransition {
        target: String,
        path: PathBuf,
        previous_mode: Option<MemoryMode>,
    },
    StartActivity {
        activity: ActivityId,
        make_current: bool,
    },
    StopActivity {
        activity: ActivityId,
    },
    /// Debounce timer expiry.
    ConfirmDynamicSwitch,
    /// Delayed `switch_to` after a confirmed dynamic switch.
    CommitDynamicSwitch {
        target: String,
    },
}

/// Precondition re-checked at fire time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Guard {
    pub mode: Option<MemoryMode>,
    pub current_is_not: Option<String>,
}

impl Guard {
    pub fn mode(mode: MemoryMode) -> Self {
        Self {
            mode: Some(mode),
            current_is_not: None,
        }
    }

    pub fn and_current_is_not(mut self, name: &str) -> Self {
        self.current_is_not = Some(name.to_string());
        self
    }

    /// `Err` carries the reason the task went stale.
    pub fn check(&self, mode: MemoryMode, current: &str) -> Result<(), String> {
        if let Some(expected) = self.mode
            && expected != mode
        {
            return Err(format!("memory mode is {mode}, task expected {expected}"));
        }
        if let Some(name) = &self.current_is_not
            && name == current
        {
            return Err(format!("{name} is already the current layout"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub due_ms: u64,
    pub task: Task,
    pub guard: Guard,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: TaskId,
    queue: BTreeMap<(u64, TaskId), ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, task: Task, guard: Guard) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        let due_ms = self.now_ms.saturating_add(delay_ms);
        self.queue.insert(
            (due_ms, id),
            ScheduledTask {
                id,
                due_ms,
                task,
                guard,
            },
        );
        id
    }

    /// Remove a task that has not fired yet. Returns whether it was pending.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let key = self.queue.keys().find(|(_, tid)| *tid == id).copied();
        match key {
            Some(k) => self.queue.remove(&k).is_some(),
            None => false,
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    /// Take the earliest task due at or before `until`, moving the clock to
    /// its deadline so follow-up delays are measured from when it fired.
    pub fn pop_due(&mut self, until: u64) -> Option<ScheduledTask> {
        let key = *self.queue.keys().next()?;
        if key.0 > until {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.now_ms = self.now_ms.max(task.due_ms);
        Some(task)
    }

    /// Move the clock forward. Never moves it backwards.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
