//! One engine wired to the on-disk store and the simulated host.

use anyhow::{Context, Result};
use lyt_core::{EngineSettings, LayoutEngine, SwitchOutcome};
use lyt_store::{DataDir, SETTINGS_VERSION, StoredSettings};

use crate::host::SimHost;
use crate::script::Command;

pub struct Session {
    data: DataDir,
    host: SimHost,
    engine: LayoutEngine,
    started: bool,
}

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ending {
    Clean,
    Crashed,
}

impl Session {
    pub fn open(data: DataDir) -> Result<Self> {
        let stored = data.bootstrap().context("failed to prepare data directory")?;
        let storage = data.storage().context("failed to open linked store")?;
        let host = SimHost::new();
        let engine = LayoutEngine::new(host.services(Box::new(storage)), stored.engine);
        Ok(Self {
            data,
            host,
            engine,
            started: false,
        })
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.engine.next_deadline()
    }

    /// Run one command and return the lines it produced.
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>> {
        let mut out = Vec::new();

        if command == Command::Crash {
            out.push(self.stamp("crash: leaving layouts linked"));
            return Ok(out);
        }

        if !command.is_host_setup() {
            self.ensure_started(&mut out)?;
        }

        match command {
            Command::Activities(all) => {
                self.host.set_activities(all);
                if self.started {
                    let report = self.engine.reload_layouts();
                    if report.skipped > 0 {
                        out.push(self.stamp(&format!(
                            "skipped {} unreadable layouts",
                            report.skipped
                        )));
                    }
                }
            }
            Command::Running(running) => self.host.set_running(running),
            Command::Current(activity) => self.host.set_current(&activity),
            Command::Start(activity) => self.host.start(&activity),
            Command::Stop(activity) => self.host.stop(&activity),
            Command::Switch(name) => {
                let line = match self.engine.switch_to(&name) {
                    Ok(SwitchOutcome::AlreadyCurrent) => format!("'{name}' is already current"),
                    Ok(SwitchOutcome::ContextSwitched(activity)) => {
                        format!("'{name}' is loaded, moved to activity {activity}")
                    }
                    Ok(SwitchOutcome::Scheduled) => format!("switching to '{name}'"),
                    Err(e) => format!("error: {e}"),
                };
                out.push(self.stamp(&line));
            }
            Command::Mode(mode) => {
                self.engine
                    .set_memory_mode(mode)
                    .with_context(|| format!("cannot change mode to {mode}"))?;
            }
            Command::Pause(name) => {
                let line = match self.engine.pause_layout(&name) {
                    Ok(n) => format!("pausing '{name}': {n} activities"),
                    Err(e) => format!("error: {e}"),
                };
                out.push(self.stamp(&line));
            }
            Command::Info(show) => self.engine.set_show_info_window(show),
            Command::Wait(ms) => {
                let until = self.engine.now_ms().saturating_add(ms);
                self.advance_to(until, &mut out);
            }
            Command::Status => out.extend(self.status()),
            Command::Flush => {
                let n = self.engine.flush_active_layouts();
                out.push(self.stamp(&format!("flushed {n} layouts")));
            }
            Command::Crash => {}
        }

        self.deliver(&mut out);
        Ok(out)
    }

    /// Advance the clock, letting the host report changes after every
    /// batch of due tasks.
    pub fn advance_to(&mut self, until: u64, out: &mut Vec<String>) {
        while let Some(deadline) = self.engine.next_deadline().filter(|d| *d <= until) {
            self.engine.advance_to(deadline);
            self.deliver(out);
        }
        self.engine.advance_to(until);
        self.deliver(out);
    }

    fn ensure_started(&mut self, out: &mut Vec<String>) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let remembered = self.engine.settings().current_layout.clone();
        let started = self.engine.start(&remembered);
        let startup = self.engine.resolve_startup_layout(&remembered);
        out.push(self.stamp(&format!("starting with '{startup}'")));
        if let Err(e) = started {
            out.push(self.stamp(&format!("error: {e}")));
        }
        self.deliver(out);
        Ok(())
    }

    /// Forward queued host changes to the engine and collect output.
    fn deliver(&mut self, out: &mut Vec<String>) {
        loop {
            let changes = self.host.take_changes();
            if changes.is_empty() || !self.started {
                break;
            }
            if changes.running {
                self.engine.on_running_activities_changed();
            }
            if let Some(current) = changes.current {
                self.engine.on_current_activity_changed(&current);
            }
        }

        for line in self.host.take_output() {
            out.push(self.stamp(&line));
        }
        for event in self.engine.take_events() {
            let json = serde_json::to_string(&event).unwrap_or_else(|e| format!("<{e}>"));
            out.push(self.stamp(&format!("event {json}")));
        }
    }

    fn stamp(&self, line: &str) -> String {
        format!("[{:>6}ms] {line}", self.engine.now_ms())
    }

    fn status(&self) -> Vec<String> {
        let e = &self.engine;
        let current = e.current_layout_name();
        vec![
            format!("mode:     {}", e.memory_mode()),
            format!("current:  {}", if current.is_empty() { "-" } else { current.as_str() }),
            format!("loaded:   {}", e.loaded_names().join(", ")),
            format!("active:   {}", e.active_layout_names().join(", ")),
            format!("menu:     {}", e.layouts_for_menu().join(", ")),
            format!("running:  {}", self.host.running().join(", ")),
            format!(
                "activity: {}",
                self.host.current().unwrap_or_else(|| "-".to_string())
            ),
            format!("pending:  {}", e.pending_tasks()),
        ]
    }

    /// Unload everything, persist settings, and release the linked store.
    pub fn shutdown(mut self, ending: Ending) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if ending == Ending::Crashed {
            self.persist_settings(self.engine.settings().clone())?;
            return Ok(out);
        }

        if self.started {
            self.engine.unload();
            self.deliver(&mut out);
        }
        self.persist_settings(self.engine.settings().clone())?;
        self.data
            .mark_clean_shutdown()
            .context("failed to release linked store")?;
        Ok(out)
    }

    fn persist_settings(&self, engine: EngineSettings) -> Result<()> {
        self.data
            .save_settings(&StoredSettings {
                version: SETTINGS_VERSION,
                engine,
            })
            .context("failed to save settings")
    }
}
