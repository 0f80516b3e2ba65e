//! Recording fakes for the engine's collaborators.
//!
//! All fakes share one `World` so a test can script the host and inspect the
//! exact order of storage/presentation/host calls.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lyt_core::{
    ActivityHost, ActivityId, ContainmentId, EngineSettings, LayoutDefinition, LayoutEngine,
    LayoutError, LayoutHandle, LayoutStorage, MULTIPLE_LAYOUTS_NAME, MemoryMode, Notifier,
    Presentation, Result, Services,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Flush(String),
    Instantiate(String),
    TearDown(String),
    Delete(Vec<String>),
    Start(String),
    Stop(String),
    SetCurrent(String),
    Notify(String),
}

#[derive(Default)]
pub struct WorldState {
    pub definitions: Vec<LayoutDefinition>,
    pub all: Vec<ActivityId>,
    pub running: Vec<ActivityId>,
    pub current: Option<ActivityId>,
    pub failing_flush: HashSet<String>,
    pub failing_load: HashSet<String>,
    pub repaired: Vec<String>,
    pub log: Vec<Call>,
}

#[derive(Clone, Default)]
pub struct World(pub Rc<RefCell<WorldState>>);

impl World {
    pub fn new() -> Self {
        let world = Self::default();
        world.add_layout(hidden(MULTIPLE_LAYOUTS_NAME));
        world
    }

    pub fn add_layout(&self, definition: LayoutDefinition) {
        self.0.borrow_mut().definitions.push(definition);
    }

    pub fn remove_layout(&self, name: &str) {
        self.0.borrow_mut().definitions.retain(|d| d.name != name);
    }

    pub fn activities(&self, all: &[&str]) {
        self.0.borrow_mut().all = ids(all);
    }

    pub fn run(&self, running: &[&str], current: Option<&str>) {
        let mut w = self.0.borrow_mut();
        w.running = ids(running);
        w.current = current.map(str::to_string);
    }

    pub fn set_current(&self, activity: &str) {
        self.0.borrow_mut().current = Some(activity.to_string());
    }

    pub fn stop(&self, activity: &str) {
        self.0.borrow_mut().running.retain(|a| a != activity);
    }

    pub fn fail_flush(&self, name: &str) {
        self.0.borrow_mut().failing_flush.insert(name.to_string());
    }

    pub fn fail_load(&self, name: &str) {
        self.0.borrow_mut().failing_load.insert(name.to_string());
    }

    pub fn log(&self) -> Vec<Call> {
        self.0.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.0.borrow().log.iter().position(|c| c == call)
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().log.iter().filter(|c| pred(c)).count()
    }

    fn push(&self, call: Call) {
        self.0.borrow_mut().log.push(call);
    }

    pub fn services(&self) -> Services {
        Services {
            storage: Box::new(FakeStorage(self.clone())),
            host: Box::new(FakeHost(self.clone())),
            presentation: Box::new(FakePresentation(self.clone())),
            notifier: Box::new(FakeNotifier(self.clone())),
        }
    }
}

pub fn ids(list: &[&str]) -> Vec<ActivityId> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn path_for(name: &str) -> PathBuf {
    PathBuf::from(format!("/layouts/{name}.layout.toml"))
}

pub fn layout(name: &str, activities: &[&str]) -> LayoutDefinition {
    LayoutDefinition::new(name, path_for(name)).with_activities(activities)
}

pub fn hidden(name: &str) -> LayoutDefinition {
    let mut d = layout(name, &[]);
    d.show_in_menu = false;
    d
}

pub fn engine(world: &World, mode: MemoryMode) -> LayoutEngine {
    let settings = EngineSettings {
        memory_mode: mode,
        ..EngineSettings::default()
    };
    LayoutEngine::new(world.services(), settings)
}

pub fn engine_with(world: &World, settings: EngineSettings) -> LayoutEngine {
    LayoutEngine::new(world.services(), settings)
}

pub struct FakeStorage(World);

impl LayoutStorage for FakeStorage {
    fn list_layout_definitions(&self) -> Vec<Result<LayoutDefinition>> {
        self.0
            .0
            .borrow()
            .definitions
            .iter()
            .cloned()
            .map(Ok)
            .collect()
    }

    fn layout_path(&self, name: &str) -> Option<PathBuf> {
        self.0
            .0
            .borrow()
            .definitions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.path.clone())
    }

    fn load_layout(&mut self, path: &Path) -> Result<LayoutHandle> {
        let definition = self
            .0
            .0
            .borrow()
            .definitions
            .iter()
            .find(|d| d.path == path)
            .cloned()
            .ok_or_else(|| LayoutError::NotFound(path.display().to_string()))?;
        if self.0.0.borrow().failing_load.contains(&definition.name) {
            return Err(LayoutError::StorageUnavailable {
                path: path.display().to_string(),
                reason: "unreadable layout file".to_string(),
            });
        }
        self.0.push(Call::Load(definition.name.clone()));
        Ok(LayoutHandle {
            containments: vec![format!("{}#1", definition.name)],
            name: definition.name,
            path: definition.path,
            last_used_activity: definition.last_used_activity,
        })
    }

    fn flush(&mut self, handle: &LayoutHandle) -> Result<()> {
        self.0.push(Call::Flush(handle.name.clone()));
        if self.0.0.borrow().failing_flush.contains(&handle.name) {
            return Err(LayoutError::StorageUnavailable {
                path: handle.path.display().to_string(),
                reason: "disk full".to_string(),
            });
        }
        Ok(())
    }

    fn delete_entries(&mut self, containments: &[ContainmentId]) -> Result<()> {
        self.0.push(Call::Delete(containments.to_vec()));
        Ok(())
    }

    fn check_repair_linked_state(&mut self) -> Result<Vec<String>> {
        Ok(std::mem::take(&mut self.0.0.borrow_mut().repaired))
    }
}

pub struct FakeHost(World);

impl ActivityHost for FakeHost {
    fn all_activities(&self) -> Vec<ActivityId> {
        self.0.0.borrow().all.clone()
    }

    fn running_activities(&self) -> Vec<ActivityId> {
        self.0.0.borrow().running.clone()
    }

    fn current_activity(&self) -> Option<ActivityId> {
        self.0.0.borrow().current.clone()
    }

    fn start_activity(&mut self, id: &str) {
        self.0.push(Call::Start(id.to_string()));
        let mut w = self.0.0.borrow_mut();
        if !w.running.iter().any(|a| a == id) {
            w.running.push(id.to_string());
        }
    }

    fn stop_activity(&mut self, id: &str) {
        self.0.push(Call::Stop(id.to_string()));
        self.0.0.borrow_mut().running.retain(|a| a != id);
    }

    fn set_current_activity(&mut self, id: &str) {
        self.0.push(Call::SetCurrent(id.to_string()));
        self.0.0.borrow_mut().current = Some(id.to_string());
    }
}

pub struct FakePresentation(World);

impl Presentation for FakePresentation {
    fn instantiate_surfaces(&mut self, handle: &LayoutHandle) {
        self.0.push(Call::Instantiate(handle.name.clone()));
    }

    fn tear_down_surfaces(&mut self, handle: &LayoutHandle) -> Vec<ContainmentId> {
        self.0.push(Call::TearDown(handle.name.clone()));
        handle.containments.clone()
    }
}

pub struct FakeNotifier(World);

impl Notifier for FakeNotifier {
    fn notify(&mut self, message: &str, _duration_ms: u64, _activities: &[ActivityId]) {
        self.0.push(Call::Notify(message.to_string()));
    }
}
