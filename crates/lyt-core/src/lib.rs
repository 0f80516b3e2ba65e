//! Layout lifecycle engine.
//!
//! Decides which persisted layouts must be loaded for the activities a host
//! reports, which single layout is current, and how to move safely between
//! states: unloads (with flush) strictly before loads, debounced dynamic
//! switching in Single mode, and minimal reconciliation in Multiple mode.
//!
//! Zero I/O. Storage, the activity host, presentation and notifications are
//! collaborators behind the traits in [`collaborators`]; deferred work runs on
//! a virtual clock the embedder advances.

pub mod assignment;
pub mod collaborators;
pub mod constants;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod events;
pub mod layout;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod sync;

pub use assignment::AssignmentMap;
pub use collaborators::{
    ActivityHost, ActivityId, ContainmentId, LayoutHandle, LayoutStorage, Notifier, Presentation,
    Services,
};
pub use constants::MULTIPLE_LAYOUTS_NAME;
pub use debounce::should_switch;
pub use engine::{EngineState, LayoutEngine, SwitchOutcome};
pub use error::{LayoutError, Result};
pub use events::EngineEvent;
pub use layout::{Layout, SharedLayout};
pub use registry::{LayoutDefinition, LayoutRegistry, ReloadReport};
pub use scheduler::{Guard, Scheduler, Task};
pub use settings::{EngineSettings, MemoryMode};
pub use sync::{LoadedSummary, SyncEdit, SyncInput, plan_sync};
