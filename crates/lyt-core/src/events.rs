use serde::Serialize;

use crate::settings::MemoryMode;

/// Change notifications queued by the engine for its embedder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "value", rename_all = "snake_case")]
pub enum EngineEvent {
    CatalogChanged,
    MenuChanged,
    ActiveSetChanged,
    CurrentNameChanged(String),
    /// Emitted before a layout is unloaded so views can play exit animations.
    LayoutIsAboutToSwitch(String),
    MemoryModeChanged(MemoryMode),
}
