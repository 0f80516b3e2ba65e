use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout name could not be resolved to a storage location.
    NotFound(String),
    /// A layout definition or handle could not be read or written.
    StorageUnavailable { path: String, reason: String },
    /// A deferred task's precondition no longer held when it fired.
    StaleTransition(String),
    /// A previous run ended mid-transition; the listed layouts were repaired.
    InconsistentLinkedState(Vec<String>),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::NotFound(name) => write!(f, "layout not found: {name}"),
            LayoutError::StorageUnavailable { path, reason } => {
                write!(f, "storage unavailable for {path}: {reason}")
            }
            LayoutError::StaleTransition(reason) => write!(f, "stale transition: {reason}"),
            LayoutError::InconsistentLinkedState(names) => write!(
                f,
                "previous session did not close properly, repaired: [{}]",
                names.join(",")
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

pub type Result<T> = std::result::Result<T, LayoutError>;
