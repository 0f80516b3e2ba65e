/// Name of the infrastructure layout that is always loaded in Multiple mode.
/// The leading dot keeps it out of user-facing layout lists.
pub const MULTIPLE_LAYOUTS_NAME: &str = ".multiple-layouts";

/// Delay between a switch request and its staged transition (ms).
pub const STAGED_TRANSITION_DELAY_MS: u64 = 350;

/// Spacing between consecutive activity start/stop requests (ms).
pub const ACTIVITY_STAGGER_MS: u64 = 1000;

/// Debounce interval when the pre-switch notice is shown (ms).
pub const DEBOUNCE_WITH_NOTICE_MS: u64 = 2300;

/// Debounce interval when the pre-switch notice is disabled (ms).
pub const DEBOUNCE_WITHOUT_NOTICE_MS: u64 = 1800;

/// Delay between confirming a dynamic switch and executing it (ms).
pub const CONFIRM_SWITCH_DELAY_MS: u64 = 500;

/// Display time of the "switching to layout" notice (ms).
pub const SWITCH_NOTICE_MS: u64 = 4000;

/// Display time of the "activating layout" notice (ms).
pub const ACTIVATION_NOTICE_MS: u64 = 5000;

/// Display time of the startup linked-state warning (ms).
pub const LINKED_STATE_WARNING_MS: u64 = 8000;
