pub mod data_dir;
pub mod directory;
pub mod error;
pub mod layout_file;
pub mod linked;
pub mod schema;
pub mod settings;
pub mod storage;

pub use data_dir::{DataDir, FIRST_LAYOUT_NAME, default_base_dir};
pub use directory::LayoutDirectory;
pub use error::{Result, StoreError};
pub use layout_file::{ContainmentEntry, LayoutFile};
pub use linked::LinkedStore;
pub use settings::{SETTINGS_VERSION, StoredSettings};
pub use storage::FileStorage;
