pub mod error;

pub mod config;

pub mod fs {
    pub mod desktop_entry;

    pub mod dir_scanner;

    pub mod file_info;
    pub use file_info::FileInfoResolver;

    pub mod icon_record;
    pub use icon_record::{IconGroup, IconRecord, SortMode};

    pub mod icon_theme;
    pub use icon_theme::IconTheme;

    pub mod watcher;
    pub use watcher::DirectoryWatcher;
}

pub mod model {
    pub mod icon_list;
    pub use icon_list::OrderedIconList;
}

pub mod controller {
    pub mod events;
    pub use events::{FileEvent, FileEventKind, IconSignal, SyncEvent};

    pub mod synchronizer;
    pub use synchronizer::{SyncState, Synchronizer};
}

pub mod logging;
pub use logging::Logger;

pub use config::FoldersConfig;
pub use error::AppError;

pub use controller::{IconSignal, SyncState, Synchronizer};
pub use fs::{IconRecord, IconTheme, SortMode};
pub use model::OrderedIconList;
