//! src/controller/events.rs
//! ============================================================================
//! # Events: Messages Into and Out of the Synchronizer
//!
//! Every notification that can mutate the icon list arrives as a [`SyncEvent`]
//! on the synchronizer's single channel, regardless of which execution
//! context produced it (watcher callback thread, scan task). Outbound,
//! [`IconSignal`] messages tell the display collaborator what changed.

use std::path::PathBuf;

use crate::error::AppError;
use crate::fs::icon_record::IconRecord;
use crate::model::icon_list::OrderedIconList;

/// Discrete filesystem change, identified by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEventKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub kind: FileEventKind,
    pub path: PathBuf,
}

impl FileEvent {
    pub fn new(kind: FileEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Inbound message for the synchronizer's event-handling entry point.
#[derive(Debug)]
pub enum SyncEvent {
    /// A filesystem change delivered by the directory watcher.
    File(FileEvent),

    /// A scan task finished. `generation` identifies which task; completions
    /// from discarded tasks carry a stale generation and are dropped.
    ScanCompleted {
        generation: u64,
        result: Result<OrderedIconList, AppError>,
    },
}

/// Outbound signal to the display collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum IconSignal {
    IconAdded(IconRecord),

    IconRemoved(IconRecord),

    /// The record's glyph changed and its image was already loaded.
    IconImageChanged(IconRecord),

    /// The record moved to a new position within the list.
    IconReordered(IconRecord),

    /// A full resort finished; layout should be recomputed wholesale.
    ResortComplete,
}
