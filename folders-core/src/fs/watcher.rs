//! src/fs/watcher.rs
//! ============================================================================
//! # DirectoryWatcher: Filesystem Change Subscription for One Directory
//!
//! Bridges `notify`'s native watcher into the synchronizer's event channel.
//! The watcher callback runs on notify's own thread and only ever *sends*
//! messages; all list mutation stays on the synchronizer's event loop, which
//! keeps the single-owner mutation model intact without locking.
//!
//! Dropping the subscription unregisters the watch.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::controller::events::{FileEvent, FileEventKind, SyncEvent};
use crate::error::AppError;

/// One live watch subscription. At most one exists per synchronizer.
pub struct DirectoryWatcher {
    path: PathBuf,
    watcher: RecommendedWatcher,
}

impl DirectoryWatcher {
    /// Subscribe to change notifications for `path` (non-recursive: the
    /// icon list models exactly one directory level) and forward discrete
    /// events into `tx`.
    pub fn watch(path: &Path, tx: UnboundedSender<SyncEvent>) -> Result<Self, AppError> {
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                match res {
                    Ok(event) => {
                        for file_event in translate(&event) {
                            // Send failure means the synchronizer is gone;
                            // nothing left to notify.
                            let _ = tx.send(SyncEvent::File(file_event));
                        }
                    }
                    Err(e) => warn!("Watch delivery error: {e}"),
                }
            })?;

        watcher.watch(path, RecursiveMode::NonRecursive)?;
        debug!("Watching {:?}", path);

        Ok(Self {
            path: path.to_path_buf(),
            watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.watcher.unwatch(&self.path) {
            // The kernel already dropped the watch when the directory
            // itself was deleted.
            debug!("Unwatch {:?}: {e}", self.path);
        }
    }
}

/// Map a raw notify event onto the three discrete kinds the synchronizer
/// consumes. Renames surface as delete+create pairs, matching how the
/// event-handling logic resolves them.
fn translate(event: &notify::Event) -> Vec<FileEvent> {
    match &event.kind {
        EventKind::Create(_) => each_path(event, FileEventKind::Created),

        EventKind::Remove(_) => each_path(event, FileEventKind::Deleted),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => each_path(event, FileEventKind::Deleted),
            RenameMode::To => each_path(event, FileEventKind::Created),
            RenameMode::Both => {
                let mut out = Vec::with_capacity(2);
                if let Some(from) = event.paths.first() {
                    out.push(FileEvent::new(FileEventKind::Deleted, from.clone()));
                }
                if let Some(to) = event.paths.get(1) {
                    out.push(FileEvent::new(FileEventKind::Created, to.clone()));
                }
                out
            }
            _ => each_path(event, FileEventKind::Modified),
        },

        EventKind::Modify(_) => each_path(event, FileEventKind::Modified),

        // Access and catch-all kinds carry nothing the list cares about.
        EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
    }
}

fn each_path(event: &notify::Event, kind: FileEventKind) -> Vec<FileEvent> {
    event
        .paths
        .iter()
        .map(|p| FileEvent::new(kind, p.clone()))
        .collect()
}
