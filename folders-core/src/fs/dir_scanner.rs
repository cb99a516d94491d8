//! src/fs/dir_scanner.rs
//! ============================================================================
//! # Directory Scanner: Asynchronous Full Listing
//!
//! Produces a fully populated, sorted [`OrderedIconList`] for one directory.
//! Runs off the synchronous control path so a slow or large listing never
//! blocks the host; the synchronizer installs the result on completion.

use std::path::PathBuf;
use std::time::Instant;

use tokio::fs::{self, ReadDir};
use tracing::{debug, info, warn};

use crate::config::FoldersConfig;
use crate::error::AppError;
use crate::fs::desktop_entry;
use crate::fs::file_info::FileInfoResolver;
use crate::model::icon_list::OrderedIconList;

/// Scans `config.directory` and returns the icon list sorted under the
/// configured mode. Name and type listings come back with integer order
/// keys; date and size listings keep the resolved keys.
///
/// Entries that vanish between enumeration and resolution are skipped
/// silently; per-entry metadata failures are logged and skipped.
pub async fn scan_dir(
    config: &FoldersConfig,
    resolver: &FileInfoResolver,
) -> Result<OrderedIconList, AppError> {
    let start_time = Instant::now();

    let mut list = OrderedIconList::new();
    let mut read_dir: ReadDir = fs::read_dir(&config.directory).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let entry_path: PathBuf = entry.path();

        let file_name: &str = entry_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if !config.show_hidden && file_name.starts_with('.') {
            continue;
        }

        if list.len() >= config.max_entries {
            warn!(
                "Listing of {:?} truncated at {} entries",
                config.directory, config.max_entries
            );
            break;
        }

        match resolver
            .resolve_async(&entry_path, config.sort_by, config.folders_first)
            .await
        {
            Ok(mut record) => {
                if desktop_entry::is_shortcut(&entry_path) {
                    desktop_entry::apply_shortcut(&entry_path, &mut record, resolver.theme());
                }
                list.push(record);
            }

            Err(AppError::NotFound(_)) => {
                debug!("Entry vanished during scan: {:?}", entry_path);
            }

            Err(e) => {
                // Log the error but continue processing other entries
                info!("Failed to resolve {:?}: {}", entry_path, e);
            }
        }
    }

    list.sort_by(config.sort_by.comparator());
    if !config.sort_by.uses_resolved_key() {
        // Positional keys start out as exact integers; date and size keys
        // stay the resolved values so later events compare against them.
        list.renumber();
    }

    info!(
        entries = list.len(),
        "Scanned {:?} in {:?}",
        config.directory,
        start_time.elapsed()
    );

    Ok(list)
}
