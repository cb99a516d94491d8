//! src/controller/synchronizer.rs
//! ============================================================================
//! # Synchronizer: Directory → Icon List State Machine
//!
//! Owns the live [`OrderedIconList`] for one watched directory and is the
//! only component that mutates it. Progresses `Idle → Scanning → Watching`
//! and back: `start` launches an asynchronous scan carrying a config
//! snapshot, scan completion installs the list and activates the watcher,
//! and every subsequent filesystem event mutates the list incrementally.
//!
//! All notifications arrive as [`SyncEvent`] messages on one channel, so
//! mutation stays single-threaded-apparent no matter which execution
//! context produced the event. A scan completion carrying a stale
//! generation (its task was discarded) is dropped without touching state.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::FoldersConfig;
use crate::controller::events::{FileEvent, FileEventKind, IconSignal, SyncEvent};
use crate::error::AppError;
use crate::fs::dir_scanner::scan_dir;
use crate::fs::file_info::FileInfoResolver;
use crate::fs::icon_record::SortMode;
use crate::fs::icon_theme::IconTheme;
use crate::fs::watcher::DirectoryWatcher;
use crate::model::icon_list::OrderedIconList;

/// Incremental placements tolerated before the positional order keys are
/// renormalized. Midpoint insertion halves the spacing between two
/// neighbours, so a long run of edits without a full resort eventually
/// exhausts the keys' float precision.
const RENUMBER_EDIT_LIMIT: u32 = 32;

/// Lifecycle state of one synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No watch, no scan.
    Idle,

    /// A scan task is in flight.
    Scanning,

    /// Subscription active, list live.
    Watching,
}

/// One in-flight directory listing. Discarding aborts the task *and* bumps
/// the generation, so a completion that already left the task is dropped.
struct ScanTask {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct Synchronizer {
    config: FoldersConfig,
    theme: Arc<IconTheme>,
    resolver: FileInfoResolver,

    state: SyncState,
    list: OrderedIconList,
    scan_task: Option<ScanTask>,
    next_generation: u64,
    subscription: Option<DirectoryWatcher>,
    edits_since_renumber: u32,

    event_tx: UnboundedSender<SyncEvent>,
    event_rx: UnboundedReceiver<SyncEvent>,
    signal_tx: UnboundedSender<IconSignal>,
}

impl Synchronizer {
    pub fn new(
        config: FoldersConfig,
        theme: Arc<IconTheme>,
        signal_tx: UnboundedSender<IconSignal>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            resolver: FileInfoResolver::new(theme.clone()),
            config,
            theme,
            state: SyncState::Idle,
            list: OrderedIconList::new(),
            scan_task: None,
            next_generation: 0,
            subscription: None,
            edits_since_renumber: 0,
            event_tx,
            event_rx,
            signal_tx,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn icons(&self) -> &OrderedIconList {
        &self.list
    }

    pub fn sort_mode(&self) -> SortMode {
        self.config.sort_by
    }

    /// Sender for injecting events from other contexts (the watcher uses a
    /// clone of this).
    pub fn event_sender(&self) -> UnboundedSender<SyncEvent> {
        self.event_tx.clone()
    }

    /// Begin (or restart) watching under `config`. Any prior scan task and
    /// subscription are discarded first, making restart idempotent. The
    /// scan launches after the configured delay, carrying a snapshot of the
    /// config so later edits never bleed into a listing in flight.
    pub fn start(&mut self, config: FoldersConfig) {
        self.discard_scan();
        self.subscription = None;
        self.config = config;

        self.next_generation += 1;
        let generation = self.next_generation;

        let snapshot = self.config.clone();
        let theme = self.theme.clone();
        let tx = self.event_tx.clone();

        let handle = tokio::spawn(async move {
            if !snapshot.launch_delay.is_zero() {
                tokio::time::sleep(snapshot.launch_delay).await;
            }

            let resolver = FileInfoResolver::new(theme);
            let result = scan_dir(&snapshot, &resolver).await;

            // Send failure means the synchronizer is gone; nothing to do.
            let _ = tx.send(SyncEvent::ScanCompleted { generation, result });
        });

        self.scan_task = Some(ScanTask { generation, handle });
        self.state = SyncState::Scanning;
        info!("Scanning {:?}", self.config.directory);
    }

    /// Cancel any pending scan, drop the subscription, destroy all records.
    pub fn stop(&mut self) {
        info!("Stopping watch on {:?}", self.config.directory);
        self.teardown();
    }

    /// Await the next inbound event. `run` is a plain drain loop over this.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.event_rx.recv().await
    }

    /// Drive the synchronizer until every event sender is gone.
    pub async fn run(&mut self) {
        while let Some(event) = self.next_event().await {
            self.handle_event(event);
        }
    }

    /// Single mutation entry point for every inbound notification.
    pub fn handle_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::ScanCompleted { generation, result } => {
                self.on_scan_completed(generation, result);
            }
            SyncEvent::File(file_event) => self.on_file_event(file_event),
        }
    }

    /// Mark a record's glyph image as loaded by the display side. Later
    /// glyph changes on that record emit [`IconSignal::IconImageChanged`].
    pub fn mark_image_loaded(&mut self, path: &Path) {
        if let Some(index) = self.list.position_by_path(path)
            && let Some(record) = self.list.get_mut(index)
        {
            record.image_loaded = true;
        }
    }

    /// Global resort under a newly selected mode. Date and size keys are
    /// re-resolved per record first (they are not incrementally maintained)
    /// and stay the resolved values; name and type sorts renumber every
    /// group back to exact integers. The mode becomes the active one for
    /// subsequent events but is never persisted.
    pub fn sort_icons(&mut self, mode: SortMode) {
        if self.list.is_empty() {
            // nothing to do.
            return;
        }

        if mode.uses_resolved_key() {
            for index in 0..self.list.len() {
                let path = self.list.get(index).map(|r| r.path.clone());
                let Some(path) = path else { break };

                match FileInfoResolver::resolve_order_key(&path, mode) {
                    Ok(key) => {
                        if let Some(record) = self.list.get_mut(index) {
                            record.order = key;
                        }
                    }
                    // Entry vanished mid-resort; its stale key still sorts.
                    Err(e) => debug!("Keeping stale key for {:?}: {e}", path),
                }
            }
        }

        self.list.sort_by(mode.comparator());
        if !mode.uses_resolved_key() {
            self.list.renumber();
        }
        self.edits_since_renumber = 0;
        self.send_signal(IconSignal::ResortComplete);

        self.config.sort_by = mode;
        info!("Resorted {} icons by {:?}", self.list.len(), mode);
    }

    // ------------------------------------------------------------------
    // Scan lifecycle
    // ------------------------------------------------------------------

    fn on_scan_completed(&mut self, generation: u64, result: Result<OrderedIconList, AppError>) {
        let live = self
            .scan_task
            .as_ref()
            .is_some_and(|t| t.generation == generation);
        if !live {
            debug!("Discarding completion of cancelled scan #{generation}");
            return;
        }
        self.scan_task = None;

        let list = match result {
            Ok(list) => list,
            Err(e) => {
                warn!("Scan of {:?} failed: {e}", self.config.directory);
                self.teardown();
                return;
            }
        };

        // Replace any previously displayed content wholesale.
        for old in self.list.drain_all() {
            self.send_signal(IconSignal::IconRemoved(old));
        }

        self.list = list;
        self.edits_since_renumber = 0;
        for record in self.list.iter() {
            self.send_signal(IconSignal::IconAdded(record.clone()));
        }

        match DirectoryWatcher::watch(&self.config.directory, self.event_tx.clone()) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
                self.state = SyncState::Watching;
                info!(
                    icons = self.list.len(),
                    "Watching {:?}", self.config.directory
                );
            }
            Err(e) => {
                warn!("Cannot watch {:?}: {e}", self.config.directory);
                self.teardown();
            }
        }
    }

    // ------------------------------------------------------------------
    // Filesystem events
    // ------------------------------------------------------------------

    fn on_file_event(&mut self, event: FileEvent) {
        if self.state != SyncState::Watching {
            debug!("Ignoring {:?} while {:?}", event.kind, self.state);
            return;
        }

        // The watched directory itself comes first, ahead of any filtering.
        if event.path == self.config.directory {
            match event.kind {
                FileEventKind::Deleted => {
                    info!("Watched folder {:?} was removed", event.path);
                    self.teardown();
                    return;
                }
                FileEventKind::Created => {
                    info!("Watched folder {:?} re-created, rescanning", event.path);
                    self.start(self.config.clone());
                    return;
                }
                FileEventKind::Modified => {}
            }
        }

        let name = base_name(&event.path);
        if !self.config.show_hidden && name.starts_with('.') {
            return;
        }

        match event.kind {
            FileEventKind::Created => self.on_created(&event.path),
            FileEventKind::Deleted => self.on_deleted(&event.path, name),
            FileEventKind::Modified => self.on_modified(&event.path, name),
        }
    }

    fn on_created(&mut self, path: &Path) {
        if let Some(existing) = self.list.find_by_path(path) {
            warn!("This file ({}) already exists", existing.name);
            return;
        }

        let record = match self.resolver.resolve_with_shortcut(
            path,
            self.config.sort_by,
            self.config.folders_first,
        ) {
            Ok(record) => record,
            Err(AppError::NotFound(_)) => {
                debug!("Created entry vanished before resolution: {:?}", path);
                return;
            }
            Err(e) => {
                warn!("Couldn't create an icon for this file: {e}");
                return;
            }
        };

        let index = self
            .list
            .insert_sorted(record, self.config.sort_by.comparator());
        self.note_edit();
        let added = self.list.get(index).cloned();

        if let Some(added) = added {
            debug!("New file: {} (order {:.2})", added.name, added.order);
            self.send_signal(IconSignal::IconAdded(added));
        }
    }

    fn on_deleted(&mut self, path: &Path, name: &str) {
        let Some(index) = self.locate(path, name) else {
            warn!("An unknown file was removed: {:?}", path);
            return;
        };

        let removed = self.list.remove_at(index);
        debug!("{} will be removed", removed.name);
        self.send_signal(IconSignal::IconRemoved(removed));
    }

    fn on_modified(&mut self, path: &Path, name: &str) {
        let Some(index) = self.locate(path, name) else {
            warn!("An unknown file was modified: {:?}", path);
            return;
        };

        let fresh = match self.resolver.resolve_with_shortcut(
            path,
            self.config.sort_by,
            self.config.folders_first,
        ) {
            Ok(record) => record,
            Err(AppError::NotFound(_)) => {
                debug!("Modified entry vanished before resolution: {:?}", path);
                return;
            }
            Err(e) => {
                warn!("Couldn't refresh the icon for this file: {e}");
                return;
            }
        };

        let comp = self.config.sort_by.comparator();
        let adopt_key = self.config.sort_by.uses_resolved_key();

        let Some(record) = self.list.get_mut(index) else {
            return;
        };
        let old_order = record.order;
        let old_group = record.group;

        // A name-fallback hit means the entry now lives at the event path.
        record.path = fresh.path.clone();
        record.is_dir = fresh.is_dir;
        record.volume_id = fresh.volume_id;
        record.group = fresh.group;
        record.size = fresh.size;
        record.modified = fresh.modified;
        record.extension = fresh.extension.clone();

        // Date/size keys are not incrementally maintained.
        if adopt_key {
            record.order = fresh.order;
        }

        let name_changed = record.name != fresh.name;
        if name_changed {
            debug!("Name changed: '{}' -> '{}'", record.name, fresh.name);
            record.name = fresh.name.clone();
        }

        let mut image_changed = None;
        if record.glyph_path != fresh.glyph_path {
            record.glyph_path = fresh.glyph_path.clone();

            if record.image_loaded {
                image_changed = Some(record.clone());
            }
        }

        let group_changed = record.group != old_group;
        let snapshot = record.clone();

        if let Some(changed) = image_changed {
            self.send_signal(IconSignal::IconImageChanged(changed));
        }

        // A changed name or group invalidates a positional placement; an
        // adopted date or size key already carries the new position.
        if !adopt_key && (name_changed || group_changed) {
            let new_order = self.list.place_for(&snapshot, Some(index), comp);
            if let Some(record) = self.list.get_mut(index) {
                record.order = new_order;
            }
        }

        let final_order = self.list.get(index).map_or(old_order, |r| r.order);
        if final_order != old_order || group_changed {
            debug!("Order changed: {old_order:.2} -> {final_order:.2}");
            let new_index = self.list.reposition(index);
            self.note_edit();

            let moved = self.list.get(new_index).cloned();
            if let Some(moved) = moved {
                self.send_signal(IconSignal::IconReordered(moved));
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Path lookup with display-name fallback (rename races surface as
    /// events for paths the list no longer tracks).
    fn locate(&self, path: &Path, name: &str) -> Option<usize> {
        self.list
            .position_by_path(path)
            .or_else(|| self.list.position_by_name(name))
    }

    /// Count one incremental placement. Positional keys (name and type
    /// modes) drift toward precision exhaustion under long edit runs, so
    /// they are renormalized after a bounded number of edits; resolved date
    /// and size keys never drift that way.
    fn note_edit(&mut self) {
        if self.config.sort_by.uses_resolved_key() {
            return;
        }

        self.edits_since_renumber += 1;
        if self.edits_since_renumber >= RENUMBER_EDIT_LIMIT {
            debug!(
                "Renormalizing order keys after {} incremental edits",
                self.edits_since_renumber
            );
            self.list.renumber();
            self.edits_since_renumber = 0;
        }
    }

    fn discard_scan(&mut self) {
        if let Some(task) = self.scan_task.take() {
            debug!("Discarding scan #{}", task.generation);
            task.handle.abort();
        }
    }

    /// Full teardown: cancel the scan, remove the subscription, destroy all
    /// records, return to `Idle`.
    fn teardown(&mut self) {
        self.discard_scan();
        self.subscription = None;

        for record in self.list.drain_all() {
            self.send_signal(IconSignal::IconRemoved(record));
        }

        self.edits_since_renumber = 0;
        self.state = SyncState::Idle;
    }

    fn send_signal(&self, signal: IconSignal) {
        // A dropped display side must not stall the engine.
        self.signal_tx.send(signal).ok();
    }
}

fn base_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_config(dir: &Path) -> FoldersConfig {
        FoldersConfig {
            directory: dir.to_path_buf(),
            launch_delay: Duration::ZERO,
            ..FoldersConfig::default()
        }
    }

    fn fixture(config: FoldersConfig) -> (Synchronizer, UnboundedReceiver<IconSignal>) {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let sync = Synchronizer::new(config, Arc::new(IconTheme::new(48)), signal_tx);
        (sync, signal_rx)
    }

    /// Run the start → scan → install → watch sequence to completion.
    async fn start_watching(sync: &mut Synchronizer, config: FoldersConfig) {
        sync.start(config);
        let event = sync.next_event().await.expect("scan completion");
        sync.handle_event(event);
        assert_eq!(sync.state(), SyncState::Watching);
    }

    fn created(path: PathBuf) -> SyncEvent {
        SyncEvent::File(FileEvent::new(FileEventKind::Created, path))
    }

    fn deleted(path: PathBuf) -> SyncEvent {
        SyncEvent::File(FileEvent::new(FileEventKind::Deleted, path))
    }

    fn modified(path: PathBuf) -> SyncEvent {
        SyncEvent::File(FileEvent::new(FileEventKind::Modified, path))
    }

    fn drain(rx: &mut UnboundedReceiver<IconSignal>) -> Vec<IconSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = rx.try_recv() {
            out.push(signal);
        }
        out
    }

    fn list_names(sync: &Synchronizer) -> Vec<String> {
        sync.icons().iter().map(|r| r.name.to_string()).collect()
    }

    #[tokio::test]
    async fn test_hidden_create_is_filtered() {
        // Scenario: empty directory, show_hidden = false.
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        sync.handle_event(created(dir.path().join(".hidden")));

        assert!(sync.icons().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_creates_insert_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        for name in ["a.txt", "b.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
            sync.handle_event(created(dir.path().join(name)));
        }
        assert_eq!(list_names(&sync), vec!["a.txt", "b.txt"]);

        fs::write(dir.path().join("aa.txt"), b"x").unwrap();
        sync.handle_event(created(dir.path().join("aa.txt")));
        assert_eq!(list_names(&sync), vec!["a.txt", "aa.txt", "b.txt"]);

        let added: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|s| matches!(s, IconSignal::IconAdded(_)))
            .collect();
        assert_eq!(added.len(), 3);
    }

    #[tokio::test]
    async fn test_modify_of_unknown_path_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("known.txt"), b"k").unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        sync.handle_event(modified(dir.path().join("phantom.txt")));

        assert_eq!(list_names(&sync), vec!["known.txt"]);
        assert!(drain(&mut rx).is_empty());
        assert_eq!(sync.state(), SyncState::Watching);
    }

    #[tokio::test]
    async fn test_root_deletion_tears_down_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        sync.handle_event(deleted(dir.path().to_path_buf()));

        assert_eq!(sync.state(), SyncState::Idle);
        assert!(sync.icons().is_empty());
        assert!(sync.subscription.is_none());

        let removed = drain(&mut rx);
        assert_eq!(removed.len(), 2);
        assert!(removed
            .iter()
            .all(|s| matches!(s, IconSignal::IconRemoved(_))));
    }

    #[tokio::test]
    async fn test_duplicate_create_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        let path = dir.path().join("once.txt");
        fs::write(&path, b"1").unwrap();

        sync.handle_event(created(path.clone()));
        sync.handle_event(created(path.clone()));

        assert_eq!(sync.icons().len(), 1);
        let added: Vec<_> = drain(&mut rx)
            .into_iter()
            .filter(|s| matches!(s, IconSignal::IconAdded(_)))
            .collect();
        assert_eq!(added.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_falls_back_to_name_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracked.txt");
        fs::write(&path, b"t").unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        // Delete reported under a path the list never tracked, but whose
        // base name matches the record's display name.
        let other = dir.path().join("sub").join("tracked.txt");
        sync.handle_event(deleted(other));

        assert!(sync.icons().is_empty());
    }

    #[tokio::test]
    async fn test_replay_yields_live_set() {
        // Whatever the interleaving, the final path set is the live set.
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, _rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;

        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
            sync.handle_event(created(dir.path().join(name)));
        }
        sync.handle_event(deleted(dir.path().join("b.txt")));
        sync.handle_event(modified(dir.path().join("a.txt")));
        fs::write(dir.path().join("d.txt"), b"x").unwrap();
        sync.handle_event(created(dir.path().join("d.txt")));
        sync.handle_event(deleted(dir.path().join("a.txt")));

        assert_eq!(list_names(&sync), vec!["c.txt", "d.txt"]);
        assert!(sync.icons().is_consistent());
    }

    #[tokio::test]
    async fn test_shortcut_rename_repositions_record() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["aaa.txt", "zzz.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let shortcut = dir.path().join("app.desktop");
        fs::write(&shortcut, "[Desktop Entry]\nName=mmm\n").unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);
        assert_eq!(list_names(&sync), vec!["aaa.txt", "mmm", "zzz.txt"]);

        // The shortcut's display name changes; the record must move.
        fs::write(&shortcut, "[Desktop Entry]\nName=zzzz\n").unwrap();
        sync.handle_event(modified(shortcut));

        assert_eq!(list_names(&sync), vec!["aaa.txt", "zzz.txt", "zzzz"]);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|s| matches!(s, IconSignal::IconReordered(_)))
        );
    }

    #[tokio::test]
    async fn test_stale_scan_completion_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, _rx) = fixture(test_config(dir.path()));

        sync.start(test_config(dir.path()));
        assert_eq!(sync.state(), SyncState::Scanning);

        // A completion from a generation that was never issued to the
        // current task must not install anything.
        sync.handle_event(SyncEvent::ScanCompleted {
            generation: 0,
            result: Ok(OrderedIconList::new()),
        });
        assert_eq!(sync.state(), SyncState::Scanning);

        // The real completion still lands.
        let event = sync.next_event().await.unwrap();
        sync.handle_event(event);
        assert_eq!(sync.state(), SyncState::Watching);
    }

    #[tokio::test]
    async fn test_restart_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let (mut sync, _rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;

        // Root re-created: the machine goes back through Scanning and
        // installs a fresh listing.
        sync.handle_event(created(dir.path().to_path_buf()));
        assert_eq!(sync.state(), SyncState::Scanning);

        let event = sync.next_event().await.unwrap();
        sync.handle_event(event);
        assert_eq!(sync.state(), SyncState::Watching);
        assert_eq!(list_names(&sync), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_stop_discards_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        sync.stop();

        assert_eq!(sync.state(), SyncState::Idle);
        assert!(sync.icons().is_empty());
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[tokio::test]
    async fn test_sort_icons_by_size_reorders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("apple.bin"), vec![0u8; 500]).unwrap();
        fs::write(dir.path().join("zebra.bin"), vec![0u8; 5]).unwrap();

        let (mut sync, mut rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);
        assert_eq!(list_names(&sync), vec!["apple.bin", "zebra.bin"]);

        sync.sort_icons(SortMode::Size);
        assert_eq!(sync.sort_mode(), SortMode::Size);
        assert_eq!(list_names(&sync), vec!["zebra.bin", "apple.bin"]);
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [IconSignal::ResortComplete]
        ));

        // Size keys stay the resolved byte counts, so later events compare
        // against real sizes.
        let orders: Vec<f64> = sync.icons().iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![5.0, 500.0]);
    }

    #[tokio::test]
    async fn test_size_change_adopts_fresh_key_and_reorders() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("first.bin"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("second.bin"), vec![0u8; 100]).unwrap();

        let mut cfg = test_config(dir.path());
        cfg.sort_by = SortMode::Size;
        let (mut sync, mut rx) = fixture(cfg.clone());
        start_watching(&mut sync, cfg).await;
        drain(&mut rx);
        assert_eq!(list_names(&sync), vec!["first.bin", "second.bin"]);

        // first.bin outgrows second.bin.
        fs::write(dir.path().join("first.bin"), vec![0u8; 500]).unwrap();
        sync.handle_event(modified(dir.path().join("first.bin")));

        assert_eq!(list_names(&sync), vec!["second.bin", "first.bin"]);
        assert_eq!(sync.icons().get(1).unwrap().order, 500.0);
        assert!(
            drain(&mut rx)
                .iter()
                .any(|s| matches!(s, IconSignal::IconReordered(_)))
        );
    }

    #[tokio::test]
    async fn test_long_edit_runs_renormalize_keys() {
        let dir = tempfile::tempdir().unwrap();
        let (mut sync, _rx) = fixture(test_config(dir.path()));
        start_watching(&mut sync, test_config(dir.path())).await;

        // Every insert lands between the previous newest file and z.txt,
        // halving the key gap each time; the engine renumbers before float
        // precision can collapse a gap.
        fs::write(dir.path().join("z.txt"), b"z").unwrap();
        sync.handle_event(created(dir.path().join("z.txt")));
        for i in 0..40 {
            let name = format!("m{i:03}.txt");
            fs::write(dir.path().join(&name), b"x").unwrap();
            sync.handle_event(created(dir.path().join(name)));
        }

        assert!(sync.icons().is_consistent());
        let orders: Vec<f64> = sync.icons().iter().map(|r| r.order).collect();
        assert!(orders.windows(2).all(|w| w[1] > w[0]));
    }

    #[tokio::test]
    async fn test_image_change_signal_requires_loaded_image() {
        let icons = tempfile::tempdir().unwrap();
        fs::write(icons.path().join("first.png"), b"png").unwrap();
        fs::write(icons.path().join("second.png"), b"png").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let shortcut = dir.path().join("app.desktop");
        fs::write(&shortcut, "[Desktop Entry]\nName=App\nIcon=first\n").unwrap();

        let (signal_tx, mut rx) = mpsc::unbounded_channel();
        let theme = Arc::new(IconTheme::new(48));
        theme.build_index_from(&[icons.path().to_path_buf()]);
        let mut sync = Synchronizer::new(test_config(dir.path()), theme, signal_tx);

        start_watching(&mut sync, test_config(dir.path())).await;
        drain(&mut rx);

        // Not loaded yet: glyph change stays silent.
        fs::write(&shortcut, "[Desktop Entry]\nName=App\nIcon=second\n").unwrap();
        sync.handle_event(modified(shortcut.clone()));
        assert!(
            !drain(&mut rx)
                .iter()
                .any(|s| matches!(s, IconSignal::IconImageChanged(_)))
        );

        // Loaded: the same change now signals.
        sync.mark_image_loaded(&shortcut);
        fs::write(&shortcut, "[Desktop Entry]\nName=App\nIcon=first\n").unwrap();
        sync.handle_event(modified(shortcut));
        assert!(
            drain(&mut rx)
                .iter()
                .any(|s| matches!(s, IconSignal::IconImageChanged(_)))
        );
    }
}
