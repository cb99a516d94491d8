//! src/fs/file_info.rs
//! ============================================================================
//! # FileInfoResolver: Path → IconRecord
//!
//! Leaf resolver turning one filesystem path into the attributes needed to
//! place it in the icon list: display name, glyph, directory/mount
//! classification, and the sort key matching the active mode.
//!
//! A path that no longer exists at resolution time yields
//! [`AppError::NotFound`]; callers treat that as "entry vanished between
//! enumeration and resolution" and skip it silently.

use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use compact_str::CompactString;
use tokio::fs as tokio_fs;

use crate::error::AppError;
use crate::fs::desktop_entry;
use crate::fs::icon_record::{IconGroup, IconRecord, SortMode};
use crate::fs::icon_theme::IconTheme;

/// Stateless resolver; holds only the shared icon theme handle.
pub struct FileInfoResolver {
    theme: Arc<IconTheme>,
}

impl FileInfoResolver {
    pub fn new(theme: Arc<IconTheme>) -> Self {
        Self { theme }
    }

    pub fn theme(&self) -> &IconTheme {
        &self.theme
    }

    /// Synchronous resolution (event-handling hot path).
    pub fn resolve(
        &self,
        path: &Path,
        sort_mode: SortMode,
        folders_first: bool,
    ) -> Result<IconRecord, AppError> {
        let meta = fs::symlink_metadata(path).map_err(|e| AppError::from_metadata(path, e))?;

        Ok(self.from_meta(path, &meta, sort_mode, folders_first))
    }

    /// Asynchronous resolution (scan path).
    pub async fn resolve_async(
        &self,
        path: &Path,
        sort_mode: SortMode,
        folders_first: bool,
    ) -> Result<IconRecord, AppError> {
        let meta = tokio_fs::symlink_metadata(path)
            .await
            .map_err(|e| AppError::from_metadata(path, e))?;

        Ok(self.from_meta(path, &meta, sort_mode, folders_first))
    }

    /// Base resolution plus shortcut-file overlay. The base record is always
    /// built first; `.desktop` metadata only ever overlays an initialized
    /// record.
    pub fn resolve_with_shortcut(
        &self,
        path: &Path,
        sort_mode: SortMode,
        folders_first: bool,
    ) -> Result<IconRecord, AppError> {
        let mut record = self.resolve(path, sort_mode, folders_first)?;

        if desktop_entry::is_shortcut(path) {
            desktop_entry::apply_shortcut(path, &mut record, &self.theme);
        }

        Ok(record)
    }

    /// Re-resolve just the order key for an existing record (date and size
    /// keys are not incrementally maintained).
    pub fn resolve_order_key(path: &Path, sort_mode: SortMode) -> Result<f64, AppError> {
        let meta = fs::symlink_metadata(path).map_err(|e| AppError::from_metadata(path, e))?;

        Ok(order_key(&meta, sort_mode))
    }

    // Internal builder shared by the sync and async entry points.
    fn from_meta(
        &self,
        path: &Path,
        meta: &Metadata,
        sort_mode: SortMode,
        folders_first: bool,
    ) -> IconRecord {
        let ftype = meta.file_type();
        let is_dir = ftype.is_dir();

        let name =
            CompactString::new(path.file_name().and_then(OsStr::to_str).unwrap_or_default());

        let extension = if ftype.is_file() {
            path.extension()
                .and_then(OsStr::to_str)
                .map(|s| CompactString::new(s.to_lowercase()))
        } else {
            None
        };

        let size = if is_dir { 0 } else { meta.len() };
        let modified = meta.modified().unwrap_or(UNIX_EPOCH);
        let volume_id = detect_volume_id(path, meta);

        let glyph_name = if is_dir {
            "folder"
        } else {
            glyph_name_for_extension(extension.as_deref())
        };

        IconRecord {
            path: Arc::new(path.to_path_buf()),
            name,
            glyph_path: self.theme.resolve(glyph_name),
            extension,
            size,
            modified,
            is_dir,
            volume_id,
            group: IconGroup::classify(folders_first, is_dir, volume_id),
            order: order_key(meta, sort_mode),
            image_loaded: false,
        }
    }
}

/// Sort key appropriate to the mode: 0 for the comparator-driven modes,
/// epoch seconds for date, byte length for size.
#[expect(clippy::cast_precision_loss, reason = "Expected")]
fn order_key(meta: &Metadata, sort_mode: SortMode) -> f64 {
    match sort_mode {
        SortMode::Name | SortMode::Type => 0.0,
        SortMode::Date => meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0.0, |d| d.as_secs_f64()),
        SortMode::Size => {
            if meta.is_dir() {
                0.0
            } else {
                meta.len() as f64
            }
        }
    }
}

/// A directory whose device number differs from its parent's is a mounted
/// volume root. 0 means "not a mount point".
#[cfg(unix)]
fn detect_volume_id(path: &Path, meta: &Metadata) -> i32 {
    use std::os::unix::fs::MetadataExt;

    if !meta.is_dir() {
        return 0;
    }

    let Some(parent) = path.parent() else {
        return 0;
    };

    match fs::metadata(parent) {
        Ok(parent_meta) if parent_meta.dev() != meta.dev() => 1,
        _ => 0,
    }
}

#[cfg(not(unix))]
fn detect_volume_id(_path: &Path, _meta: &Metadata) -> i32 {
    0
}

/// Theme identifier guessed from the extension; the display side only needs
/// a coarse content-type glyph.
fn glyph_name_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" | "ico") => "image-x-generic",
        Some("mp3" | "ogg" | "flac" | "wav" | "opus") => "audio-x-generic",
        Some("mp4" | "mkv" | "avi" | "webm" | "mov") => "video-x-generic",
        Some("pdf") => "application-pdf",
        Some("zip" | "tar" | "gz" | "xz" | "bz2" | "zst" | "7z") => "package-x-generic",
        Some("sh" | "py" | "rs" | "pl" | "rb") => "text-x-script",
        _ => "text-x-generic",
    }
}
