//! src/fs/icon_record.rs
//! ============================================================================
//! # IconRecord: One Filesystem Entry as Displayed
//!
//! The record type carried by the ordered icon list, plus the coarse group
//! partition, the user-selectable sort modes and their comparators.
//!
//! Layout follows the metadata conventions used elsewhere in this codebase:
//! shared `Arc<PathBuf>` paths, `CompactString` names, raw `SystemTime` /
//! byte-count sort keys with human-readable accessors on top.

use std::cmp::Ordering;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytesize::ByteSize;
use chrono::{DateTime, Local, TimeZone};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Coarse sort partition applied before the fine-grained order key.
/// `Folders` sorts ahead of `Files` whenever the folders-first policy is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IconGroup {
    Folders,
    Files,
}

impl IconGroup {
    /// Derive the group from the folders-first policy and the entry's
    /// classification. Mounted volume roots count as folders: a nonzero
    /// `volume_id` marks a mount point even when the backend reports it as
    /// something other than a plain directory.
    pub fn classify(folders_first: bool, is_dir: bool, volume_id: i32) -> Self {
        if folders_first && (is_dir || volume_id != 0) {
            Self::Folders
        } else {
            Self::Files
        }
    }
}

/// User-selectable sort mode for the icon list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Name,

    Date,

    Size,

    Type,
}

impl SortMode {
    /// Whether this mode sorts on the resolver-computed order key (date and
    /// size keys are not incrementally maintained and must be re-resolved).
    pub const fn uses_resolved_key(self) -> bool {
        matches!(self, Self::Date | Self::Size)
    }

    /// Comparator used for incremental placement and full resorts.
    pub fn comparator(self) -> fn(&IconRecord, &IconRecord) -> Ordering {
        match self {
            Self::Name => compare_name,
            Self::Date | Self::Size => compare_order,
            Self::Type => compare_extension,
        }
    }
}

/// One filesystem entry as displayed.
#[derive(Debug, Clone, PartialEq)]
pub struct IconRecord {
    /// Canonical source identifier; unique within a list at any instant.
    pub path: Arc<PathBuf>,

    /// Display name. Mutable: shortcut files override it.
    pub name: CompactString,

    /// Resolved icon image path, if the theme search found one. Mutable.
    pub glyph_path: Option<PathBuf>,

    /// Lower-case extension (files only); the type-sort key.
    pub extension: Option<CompactString>,

    /// Byte length (0 for directories); the size-sort key.
    pub size: u64,

    /// Last-modification timestamp; the date-sort key.
    pub modified: SystemTime,

    pub is_dir: bool,

    /// 0 = not a mount point; nonzero marks a mounted volume root.
    pub volume_id: i32,

    /// Coarse sort partition. Recomputed whenever the folders-first policy
    /// or the entry's classification changes.
    pub group: IconGroup,

    /// Fractional secondary sort key; strictly defines position within the
    /// group. Drifts in precision over many incremental edits; a full
    /// resort renumbers it back to exact integers.
    pub order: f64,

    /// Whether the display side has loaded the glyph image. Gates the
    /// icon-image-changed signal on modification events.
    pub image_loaded: bool,
}

impl IconRecord {
    /// The `(group, order)` pair the list is sorted by.
    pub fn sort_key(&self) -> (IconGroup, f64) {
        (self.group, self.order)
    }

    /// Human-readable size string.
    #[must_use]
    pub fn size_human(&self) -> String {
        ByteSize::b(self.size).to_string()
    }

    /// Format the modification date.
    #[expect(clippy::cast_possible_wrap, reason = "Expected")]
    #[must_use]
    pub fn format_date(&self, fmt: &str) -> String {
        let dur: Duration = self
            .modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0));

        let dt: DateTime<Local> = Local
            .timestamp_opt(dur.as_secs() as i64, dur.subsec_nanos())
            .single()
            .unwrap_or_else(Local::now);

        dt.format(fmt).to_string()
    }
}

/// Lexicographic, case-insensitive name comparison with a case-sensitive
/// tiebreak so the order stays total across names differing only in case.
pub fn compare_name(a: &IconRecord, b: &IconRecord) -> Ordering {
    let la = a.name.to_lowercase();
    let lb = b.name.to_lowercase();
    la.cmp(&lb).then_with(|| a.name.cmp(&b.name))
}

/// Comparison on the resolver-computed order key (date or size modes).
pub fn compare_order(a: &IconRecord, b: &IconRecord) -> Ordering {
    a.order.total_cmp(&b.order)
}

/// Extension grouping comparison: entries without an extension (directories
/// among them) sort first, then by extension, then by name within a run of
/// equal extensions.
pub fn compare_extension(a: &IconRecord, b: &IconRecord) -> Ordering {
    a.extension
        .cmp(&b.extension)
        .then_with(|| compare_name(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_record(name: &str, group: IconGroup, order: f64) -> IconRecord {
        IconRecord {
            path: Arc::new(PathBuf::from(format!("/d/{name}"))),
            name: CompactString::new(name),
            glyph_path: None,
            extension: name
                .rsplit_once('.')
                .map(|(_, ext)| CompactString::new(ext.to_lowercase())),
            size: 0,
            modified: UNIX_EPOCH,
            is_dir: false,
            volume_id: 0,
            group,
            order,
            image_loaded: false,
        }
    }

    #[test]
    fn test_classify_folders_first() {
        assert_eq!(IconGroup::classify(true, true, 0), IconGroup::Folders);
        assert_eq!(IconGroup::classify(true, false, 3), IconGroup::Folders);
        assert_eq!(IconGroup::classify(true, false, 0), IconGroup::Files);
        // Policy off: everything lands in the files bucket.
        assert_eq!(IconGroup::classify(false, true, 1), IconGroup::Files);
    }

    #[test]
    fn test_groups_order_folders_before_files() {
        assert!(IconGroup::Folders < IconGroup::Files);
    }

    #[test]
    fn test_compare_name_is_a_total_order() {
        let a = dummy_record("alpha", IconGroup::Files, 0.0);
        let b = dummy_record("Beta", IconGroup::Files, 0.0);
        let c = dummy_record("gamma", IconGroup::Files, 0.0);

        // an element never sorts strictly before itself
        assert_eq!(compare_name(&a, &a), Ordering::Equal);
        // antisymmetric
        assert_eq!(compare_name(&a, &b), Ordering::Less);
        assert_eq!(compare_name(&b, &a), Ordering::Greater);
        // transitive
        assert_eq!(compare_name(&a, &b), Ordering::Less);
        assert_eq!(compare_name(&b, &c), Ordering::Less);
        assert_eq!(compare_name(&a, &c), Ordering::Less);
    }

    #[test]
    fn test_compare_name_ignores_case_first() {
        let upper = dummy_record("README", IconGroup::Files, 0.0);
        let lower = dummy_record("aardvark", IconGroup::Files, 0.0);
        assert_eq!(compare_name(&lower, &upper), Ordering::Less);
    }

    #[test]
    fn test_compare_extension_groups_then_names() {
        let tar = dummy_record("b.tar", IconGroup::Files, 0.0);
        let txt_a = dummy_record("z.txt", IconGroup::Files, 0.0);
        let txt_b = dummy_record("a.txt", IconGroup::Files, 0.0);
        let bare = dummy_record("Makefile", IconGroup::Files, 0.0);

        assert_eq!(compare_extension(&bare, &tar), Ordering::Less);
        assert_eq!(compare_extension(&tar, &txt_a), Ordering::Less);
        assert_eq!(compare_extension(&txt_b, &txt_a), Ordering::Less);
    }

    #[test]
    fn test_human_accessors() {
        let mut record = dummy_record("a.txt", IconGroup::Files, 0.0);
        record.size = 2048;

        assert!(record.size_human().contains("KiB"));
        assert_eq!(record.format_date("%Y").len(), 4);
    }

    #[test]
    fn test_sort_mode_comparator_selection() {
        let small = dummy_record("big", IconGroup::Files, 1.0);
        let large = dummy_record("aaa", IconGroup::Files, 9.0);

        // Size/date modes compare the resolved key, not the name.
        assert_eq!(SortMode::Size.comparator()(&small, &large), Ordering::Less);
        assert_eq!(SortMode::Name.comparator()(&large, &small), Ordering::Less);
        assert!(SortMode::Date.uses_resolved_key());
        assert!(!SortMode::Type.uses_resolved_key());
    }
}
