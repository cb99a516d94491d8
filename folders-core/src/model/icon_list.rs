//! src/model/icon_list.rs
//! ============================================================================
//! # OrderedIconList: The Live Icon Collection for One Directory
//!
//! A sequence of [`IconRecord`]s kept sorted by `(group, order)` ascending.
//! Incremental insertion uses fractional order keys: a newcomer's key is
//! derived from its neighbours (predecessor minus one, midpoint, successor
//! plus one), so a single creation event never renumbers the whole list.
//!
//! Midpoint keys lose float precision after many edits without a resort;
//! [`OrderedIconList::renumber`] resets every group back to exact integers
//! and is the recovery mechanism for that drift. Date and size sorts keep
//! their resolved keys instead, so renumbering is the caller's call.

use std::cmp::Ordering;
use std::path::Path;

use tracing::debug;

use crate::fs::icon_record::{IconGroup, IconRecord};

type CompareFn = fn(&IconRecord, &IconRecord) -> Ordering;

#[derive(Debug, Default)]
pub struct OrderedIconList {
    records: Vec<IconRecord>,
}

impl OrderedIconList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IconRecord> {
        self.records.iter()
    }

    pub fn get(&self, index: usize) -> Option<&IconRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut IconRecord> {
        self.records.get_mut(index)
    }

    /// Append without placing. Only for initial population that is followed
    /// by a full [`sort_by`](Self::sort_by).
    pub fn push(&mut self, record: IconRecord) {
        self.records.push(record);
    }

    pub fn position_by_path(&self, path: &Path) -> Option<usize> {
        self.records.iter().position(|r| r.path.as_path() == path)
    }

    /// Fallback lookup for rename-detected-as-delete+create races: match the
    /// display name against the event path's base filename.
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&IconRecord> {
        self.position_by_path(path).map(|i| &self.records[i])
    }

    pub fn remove_at(&mut self, index: usize) -> IconRecord {
        self.records.remove(index)
    }

    pub fn remove_by_path(&mut self, path: &Path) -> Option<IconRecord> {
        self.position_by_path(path).map(|i| self.records.remove(i))
    }

    /// Remove every record, returning them in display order (bulk teardown).
    pub fn drain_all(&mut self) -> Vec<IconRecord> {
        std::mem::take(&mut self.records)
    }

    /// Insert preserving the `(group, order)` sort, deriving the newcomer's
    /// fractional order key from its neighbours. Returns the index the
    /// record landed at.
    ///
    /// Tie policy: a newcomer comparing equal to the group's first record
    /// goes before it; one comparing equal to a later record keeps scanning
    /// and lands after the run of equals. Any finer tie rule belongs to the
    /// comparator.
    pub fn insert_sorted(&mut self, mut record: IconRecord, comp: CompareFn) -> usize {
        record.order = self.place_for(&record, None, comp);

        let key = record.sort_key();
        let pos = self.records.partition_point(|r| r.sort_key() < key);

        debug!(
            "placing '{}' at index {} (order {:.2})",
            record.name, pos, record.order
        );
        self.records.insert(pos, record);
        pos
    }

    /// Derive the order key that puts `record` at its comparator-chosen spot
    /// within its group. `exclude` skips one slot — used when repositioning
    /// a record that is still in the list, so it never compares against
    /// itself.
    ///
    /// An empty group yields 0.0 (sole member). A record comparing at or
    /// before the group's head lands just before it; otherwise the scan
    /// walks the group and lands on the midpoint of the first
    /// strictly-greater neighbour pair, or one past the tail.
    pub fn place_for(&self, record: &IconRecord, exclude: Option<usize>, comp: CompareFn) -> f64 {
        let mut in_group = self
            .records
            .iter()
            .enumerate()
            .filter(|(i, r)| Some(*i) != exclude && r.group == record.group)
            .map(|(_, r)| r);

        let Some(first) = in_group.next() else {
            return 0.0;
        };

        if comp(record, first) != Ordering::Greater {
            return first.order - 1.0;
        }

        let mut prev = first;
        let mut order = first.order + 1.0;

        for cur in in_group {
            if comp(record, cur) == Ordering::Less {
                return (cur.order + prev.order) / 2.0;
            }

            // Provisional "append after cur"; stands if the scan exhausts
            // the group.
            order = cur.order + 1.0;
            prev = cur;
        }

        order
    }

    /// Detach the record at `index` and splice it back at the position its
    /// current `(group, order)` key demands. Returns the new index.
    pub fn reposition(&mut self, index: usize) -> usize {
        let record = self.records.remove(index);
        let key = record.sort_key();
        let pos = self.records.partition_point(|r| r.sort_key() < key);

        debug!("repositioning '{}' {} -> {}", record.name, index, pos);
        self.records.insert(pos, record);
        pos
    }

    /// Full resort under `comp`. Does not touch the order keys; callers
    /// follow up with [`renumber`](Self::renumber) when the keys are
    /// positional rather than resolved values.
    pub fn sort_by(&mut self, comp: CompareFn) {
        self.records
            .sort_by(|a, b| a.group.cmp(&b.group).then_with(|| comp(a, b)));
    }

    /// Renumber each group's order keys to 0, 1, 2, … — resetting
    /// accumulated fractional drift.
    pub fn renumber(&mut self) {
        let mut current_group: Option<IconGroup> = None;
        let mut next = 0.0;

        for record in &mut self.records {
            if current_group != Some(record.group) {
                current_group = Some(record.group);
                next = 0.0;
            }
            record.order = next;
            next += 1.0;
        }
    }

    /// Invariant check used by tests: iteration order agrees with the
    /// `(group, order)` keys.
    pub fn is_consistent(&self) -> bool {
        self.records
            .windows(2)
            .all(|w| w[0].sort_key() <= w[1].sort_key())
    }
}
