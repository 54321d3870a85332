//! Snapshot - the complete worldbook record as loaded from and saved to storage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::records::{Entry, EntryId, Group, GroupId};

/// A logical view over the entries: one group's members or the ungrouped bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewScope {
    Group(GroupId),
    Ungrouped,
}

impl ViewScope {
    /// Check whether an entry is visible in this scope.
    pub fn contains(&self, entry: &Entry) -> bool {
        match self {
            ViewScope::Group(id) => entry.belongs_to(id),
            ViewScope::Ungrouped => entry.is_ungrouped(),
        }
    }
}

/// All groups and entries, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Snapshot {
    /// Create a new empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a group by ID.
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Get an entry by ID.
    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Check if a group exists.
    pub fn has_group(&self, id: &GroupId) -> bool {
        self.group(id).is_some()
    }

    /// Entries visible in a scope, in store order.
    pub fn entries_in(&self, scope: &ViewScope) -> Vec<&Entry> {
        self.entries.iter().filter(|e| scope.contains(e)).collect()
    }

    /// Number of member entries for every group, including empty ones.
    pub fn group_counts(&self) -> HashMap<GroupId, usize> {
        let mut counts: HashMap<GroupId, usize> =
            self.groups.iter().map(|g| (g.id.clone(), 0)).collect();

        for entry in &self.entries {
            if let Some(count) = entry.group_id.as_ref().and_then(|id| counts.get_mut(id)) {
                *count += 1;
            }
        }

        counts
    }

    /// Number of entries in the ungrouped bucket.
    pub fn ungrouped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_ungrouped()).count()
    }

    /// Entries whose group ID names no existing group.
    pub fn dangling_entries(&self) -> Vec<&Entry> {
        self.entries
            .iter()
            .filter(|e| e.group_id.as_ref().is_some_and(|id| !self.has_group(id)))
            .collect()
    }
}
