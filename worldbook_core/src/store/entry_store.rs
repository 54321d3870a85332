//! Entry store - invariant-preserving operations over a loaded snapshot.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use worldbook_model::{
    Entry, EntryDraft, EntryId, EntryPatch, Group, GroupId, Snapshot, ViewScope,
};

use super::KeyedStore;
use crate::error::{StorageError, StoreError};

/// The main worldbook store.
///
/// Every mutating method leaves the snapshot satisfying:
/// each entry's group is `None` or an existing group, and deleting a group
/// moves its members to the ungrouped bucket instead of deleting them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryStore {
    snapshot: Snapshot,
}

impl EntryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a snapshot, moving entries that reference missing groups to ungrouped.
    pub fn from_snapshot(mut snapshot: Snapshot) -> Self {
        let known: HashSet<GroupId> = snapshot.groups.iter().map(|g| g.id.clone()).collect();

        for entry in &mut snapshot.entries {
            if let Some(group_id) = &entry.group_id {
                if !known.contains(group_id) {
                    warn!(entry = %entry.id, group = %group_id, "entry referenced a missing group; moved to ungrouped");
                    entry.group_id = None;
                }
            }
        }

        Self { snapshot }
    }

    /// Load the store from a keyed backend. A missing record yields an empty store.
    pub fn load(backend: &dyn KeyedStore, key: &str) -> Result<Self, StorageError> {
        let snapshot = backend.load(key)?.unwrap_or_default();
        debug!(
            key,
            groups = snapshot.groups.len(),
            entries = snapshot.entries.len(),
            "loaded worldbook snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the whole snapshot back to a keyed backend.
    pub fn save(&self, backend: &dyn KeyedStore, key: &str) -> Result<(), StorageError> {
        backend.save(key, &self.snapshot)
    }

    /// Borrow the current snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Consume the store, returning its snapshot.
    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    /// Create a new group and return a copy of it.
    pub fn create_group(&mut self, name: impl Into<String>) -> Group {
        let group = Group::new(name);
        self.snapshot.groups.push(group.clone());
        group
    }

    /// Insert an externally built group. Returns `false` if its ID is already taken.
    pub fn insert_group(&mut self, group: Group) -> bool {
        if self.snapshot.has_group(&group.id) {
            return false;
        }
        self.snapshot.groups.push(group);
        true
    }

    /// Create a new entry. Its group, if any, must exist.
    pub fn create_entry(&mut self, draft: EntryDraft) -> Result<Entry, StoreError> {
        self.ensure_group(draft.group_id.as_ref())?;
        let entry = Entry::from_draft(draft);
        self.snapshot.entries.push(entry.clone());
        Ok(entry)
    }

    /// Edit an existing entry.
    pub fn update_entry(&mut self, id: &EntryId, patch: EntryPatch) -> Result<&Entry, StoreError> {
        if let Some(group_id) = &patch.group_id {
            self.ensure_group(group_id.as_ref())?;
        }

        let entry = self
            .snapshot
            .entries
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| StoreError::EntryNotFound(id.clone()))?;
        entry.apply(patch);
        Ok(entry)
    }

    /// Rename a group. The name is trimmed and must not be blank.
    pub fn rename_group(&mut self, id: &GroupId, name: &str) -> Result<(), StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }

        let group = self
            .snapshot
            .groups
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| StoreError::GroupNotFound(id.clone()))?;
        group.name = name.to_string();
        Ok(())
    }

    /// Delete a group, moving its members to ungrouped.
    ///
    /// Returns the number of entries that were moved.
    pub fn delete_group(&mut self, id: &GroupId) -> Result<usize, StoreError> {
        let position = self
            .snapshot
            .groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| StoreError::GroupNotFound(id.clone()))?;

        let mut moved = 0;
        for entry in self.snapshot.entries.iter_mut().filter(|e| e.belongs_to(id)) {
            entry.group_id = None;
            moved += 1;
        }
        self.snapshot.groups.remove(position);

        debug!(group = %id, moved, "deleted group");
        Ok(moved)
    }

    /// Delete exactly the given entries. Unknown IDs are ignored.
    ///
    /// Returns the number of entries removed.
    pub fn delete_entries(&mut self, ids: &HashSet<EntryId>) -> usize {
        let before = self.snapshot.entries.len();
        self.snapshot.entries.retain(|e| !ids.contains(&e.id));
        before - self.snapshot.entries.len()
    }

    /// Move exactly the given entries to a group (or ungrouped for `None`).
    ///
    /// Returns the number of entries reassigned.
    pub fn reassign_entries(
        &mut self,
        ids: &HashSet<EntryId>,
        target: Option<&GroupId>,
    ) -> Result<usize, StoreError> {
        self.ensure_group(target)?;

        let mut moved = 0;
        for entry in self.snapshot.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            entry.group_id = target.cloned();
            moved += 1;
        }
        Ok(moved)
    }

    /// Get group by ID.
    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        self.snapshot.group(id)
    }

    /// Get entry by ID.
    pub fn entry(&self, id: &EntryId) -> Option<&Entry> {
        self.snapshot.entry(id)
    }

    /// All groups in creation order.
    pub fn groups(&self) -> &[Group] {
        &self.snapshot.groups
    }

    /// All entries in creation order.
    pub fn entries(&self) -> &[Entry] {
        &self.snapshot.entries
    }

    /// Entries visible in a scope.
    pub fn entries_in(&self, scope: &ViewScope) -> Vec<&Entry> {
        self.snapshot.entries_in(scope)
    }

    /// Member counts per group.
    pub fn group_counts(&self) -> HashMap<GroupId, usize> {
        self.snapshot.group_counts()
    }

    /// Number of ungrouped entries.
    pub fn ungrouped_count(&self) -> usize {
        self.snapshot.ungrouped_count()
    }

    /// Get the total number of entries.
    pub fn entry_count(&self) -> usize {
        self.snapshot.entries.len()
    }

    /// Get the total number of groups.
    pub fn group_count(&self) -> usize {
        self.snapshot.groups.len()
    }

    fn ensure_group(&self, group_id: Option<&GroupId>) -> Result<(), StoreError> {
        match group_id {
            Some(id) if !self.snapshot.has_group(id) => Err(StoreError::GroupNotFound(id.clone())),
            _ => Ok(()),
        }
    }
}
