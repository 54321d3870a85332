//! Selection state for batch operations.

use std::collections::HashSet;

use worldbook_model::EntryId;

/// The set of entry IDs picked for the next batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: HashSet<EntryId>,
}

impl Selection {
    /// Create a new empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an ID, or deselect it if it is already selected.
    ///
    /// Returns whether the ID is selected afterwards.
    pub fn toggle(&mut self, id: EntryId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.ids.contains(id)
    }

    /// Check whether every ID in `visible` is selected.
    pub fn covers<'a>(&self, mut visible: impl Iterator<Item = &'a EntryId>) -> bool {
        visible.all(|id| self.ids.contains(id))
    }

    /// Replace the selection with exactly these IDs.
    pub fn select_only(&mut self, ids: impl IntoIterator<Item = EntryId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_set(&self) -> &HashSet<EntryId> {
        &self.ids
    }

    /// Take the selected IDs, leaving the selection empty.
    pub fn take(&mut self) -> HashSet<EntryId> {
        std::mem::take(&mut self.ids)
    }
}
