//! Batch organizer - select entries within one view and move or delete them together.
//!
//! A session is owned by its caller and never persisted. Changing the view
//! drops whatever was selected.

mod selection;

pub use selection::*;

use std::collections::HashSet;
use tracing::{debug, info};

use worldbook_model::{EntryId, GroupId, ViewScope};

use crate::error::StoreError;
use crate::store::EntryStore;

/// Destination of a batch move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveTarget {
    Group(GroupId),
    Ungrouped,
    /// Create a group with this name and move the selection into it.
    NewGroup(String),
}

/// Result of a batch move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    /// The group entries were moved into, `None` for ungrouped.
    pub target: Option<GroupId>,
    pub moved: usize,
}

/// One organizing session over a single view.
#[derive(Debug, Clone)]
pub struct OrganizerSession {
    scope: ViewScope,
    selection: Selection,
}

impl OrganizerSession {
    pub fn new(scope: ViewScope) -> Self {
        Self {
            scope,
            selection: Selection::new(),
        }
    }

    pub fn scope(&self) -> &ViewScope {
        &self.scope
    }

    /// Switch to another view. The selection is cleared even if the view is unchanged.
    pub fn set_scope(&mut self, scope: ViewScope) {
        self.scope = scope;
        self.selection.clear();
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Check whether an entry is selected.
    pub fn is_selected(&self, id: &EntryId) -> bool {
        self.selection.contains(id)
    }

    /// Select or deselect one visible entry. Returns whether it is selected afterwards.
    ///
    /// IDs outside the session's view are ignored.
    pub fn toggle_one(&mut self, store: &EntryStore, id: EntryId) -> bool {
        if !store.entry(&id).is_some_and(|e| self.scope.contains(e)) {
            debug!(entry = %id, "ignoring toggle outside the current view");
            return false;
        }
        self.selection.toggle(id)
    }

    /// Select every visible entry, or clear the selection if all of them already are.
    pub fn toggle_all(&mut self, store: &EntryStore) {
        let visible = store.entries_in(&self.scope);
        if self.selection.covers(visible.iter().map(|e| &e.id)) {
            self.selection.clear();
        } else {
            self.selection.select_only(visible.into_iter().map(|e| e.id.clone()));
        }
    }

    /// Move exactly the selected entries still visible in the view, then clear the selection.
    ///
    /// On error the store and the selection are left unchanged.
    pub fn move_selection(
        &mut self,
        store: &mut EntryStore,
        target: MoveTarget,
    ) -> Result<MoveReport, StoreError> {
        let ids = self.visible_selection(store);
        if ids.is_empty() {
            self.selection.clear();
            let target = match target {
                MoveTarget::Group(id) => Some(id),
                MoveTarget::Ungrouped | MoveTarget::NewGroup(_) => None,
            };
            return Ok(MoveReport { target, moved: 0 });
        }

        let target = match target {
            MoveTarget::Group(id) => {
                if store.group(&id).is_none() {
                    return Err(StoreError::GroupNotFound(id));
                }
                Some(id)
            }
            MoveTarget::Ungrouped => None,
            MoveTarget::NewGroup(name) => {
                if name.trim().is_empty() {
                    return Err(StoreError::EmptyName);
                }
                Some(store.create_group(name).id)
            }
        };

        let moved = store.reassign_entries(&ids, target.as_ref())?;
        self.selection.clear();

        info!(moved, target = ?target, "moved selection");
        Ok(MoveReport { target, moved })
    }

    /// Delete exactly the selected entries still visible in the view, then clear the selection.
    ///
    /// Returns the number of entries removed.
    pub fn delete_selection(&mut self, store: &mut EntryStore) -> usize {
        let ids = self.visible_selection(store);
        self.selection.clear();
        let removed = store.delete_entries(&ids);
        info!(removed, "deleted selection");
        removed
    }

    /// Selected IDs that are still visible in the session's view.
    fn visible_selection(&self, store: &EntryStore) -> HashSet<EntryId> {
        store
            .entries_in(&self.scope)
            .into_iter()
            .filter(|e| self.selection.contains(&e.id))
            .map(|e| e.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldbook_model::EntryDraft;

    fn seeded() -> (EntryStore, GroupId, Vec<EntryId>) {
        let mut store = EntryStore::new();
        let group = store.create_group("Cities");
        let mut ids = Vec::new();
        for name in ["Harbor", "Market", "Keep"] {
            let entry = store
                .create_entry(EntryDraft::new(name, "x").with_group(Some(group.id.clone())))
                .unwrap();
            ids.push(entry.id);
        }
        store.create_entry(EntryDraft::new("Loose", "y")).unwrap();
        (store, group.id, ids)
    }

    #[test]
    fn test_toggle_all_round_trip() {
        let (store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));

        session.toggle_all(&store);
        assert_eq!(session.selection().len(), 3);
        assert!(ids.iter().all(|id| session.is_selected(id)));

        session.toggle_all(&store);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_toggle_all_completes_partial_selection() {
        let (store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));

        session.toggle_one(&store, ids[0].clone());
        session.toggle_all(&store);
        assert_eq!(session.selection().len(), 3);
    }

    #[test]
    fn test_toggle_all_on_empty_view_clears() {
        let (mut store, _, _) = seeded();
        let empty = store.create_group("Empty");
        let mut session = OrganizerSession::new(ViewScope::Group(empty.id));

        assert!(!session.toggle_one(&store, EntryId::from("entry-stale")));
        session.toggle_all(&store);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_set_scope_clears_selection() {
        let (store, group, _) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));
        session.toggle_all(&store);

        session.set_scope(ViewScope::Ungrouped);
        assert!(session.selection().is_empty());
        assert_eq!(session.scope(), &ViewScope::Ungrouped);
    }

    #[test]
    fn test_move_into_new_group_moves_only_selection() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group.clone()));
        session.toggle_one(&store, ids[0].clone());
        session.toggle_one(&store, ids[2].clone());

        let report = session
            .move_selection(&mut store, MoveTarget::NewGroup("Ports".into()))
            .unwrap();

        assert_eq!(report.moved, 2);
        let fresh = report.target.unwrap();
        assert_eq!(store.group(&fresh).unwrap().name, "Ports");
        assert_eq!(store.entries_in(&ViewScope::Group(fresh)).len(), 2);
        assert_eq!(store.entries_in(&ViewScope::Group(group)).len(), 1);
        assert_eq!(store.ungrouped_count(), 1);
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_move_to_ungrouped() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));
        session.toggle_one(&store, ids[1].clone());

        let report = session
            .move_selection(&mut store, MoveTarget::Ungrouped)
            .unwrap();

        assert_eq!(report, MoveReport { target: None, moved: 1 });
        assert!(store.entry(&ids[1]).unwrap().is_ungrouped());
        assert_eq!(store.ungrouped_count(), 2);
    }

    #[test]
    fn test_move_to_missing_group_keeps_selection() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group.clone()));
        session.toggle_one(&store, ids[0].clone());

        let err = session
            .move_selection(&mut store, MoveTarget::Group(GroupId::from("group-nope")))
            .unwrap_err();

        assert_eq!(err, StoreError::GroupNotFound(GroupId::from("group-nope")));
        assert!(session.is_selected(&ids[0]));
        assert!(store.entry(&ids[0]).unwrap().belongs_to(&group));
    }

    #[test]
    fn test_blank_new_group_name_is_rejected() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));
        session.toggle_one(&store, ids[0].clone());

        let err = session
            .move_selection(&mut store, MoveTarget::NewGroup("  ".into()))
            .unwrap_err();
        assert_eq!(err, StoreError::EmptyName);
        assert_eq!(store.group_count(), 1);
    }

    #[test]
    fn test_empty_selection_move_is_noop() {
        let (mut store, _, _) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Ungrouped);

        let report = session
            .move_selection(&mut store, MoveTarget::NewGroup("Unused".into()))
            .unwrap();
        assert_eq!(report.moved, 0);
        assert_eq!(store.group_count(), 1);
    }

    #[test]
    fn test_out_of_view_entries_are_never_touched() {
        let (mut store, group, ids) = seeded();
        let other = store.create_group("Other");
        let outsider = store
            .create_entry(EntryDraft::new("Elsewhere", "z").with_group(Some(other.id.clone())))
            .unwrap();
        let mut session = OrganizerSession::new(ViewScope::Group(group.clone()));

        assert!(!session.toggle_one(&store, outsider.id.clone()));
        assert!(session.selection().is_empty());

        session.toggle_one(&store, ids[0].clone());
        store
            .reassign_entries(&HashSet::from([ids[0].clone()]), Some(&other.id))
            .unwrap();

        assert_eq!(session.delete_selection(&mut store), 0);
        assert!(store.entry(&outsider.id).unwrap().belongs_to(&other.id));
        assert!(store.entry(&ids[0]).is_some());
        assert!(session.selection().is_empty());
    }

    #[test]
    fn test_move_skips_entries_that_left_the_view() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));
        session.toggle_one(&store, ids[1].clone());
        store.reassign_entries(&HashSet::from([ids[1].clone()]), None).unwrap();

        let report = session
            .move_selection(&mut store, MoveTarget::NewGroup("Unused".into()))
            .unwrap();

        assert_eq!(report.moved, 0);
        assert_eq!(store.group_count(), 1);
        assert!(store.entry(&ids[1]).unwrap().is_ungrouped());
    }

    #[test]
    fn test_delete_selection() {
        let (mut store, group, ids) = seeded();
        let mut session = OrganizerSession::new(ViewScope::Group(group));
        session.toggle_one(&store, ids[0].clone());
        session.toggle_one(&store, ids[1].clone());

        assert_eq!(session.delete_selection(&mut store), 2);
        assert_eq!(store.entry_count(), 2);
        assert!(store.entry(&ids[2]).is_some());
        assert!(session.selection().is_empty());
    }
}
