//! Entry definitions - the world-info snippets stored in the worldbook.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{now_millis, EntryId, GroupId};

/// Name given to an entry created without one.
pub const UNNAMED_ENTRY: &str = "未命名设定";

/// One world-info fact with optional group membership.
///
/// `group_id == None` places the entry in the virtual ungrouped bucket.
/// `keywords` is carried as inert metadata; nothing selects entries by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

fn enabled_by_default() -> bool {
    true
}

impl Entry {
    /// Create an entry from a draft, assigning a fresh ID and timestamps.
    pub fn from_draft(draft: EntryDraft) -> Self {
        let now = now_millis();
        let name = if draft.name.trim().is_empty() {
            UNNAMED_ENTRY.to_string()
        } else {
            draft.name
        };

        Self {
            id: EntryId::generate(),
            name,
            content: draft.content,
            group_id: draft.group_id,
            keywords: draft.keywords,
            enabled: draft.enabled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an edit and bump `updated_at`. A blank name keeps the current one.
    pub fn apply(&mut self, patch: EntryPatch) {
        if let Some(name) = patch.name {
            let trimmed = name.trim();
            if !trimmed.is_empty() {
                self.name = trimmed.to_string();
            }
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(group_id) = patch.group_id {
            self.group_id = group_id;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        self.updated_at = now_millis();
    }

    /// Check whether this entry sits in the ungrouped bucket.
    pub fn is_ungrouped(&self) -> bool {
        self.group_id.is_none()
    }

    /// Check whether this entry belongs to a specific group.
    pub fn belongs_to(&self, group_id: &GroupId) -> bool {
        self.group_id.as_ref() == Some(group_id)
    }
}

/// Input for creating an entry. Every construction path goes through this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub name: String,
    pub content: String,
    pub group_id: Option<GroupId>,
    pub keywords: Vec<String>,
    pub enabled: bool,
}

impl EntryDraft {
    /// Start a draft with the given name and content.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            group_id: None,
            keywords: Vec::new(),
            enabled: true,
        }
    }

    /// Place the entry in a group (or ungrouped for `None`).
    pub fn with_group(mut self, group_id: Option<GroupId>) -> Self {
        self.group_id = group_id;
        self
    }

    /// Attach keywords.
    pub fn with_keywords(mut self, keywords: impl IntoIterator<Item = String>) -> Self {
        self.keywords = keywords.into_iter().collect();
        self
    }

    /// Set the enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A field-level edit to an existing entry. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub name: Option<String>,
    pub content: Option<String>,
    /// `Some(None)` moves the entry to the ungrouped bucket.
    pub group_id: Option<Option<GroupId>>,
    pub enabled: Option<bool>,
}

impl EntryPatch {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn group(mut self, group_id: Option<GroupId>) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}
