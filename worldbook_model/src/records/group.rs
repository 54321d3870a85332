//! Group definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{now_millis, GroupId};

/// Name given to a group created without one.
pub const UNNAMED_GROUP: &str = "未命名分组";

/// A named bucket of entries. Names are free text and need not be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Create a new group with a fresh ID. A blank name falls back to [`UNNAMED_GROUP`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::generate(),
            name: group_name_or_default(name.into()),
            created_at: now_millis(),
        }
    }

    /// Keep an externally supplied ID.
    pub fn with_id(mut self, id: GroupId) -> Self {
        self.id = id;
        self
    }

    /// Keep an externally supplied creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

fn group_name_or_default(name: String) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNNAMED_GROUP.to_string()
    } else {
        trimmed.to_string()
    }
}
