//! Dialect normalizer - converts the recognized JSON shapes into groups and entries.
//!
//! Field names differ between producers, so each canonical field is read
//! through an ordered alias list. Supporting a new producer's field name means
//! adding it to a table below.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use worldbook_model::{now_millis, Entry, EntryDraft, Group, GroupId};

/// Name given to a loose record that carries no name field.
pub const UNNAMED_RECORD: &str = "未命名";

/// Ordered alias names for each canonical entry field; the first present alias wins.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub name: &'static [&'static str],
    pub content: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// Index-keyed lorebook entries (`{"entries": {"0": {...}}}`) and character books.
pub const KEYED_ALIASES: AliasTable = AliasTable {
    name: &["comment", "name", "title"],
    content: &["content", "description"],
    keywords: &["key", "keys", "keywords"],
};

/// Bare arrays and single loose records.
pub const LOOSE_ALIASES: AliasTable = AliasTable {
    name: &["name", "title", "key", "comment"],
    content: &["content", "description", "value", "text"],
    keywords: &["keywords", "keys", "key"],
};

/// Structured exports carrying `entries` and `groups` arrays.
pub const EXPORT_ALIASES: AliasTable = AliasTable {
    name: &["name", "title", "comment"],
    content: &["content", "description"],
    keywords: &["keywords", "key"],
};

/// The recognized input shapes, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `entries` is an object keyed by index-like strings.
    KeyedEntries,
    /// The top level is an array of records.
    RecordArray,
    /// `entries` is an array, optionally with a sibling `groups` array.
    StructuredExport,
    /// Any other object: one record. Scalars yield nothing.
    SingleRecord,
}

impl Dialect {
    pub fn detect(json: &Value) -> Self {
        match json {
            Value::Array(_) => Dialect::RecordArray,
            Value::Object(map) => match map.get("entries") {
                Some(Value::Object(_)) => Dialect::KeyedEntries,
                Some(Value::Array(_)) => Dialect::StructuredExport,
                _ => Dialect::SingleRecord,
            },
            _ => Dialect::SingleRecord,
        }
    }
}

/// Canonical records produced from one import source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedImport {
    pub groups: Vec<Group>,
    pub entries: Vec<Entry>,
}

impl NormalizedImport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DialectNormalizer;

impl DialectNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Convert any recognized shape into canonical groups and entries.
    pub fn normalize(&self, json: &Value) -> NormalizedImport {
        let dialect = Dialect::detect(json);
        debug!(?dialect, "normalizing import");

        match (dialect, json) {
            (Dialect::KeyedEntries, Value::Object(map)) => NormalizedImport {
                groups: Vec::new(),
                entries: match map.get("entries") {
                    Some(Value::Object(entries)) => keyed_entries(entries)
                        .into_iter()
                        .map(Entry::from_draft)
                        .collect(),
                    _ => Vec::new(),
                },
            },
            (Dialect::RecordArray, Value::Array(items)) => NormalizedImport {
                groups: Vec::new(),
                entries: items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|item| Entry::from_draft(record_draft(item, &LOOSE_ALIASES)))
                    .collect(),
            },
            (Dialect::StructuredExport, Value::Object(map)) => structured_export(map),
            (_, Value::Object(record)) => NormalizedImport {
                groups: Vec::new(),
                entries: vec![Entry::from_draft(record_draft(record, &LOOSE_ALIASES))],
            },
            _ => {
                debug!("scalar JSON holds no record");
                NormalizedImport::default()
            }
        }
    }
}

/// Drafts for index-keyed entries in numeric key order, skipping disabled ones.
pub(crate) fn keyed_entries(entries: &Map<String, Value>) -> Vec<EntryDraft> {
    let mut keyed: Vec<(&String, &Value)> = entries.iter().collect();
    keyed.sort_by_key(|(key, _)| key.parse::<u64>().map_or((1, 0), |index| (0, index)));

    keyed
        .into_iter()
        .filter_map(|(key, item)| item.as_object().map(|item| (key, item)))
        .filter(|(_, item)| !is_disabled(item))
        .map(|(key, item)| {
            let mut draft = record_draft(item, &KEYED_ALIASES);
            if first_text(item, KEYED_ALIASES.name).is_none() {
                draft.name = format!("设定 {key}");
            }
            draft
        })
        .collect()
}

fn structured_export(map: &Map<String, Value>) -> NormalizedImport {
    let groups = map
        .get("groups")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(Value::as_object)
                .map(export_group)
                .collect()
        })
        .unwrap_or_default();

    let entries = map
        .get("entries")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|item| {
                    let group_id = first_text(item, &["groupId"]).map(GroupId);
                    Entry::from_draft(record_draft(item, &EXPORT_ALIASES).with_group(group_id))
                })
                .collect()
        })
        .unwrap_or_default();

    NormalizedImport { groups, entries }
}

fn export_group(item: &Map<String, Value>) -> Group {
    let mut group = Group::new(first_text(item, &["name"]).unwrap_or_default());
    if let Some(id) = first_text(item, &["id"]) {
        group = group.with_id(GroupId(id));
    }
    let created_at = item
        .get("createdAt")
        .and_then(Value::as_i64)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_else(now_millis);
    group.with_created_at(created_at)
}

/// Build a draft from one record using an alias table.
pub(crate) fn record_draft(item: &Map<String, Value>, aliases: &AliasTable) -> EntryDraft {
    let name = first_text(item, aliases.name).unwrap_or_else(|| UNNAMED_RECORD.to_string());
    let content = first_text(item, aliases.content).unwrap_or_default();
    EntryDraft::new(name, content).with_keywords(first_keywords(item, aliases.keywords))
}

/// An entry is disabled by `disable: true` or `enabled: false`.
pub(crate) fn is_disabled(item: &Map<String, Value>) -> bool {
    item.get("disable").and_then(Value::as_bool) == Some(true)
        || item.get("enabled").and_then(Value::as_bool) == Some(false)
}

/// Text of the first alias holding a non-empty value.
pub(crate) fn first_text(item: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| item.get(*alias))
        .find_map(text_value)
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_value).collect();
            (!parts.is_empty()).then(|| parts.join(","))
        }
        _ => None,
    }
}

/// Keywords from the first alias holding any. Strings are split on commas.
pub(crate) fn first_keywords(item: &Map<String, Value>, aliases: &[&str]) -> Vec<String> {
    aliases
        .iter()
        .filter_map(|alias| item.get(*alias))
        .map(keyword_values)
        .find(|keywords| !keywords.is_empty())
        .unwrap_or_default()
}

fn keyword_values(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(text_value)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
