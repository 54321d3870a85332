//! Character import pipeline - turns a card's embedded world info into a new group.

use serde_json::Value;
use tracing::info;

use worldbook_model::{EntryDraft, EntryId, ImportConfig};

use super::dialect::{is_disabled, keyed_entries, record_draft, LOOSE_ALIASES};
use crate::error::StoreError;
use crate::store::EntryStore;

/// Imports the `character_book` of a character card.
#[derive(Debug, Clone)]
pub struct CharacterImportPipeline {
    group_suffix: String,
}

impl CharacterImportPipeline {
    /// Create a pipeline naming groups `{display name}{group_suffix}`.
    pub fn new(group_suffix: impl Into<String>) -> Self {
        Self {
            group_suffix: group_suffix.into(),
        }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.character_group_suffix.clone())
    }

    /// Import the card's world info under one new group.
    ///
    /// The group is created before any entry and removed again when no
    /// entry survives, so an empty import leaves the store unchanged.
    /// Returns the IDs of the created entries.
    pub fn import_character(
        &self,
        store: &mut EntryStore,
        card: &Value,
        display_name: &str,
    ) -> Result<Vec<EntryId>, StoreError> {
        let group = store.create_group(format!("{}{}", display_name.trim(), self.group_suffix));

        let mut created = Vec::new();
        for draft in book_entries(card) {
            let entry = store.create_entry(draft.with_group(Some(group.id.clone())))?;
            created.push(entry.id);
        }

        if created.is_empty() {
            store.delete_group(&group.id)?;
            info!(character = display_name, "character card had no usable world info; group rolled back");
        } else {
            info!(
                character = display_name,
                group = %group.id,
                entries = created.len(),
                "imported character world info"
            );
        }

        Ok(created)
    }
}

impl Default for CharacterImportPipeline {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}

/// The card's `character_book`, read at the top level or one level under `data`.
pub fn character_book(card: &Value) -> Option<&Value> {
    card.get("character_book")
        .or_else(|| card.get("data").and_then(|data| data.get("character_book")))
        .filter(|book| !book.is_null())
}

/// The card's display name: `data.name`, then `name`.
pub fn display_name(card: &Value) -> Option<String> {
    [card.get("data").and_then(|d| d.get("name")), card.get("name")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

/// Usable drafts from the book: enabled and with non-blank content.
fn book_entries(card: &Value) -> Vec<EntryDraft> {
    let drafts = match character_book(card).and_then(|book| book.get("entries")) {
        Some(Value::Object(entries)) => keyed_entries(entries),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_object)
            .filter(|item| !is_disabled(item))
            .map(|item| record_draft(item, &LOOSE_ALIASES))
            .collect(),
        _ => Vec::new(),
    };

    drafts
        .into_iter()
        .filter(|draft| !draft.content.trim().is_empty())
        .collect()
}
