//! Association resolver - turns an agent's associated entry IDs into prompt text.
//!
//! Resolution works in two steps:
//! 1. **Selection**: look up each ID in order, dropping unknown, disabled and repeated ones
//! 2. **Assembly**: render each surviving entry as a headed block and join the blocks
//!
//! Stale IDs are expected, since entries can be deleted after an agent references them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use worldbook_model::{Entry, EntryId, PromptConfig, Snapshot};

/// The part of an agent record that references worldbook entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReference {
    #[serde(rename = "worldbookIds", default)]
    pub worldbook_ids: Vec<EntryId>,
}

impl AgentReference {
    pub fn new(worldbook_ids: Vec<EntryId>) -> Self {
        Self { worldbook_ids }
    }
}

/// Builds prompt text from associated entries.
#[derive(Debug, Clone, Default)]
pub struct AssociationResolver {
    config: PromptConfig,
}

impl AssociationResolver {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Entries that survive resolution, in input order.
    ///
    /// Unknown and disabled IDs are skipped. A repeated ID keeps its first position.
    pub fn collect_entries<'a>(&self, snapshot: &'a Snapshot, ids: &[EntryId]) -> Vec<&'a Entry> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| snapshot.entry(id))
            .filter(|entry| entry.enabled)
            .collect()
    }

    /// Render the associated entries as prompt text. Returns an empty string
    /// when nothing survives.
    pub fn resolve(&self, snapshot: &Snapshot, ids: &[EntryId]) -> String {
        let entries = self.collect_entries(snapshot, ids);
        debug!(requested = ids.len(), resolved = entries.len(), "resolved associations");

        entries
            .iter()
            .map(|entry| self.render_block(entry))
            .collect::<Vec<_>>()
            .join(&self.config.block_separator)
    }

    /// Resolve the entries an agent references.
    pub fn resolve_for(&self, snapshot: &Snapshot, agent: &AgentReference) -> String {
        self.resolve(snapshot, &agent.worldbook_ids)
    }

    fn render_block(&self, entry: &Entry) -> String {
        format!(
            "{}{}{}\n{}",
            self.config.header_open, entry.name, self.config.header_close, entry.content
        )
    }
}
