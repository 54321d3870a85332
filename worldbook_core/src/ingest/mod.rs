//! Ingest - turns uploaded files into worldbook groups and entries.
//!
//! An import runs in two phases:
//! 1. **Prepare**: extract and normalize the bytes without touching the store
//! 2. **Commit**: place the prepared records into the store under a target

mod character;
mod cursor;
mod dialect;
mod docx;
mod png;

pub use character::*;
pub use cursor::*;
pub use dialect::*;
pub use docx::*;
pub use png::*;

use serde_json::Value;
use std::path::Path;
use tracing::info;

use worldbook_model::{Entry, EntryDraft, EntryId, GroupId, ImportConfig};

use crate::error::{ImportError, StoreError};
use crate::store::EntryStore;

/// Declared kind of an uploaded file. The engine trusts it beyond the PNG signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Image,
    Document,
    Json,
}

impl ImportKind {
    /// Guess the kind from a file extension.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let extension = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(ImportKind::Image),
            "docx" => Some(ImportKind::Document),
            "json" => Some(ImportKind::Json),
            _ => None,
        }
    }
}

/// Bytes handed over by the file source.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub kind: ImportKind,
}

impl ImportRequest {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, kind: ImportKind) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            kind,
        }
    }

    /// File name without its extension.
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// Result of the prepare phase.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedImport {
    /// A character card whose `character_book` becomes its own group.
    Character { card: Value, display_name: String },
    /// Plain records from a document or a world-info dialect.
    Records(NormalizedImport),
    /// Nothing usable was found.
    Nothing,
}

/// Where committed records are placed. Character imports always get their own group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// Keep the source's own groups and group assignments.
    AsImported,
    Ungrouped,
    Group(GroupId),
    /// Create a group with this name, only if at least one entry is committed.
    NewGroup(String),
}

/// What an import added to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Imported {
        group: Option<GroupId>,
        entries: Vec<EntryId>,
    },
    /// Nothing to import; the store is unchanged.
    Nothing,
}

impl ImportOutcome {
    pub fn entry_ids(&self) -> &[EntryId] {
        match self {
            ImportOutcome::Imported { entries, .. } => entries,
            ImportOutcome::Nothing => &[],
        }
    }
}

/// Dispatches uploads to the matching extractor and commits the result.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    images: ImageMetadataExtractor,
    documents: DocumentTextExtractor,
    normalizer: DialectNormalizer,
    characters: CharacterImportPipeline,
}

impl Importer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            images: ImageMetadataExtractor::from_config(config),
            documents: DocumentTextExtractor::new(),
            normalizer: DialectNormalizer::new(),
            characters: CharacterImportPipeline::from_config(config),
        }
    }

    /// Extract and normalize a request without touching any store.
    pub fn prepare(&self, request: &ImportRequest) -> Result<PreparedImport, ImportError> {
        let prepared = match request.kind {
            ImportKind::Image => match self.images.extract(&request.bytes) {
                Some(card) => self.character(card, request),
                None => PreparedImport::Nothing,
            },
            ImportKind::Document => {
                let text = self.documents.extract(&request.bytes);
                if text.is_empty() {
                    PreparedImport::Nothing
                } else {
                    PreparedImport::Records(NormalizedImport {
                        groups: Vec::new(),
                        entries: vec![Entry::from_draft(EntryDraft::new(request.stem(), text))],
                    })
                }
            }
            ImportKind::Json => {
                let json: Value =
                    serde_json::from_slice(&request.bytes).map_err(ImportError::MalformedJson)?;
                if character_book(&json).is_some() {
                    self.character(json, request)
                } else {
                    let records = self.normalizer.normalize(&json);
                    if records.is_empty() {
                        PreparedImport::Nothing
                    } else {
                        PreparedImport::Records(records)
                    }
                }
            }
        };
        Ok(prepared)
    }

    /// Place prepared records into the store.
    pub fn commit(
        &self,
        store: &mut EntryStore,
        prepared: PreparedImport,
        target: ImportTarget,
    ) -> Result<ImportOutcome, ImportError> {
        let outcome = match prepared {
            PreparedImport::Nothing => ImportOutcome::Nothing,
            PreparedImport::Character { card, display_name } => {
                let entries = self.characters.import_character(store, &card, &display_name)?;
                match entries.first() {
                    Some(first) => ImportOutcome::Imported {
                        group: store.entry(first).and_then(|e| e.group_id.clone()),
                        entries,
                    },
                    None => ImportOutcome::Nothing,
                }
            }
            PreparedImport::Records(records) => commit_records(store, records, target)?,
        };

        if let ImportOutcome::Imported { entries, .. } = &outcome {
            info!(entries = entries.len(), "import committed");
        }
        Ok(outcome)
    }

    /// Prepare and commit in one step.
    pub fn import(
        &self,
        store: &mut EntryStore,
        request: &ImportRequest,
        target: ImportTarget,
    ) -> Result<ImportOutcome, ImportError> {
        let prepared = self.prepare(request)?;
        self.commit(store, prepared, target)
    }

    fn character(&self, card: Value, request: &ImportRequest) -> PreparedImport {
        let display_name = display_name(&card).unwrap_or_else(|| request.stem());
        PreparedImport::Character { card, display_name }
    }
}

fn commit_records(
    store: &mut EntryStore,
    records: NormalizedImport,
    target: ImportTarget,
) -> Result<ImportOutcome, StoreError> {
    if records.is_empty() {
        return Ok(ImportOutcome::Nothing);
    }

    let NormalizedImport { groups, mut entries } = records;
    let group = match target {
        ImportTarget::AsImported => {
            for group in groups {
                store.insert_group(group);
            }
            for entry in &mut entries {
                if entry.group_id.as_ref().is_some_and(|id| store.group(id).is_none()) {
                    entry.group_id = None;
                }
            }
            None
        }
        ImportTarget::Ungrouped => {
            assign_all(&mut entries, None);
            None
        }
        ImportTarget::Group(id) => {
            if store.group(&id).is_none() {
                return Err(StoreError::GroupNotFound(id));
            }
            assign_all(&mut entries, Some(&id));
            Some(id)
        }
        ImportTarget::NewGroup(name) => {
            if name.trim().is_empty() {
                return Err(StoreError::EmptyName);
            }
            let group = store.create_group(name);
            assign_all(&mut entries, Some(&group.id));
            Some(group.id)
        }
    };

    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let draft = EntryDraft::new(entry.name, entry.content)
            .with_group(entry.group_id)
            .with_keywords(entry.keywords)
            .with_enabled(entry.enabled);
        ids.push(store.create_entry(draft)?.id);
    }

    Ok(ImportOutcome::Imported {
        group,
        entries: ids,
    })
}

fn assign_all(entries: &mut [Entry], group: Option<&GroupId>) {
    for entry in entries {
        entry.group_id = group.cloned();
    }
}
