//! Error types for the worldbook engine.
//!
//! Only malformed import JSON is a user-visible failure. "Not this format",
//! "no text found" and dangling association ids are ordinary outcomes and
//! never reach these enums.

use thiserror::Error;
use worldbook_model::{EntryId, GroupId};

/// Violations of store invariants or references to missing records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Name cannot be empty")]
    EmptyName,
}

/// Failures of a persistence backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Out-of-bounds read while walking a binary container.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Read of {wanted} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        len: usize,
    },
}

/// Failures surfaced to the caller of an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Import data is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Umbrella error for the serialized [`crate::Worldbook`] handle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Import(#[from] ImportError),
}
