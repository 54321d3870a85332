//! # Worldbook Model
//!
//! The data crate for the worldbook: groups, entries, the snapshot that is
//! persisted as one record, and engine configuration. This crate holds no
//! import or resolution logic.

pub mod config;
pub mod records;
pub mod snapshot;

pub use config::*;
pub use records::*;
pub use snapshot::*;
