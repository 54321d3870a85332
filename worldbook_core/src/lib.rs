//! # Worldbook Core
//!
//! The engine behind the worldbook: it ingests character cards and
//! world-info files, keeps groups and entries consistent, supports batch
//! organization, and resolves an agent's associated entries into prompt text.
//!
//! ## Core Components
//!
//! - **store**: The entry store, its persistence backends and the serialized [`Worldbook`] handle
//! - **ingest**: PNG card extraction, docx text recovery, JSON dialect normalization and character import
//! - **organizer**: Selection-scoped batch moves and deletes
//! - **association**: Prompt text for an agent's associated entries
//!
//! ## Design Philosophy
//!
//! - **Snapshot-Driven**: Every operation loads the whole record, changes it, and saves it whole
//! - **Lenient Input**: Foreign or damaged files yield nothing to import instead of an error

pub mod association;
pub mod error;
pub mod ingest;
pub mod organizer;
pub mod store;

pub use association::*;
pub use error::*;
pub use ingest::*;
pub use organizer::*;
pub use store::*;
