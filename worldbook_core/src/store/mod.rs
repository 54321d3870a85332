//! Store - the worldbook snapshot, its invariants, and where it is persisted.

mod backend;
mod entry_store;
mod worldbook;

pub use backend::*;
pub use entry_store::*;
pub use worldbook::*;
