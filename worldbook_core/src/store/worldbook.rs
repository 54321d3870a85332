//! Worldbook handle - serializes load, mutate and save over one keyed record.

use std::sync::Mutex;
use tracing::debug;

use worldbook_model::{EngineConfig, EntryId};

use super::{EntryStore, JsonFileBackend, KeyedStore};
use crate::association::{AgentReference, AssociationResolver};
use crate::error::{EngineError, StorageError};
use crate::ingest::{ImportOutcome, ImportRequest, ImportTarget, Importer};

/// Shared entry point for callers that may run concurrently.
///
/// Every mutation holds one lock across load, change and save, so two
/// concurrent mutations cannot overwrite each other's work.
pub struct Worldbook<B: KeyedStore> {
    backend: B,
    key: String,
    importer: Importer,
    resolver: AssociationResolver,
    lock: Mutex<()>,
}

impl<B: KeyedStore> Worldbook<B> {
    pub fn new(backend: B, config: &EngineConfig) -> Self {
        Self {
            backend,
            key: config.storage.key.clone(),
            importer: Importer::new(&config.import),
            resolver: AssociationResolver::new(config.prompt.clone()),
            lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the current record and run `f` over it.
    pub fn read<T>(&self, f: impl FnOnce(&EntryStore) -> T) -> Result<T, EngineError> {
        let store = EntryStore::load(&self.backend, &self.key)?;
        Ok(f(&store))
    }

    /// Load, change and save under the lock. Nothing is saved when `f` fails.
    pub fn mutate<T, E>(
        &self,
        f: impl FnOnce(&mut EntryStore) -> Result<T, E>,
    ) -> Result<T, EngineError>
    where
        E: Into<EngineError>,
    {
        self.locked(f, |_| true)
    }

    /// Import one uploaded file. A `Nothing` outcome is not saved.
    pub fn import(
        &self,
        request: &ImportRequest,
        target: ImportTarget,
    ) -> Result<ImportOutcome, EngineError> {
        let prepared = self.importer.prepare(request)?;
        self.locked(
            |store| self.importer.commit(store, prepared, target),
            |outcome| *outcome != ImportOutcome::Nothing,
        )
    }

    /// Run `f` under the lock and save when it succeeds and `should_save` agrees.
    fn locked<T, E>(
        &self,
        f: impl FnOnce(&mut EntryStore) -> Result<T, E>,
        should_save: impl FnOnce(&T) -> bool,
    ) -> Result<T, EngineError>
    where
        E: Into<EngineError>,
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StorageError::LockPoisoned("worldbook.mutate"))?;

        let mut store = EntryStore::load(&self.backend, &self.key)?;
        let value = f(&mut store).map_err(Into::<EngineError>::into)?;
        if should_save(&value) {
            store.save(&self.backend, &self.key)?;
            debug!(key = %self.key, entries = store.entry_count(), "worldbook mutation saved");
        }
        Ok(value)
    }

    /// Resolve entry ids into prompt text against the current record.
    pub fn resolve(&self, ids: &[EntryId]) -> Result<String, EngineError> {
        self.read(|store| self.resolver.resolve(store.snapshot(), ids))
    }

    /// Resolve an agent's associated entries into prompt text.
    pub fn resolve_for(&self, agent: &AgentReference) -> Result<String, EngineError> {
        self.read(|store| self.resolver.resolve_for(store.snapshot(), agent))
    }
}

impl Worldbook<JsonFileBackend> {
    /// Open the file-backed worldbook under the configured data directory.
    pub fn open(config: &EngineConfig) -> Self {
        Self::new(JsonFileBackend::new(&config.storage.data_dir), config)
    }
}
