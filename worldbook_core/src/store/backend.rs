//! Persistence backends for worldbook snapshots.
//!
//! The engine treats storage as one logical record per key: a snapshot is
//! always read and written whole.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use worldbook_model::Snapshot;

use crate::error::StorageError;

/// Keyed storage for whole snapshots.
pub trait KeyedStore: Send + Sync {
    /// Read the record stored under `key`, or `None` if there is none.
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError>;

    /// Replace the record stored under `key`.
    fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// In-memory backend that keeps the serialized JSON of each record.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw JSON under a key, as another producer would have written it.
    pub fn put_raw(&self, key: &str, json: impl Into<String>) -> Result<(), StorageError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned("memory.put_raw"))?;
        records.insert(key.to_string(), json.into());
        Ok(())
    }
}

impl KeyedStore for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let records = self
            .records
            .read()
            .map_err(|_| StorageError::LockPoisoned("memory.load"))?;
        records
            .get(key)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(StorageError::from)
    }

    fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let raw = serde_json::to_string(snapshot)?;
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::LockPoisoned("memory.save"))?;
        records.insert(key.to_string(), raw);
        Ok(())
    }
}

/// File backend storing each key as `{dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyedStore for JsonFileBackend {
    fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let raw = match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let staging = self
            .dir
            .join(format!("{key}.json.tmp.{}", Uuid::new_v4().simple()));

        let written = write_synced(&staging, &serde_json::to_vec_pretty(snapshot)?)
            .and_then(|()| fs::rename(&staging, &path));
        if let Err(err) = written {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }

        debug!(path = %path.display(), "saved worldbook snapshot");
        Ok(())
    }
}

/// Write `bytes` to a fresh file and flush it to disk.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
