//! JSON file persistence for the record store.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{DossierError, Result};
use crate::store::Store;

/// Where the store goes at each persist point.
pub trait StorePersister: Send + Sync {
    fn persist(&self, store: &Store) -> Result<()>;
}

/// The whole store as one JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Store> {
        if !self.path.exists() {
            return Err(DossierError::StoreNotFound(self.path.clone()));
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| DossierError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| DossierError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Write to a temp file next to the target, then rename over it. A crash mid-write
    /// leaves the previous document intact.
    pub fn save(&self, store: &Store) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| DossierError::Io {
            path: self.path.clone(),
            source,
        };

        let tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, store).map_err(|source| DossierError::Json {
                path: self.path.clone(),
                source,
            })?;
            writer.flush().map_err(io_err)?;
        }
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!(path = %self.path.display(), people = store.emails.len(), "Store saved");
        Ok(())
    }
}

impl StorePersister for JsonFileStore {
    fn persist(&self, store: &Store) -> Result<()> {
        self.save(store)
    }
}
