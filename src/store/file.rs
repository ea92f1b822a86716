//! File-backed snapshot store
//!
//! All scopes share one JSON object keyed by scope (`"global"` or a window
//! ID). The file is read once on open and kept in memory; every change
//! rewrites the whole file through a temp file and a rename so a crash never
//! leaves a half-written snapshot behind.

use super::{SnapshotStore, StoreError};
use canopy_tree::{ScopeId, ScopeRecord};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot store persisting every scope to a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<ScopeId, ScopeRecord>>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing or empty file yields an empty store. Entries with an
    /// unrecognised scope key or a malformed record are skipped; a file that
    /// is not a JSON object at all is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = Self::read_records(&path)?;
        log::info!(
            "Opened snapshot store {:?} ({} scopes)",
            path,
            records.len()
        );
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_records(path: &Path) -> Result<BTreeMap<ScopeId, ScopeRecord>, StoreError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut de = serde_json::Deserializer::from_str(&contents);
        // A long opener chain nests far deeper than the default limit
        de.disable_recursion_limit();
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(&mut de)
            .and_then(|raw| de.end().map(|()| raw))
            .map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut records = BTreeMap::new();
        for (key, value) in raw {
            let scope = match key.parse::<ScopeId>() {
                Ok(scope) => scope,
                Err(e) => {
                    log::warn!("Skipping snapshot entry with bad scope key: {}", e);
                    continue;
                }
            };
            match serde_json::from_value::<ScopeRecord>(value) {
                Ok(record) => {
                    records.insert(scope, record);
                }
                Err(e) => log::warn!("Skipping malformed snapshot for scope {}: {}", scope, e),
            }
        }
        Ok(records)
    }

    fn write_records(&self, records: &BTreeMap<ScopeId, ScopeRecord>) -> Result<(), StoreError> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let keyed: BTreeMap<String, &ScopeRecord> = records
            .iter()
            .map(|(scope, record)| (scope.to_string(), record))
            .collect();
        let json = serde_json::to_string_pretty(&keyed).map_err(StoreError::Serialize)?;

        // Atomic save: write to temp file then rename
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json).map_err(io_err)?;
        fs::rename(&temp_path, &self.path).map_err(io_err)?;

        log::trace!("Wrote {} scopes to {:?}", records.len(), self.path);
        Ok(())
    }
}

impl SnapshotStore for FileStore {
    fn load(&self, scope: ScopeId) -> Result<Option<ScopeRecord>, StoreError> {
        Ok(self.records.lock().get(&scope).cloned())
    }

    fn save(&self, scope: ScopeId, record: &ScopeRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let previous = records.insert(scope, record.clone());
        if let Err(e) = self.write_records(&records) {
            // Keep memory and disk in agreement
            match previous {
                Some(previous) => records.insert(scope, previous),
                None => records.remove(&scope),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&self, scope: ScopeId) -> Result<bool, StoreError> {
        let mut records = self.records.lock();
        let Some(previous) = records.remove(&scope) else {
            return Ok(false);
        };
        if let Err(e) = self.write_records(&records) {
            records.insert(scope, previous);
            return Err(e);
        }
        Ok(true)
    }

    fn scopes(&self) -> Result<Vec<ScopeId>, StoreError> {
        Ok(self.records.lock().keys().copied().collect())
    }
}
