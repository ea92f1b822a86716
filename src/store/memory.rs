//! In-memory snapshot store

use super::{SnapshotStore, StoreError};
use canopy_tree::{ScopeId, ScopeRecord};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Snapshot store backed by a map, with write counting and failure injection
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<ScopeId, ScopeRecord>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following `save` fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a record without counting it as a write
    pub fn insert(&self, scope: ScopeId, record: ScopeRecord) {
        self.records.lock().insert(scope, record);
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, scope: ScopeId) -> Result<Option<ScopeRecord>, StoreError> {
        Ok(self.records.lock().get(&scope).cloned())
    }

    fn save(&self, scope: ScopeId, record: &ScopeRecord) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "writes disabled for scope {scope}"
            )));
        }
        self.records.lock().insert(scope, record.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, scope: ScopeId) -> Result<bool, StoreError> {
        Ok(self.records.lock().remove(&scope).is_some())
    }

    fn scopes(&self) -> Result<Vec<ScopeId>, StoreError> {
        Ok(self.records.lock().keys().copied().collect())
    }
}
