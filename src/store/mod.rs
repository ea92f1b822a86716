//! Scope-keyed snapshot persistence
//!
//! A store holds one [`ScopeRecord`] per scope. The maintainer writes the
//! whole record on every change, so implementations only need whole-record
//! load/save/remove.
//!
//! - `memory`: in-process map (tests, embedding)
//! - `file`: single JSON file `{ "<scope>": record }` written atomically

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use canopy_tree::{ScopeId, ScopeRecord};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a snapshot store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access snapshot file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The store refused the write (used by test doubles)
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence sink for scope records.
pub trait SnapshotStore: Send + Sync {
    /// Stored record for `scope`, if any
    fn load(&self, scope: ScopeId) -> Result<Option<ScopeRecord>, StoreError>;

    /// Replace the stored record for `scope`
    fn save(&self, scope: ScopeId, record: &ScopeRecord) -> Result<(), StoreError>;

    /// Delete the stored record for `scope`; returns whether one existed
    fn remove(&self, scope: ScopeId) -> Result<bool, StoreError>;

    /// All scopes with a stored record
    fn scopes(&self) -> Result<Vec<ScopeId>, StoreError>;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn load(&self, scope: ScopeId) -> Result<Option<ScopeRecord>, StoreError> {
        (**self).load(scope)
    }

    fn save(&self, scope: ScopeId, record: &ScopeRecord) -> Result<(), StoreError> {
        (**self).save(scope, record)
    }

    fn remove(&self, scope: ScopeId) -> Result<bool, StoreError> {
        (**self).remove(scope)
    }

    fn scopes(&self) -> Result<Vec<ScopeId>, StoreError> {
        (**self).scopes()
    }
}
