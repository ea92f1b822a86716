//! Per-scope state held by the maintainer.

use canopy_tree::ScopeRecord;

/// Lifecycle of a scope slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Nothing loaded yet; the first event loads the stored record
    Uninitialized,
    /// Record loaded and owned in memory
    Ready,
}

/// One scope's state. Guarded by its own mutex in the registry.
#[derive(Debug)]
pub struct ScopeSlot {
    pub state: ScopeState,
    pub record: ScopeRecord,
    /// Set once the scope is torn down; handlers still holding the slot no-op
    pub destroyed: bool,
}

impl ScopeSlot {
    pub fn new() -> Self {
        Self {
            state: ScopeState::Uninitialized,
            record: ScopeRecord::new(),
            destroyed: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == ScopeState::Ready && !self.destroyed
    }

    /// Take ownership of a loaded record and mark the slot ready
    pub fn load(&mut self, record: ScopeRecord) {
        self.record = record;
        self.state = ScopeState::Ready;
    }
}

impl Default for ScopeSlot {
    fn default() -> Self {
        Self::new()
    }
}
