//! Shared integration test helpers for canopy.
//!
//! ```ignore
//! mod common;
//! use common::{Harness, shape};
//! ```
//!
//! The `#[allow(dead_code)]` attribute suppresses warnings when only a subset
//! of helpers are used per file.

#![allow(dead_code)]

use canopy::{
    EventOutcome, MaintainerOptions, MemoryStore, SimulatedBrowser, SnapshotStore, TreeMaintainer,
};
use canopy_tree::{HostEvent, ScopeId, ScopeRecord, TabId, TreeNode, WindowId, WindowKind};
use std::sync::Arc;

pub type TestMaintainer = TreeMaintainer<SimulatedBrowser, Arc<MemoryStore>>;

/// Simulated browser, in-memory store and maintainer wired together
pub struct Harness {
    pub browser: SimulatedBrowser,
    pub store: Arc<MemoryStore>,
    pub maintainer: Arc<TestMaintainer>,
}

impl Harness {
    pub fn new(options: MaintainerOptions) -> Self {
        Self::with_store(options, MemoryStore::new())
    }

    pub fn with_store(options: MaintainerOptions, store: MemoryStore) -> Self {
        let browser = SimulatedBrowser::new();
        let store = Arc::new(store);
        let maintainer = Arc::new(TreeMaintainer::new(
            browser.clone(),
            Arc::clone(&store),
            options,
        ));
        Self {
            browser,
            store,
            maintainer,
        }
    }

    /// Per-window scoping with default settings
    pub fn window_mode() -> Self {
        Self::new(MaintainerOptions::default())
    }

    pub fn deliver(&self, event: HostEvent) -> EventOutcome {
        self.maintainer.handle_event(event)
    }

    /// Open a normal window and deliver its creation event
    pub fn open_window(&self) -> WindowId {
        let (window, event) = self.browser.open_window(WindowKind::Normal);
        assert_eq!(self.deliver(event), EventOutcome::Persisted);
        window
    }

    /// Open a tab and deliver its creation event
    pub fn open_tab(&self, window: WindowId, title: &str, opener: Option<TabId>) -> TabId {
        let (tab, event) = self
            .browser
            .open_tab(window, title, &format!("https://example.com/{title}"), opener)
            .expect("open tab");
        assert_eq!(self.deliver(event), EventOutcome::Persisted);
        tab
    }

    pub fn close_tab(&self, tab: TabId) -> EventOutcome {
        let event = self.browser.close_tab(tab).expect("close tab");
        self.deliver(event)
    }

    pub fn close_window(&self, window: WindowId) -> Vec<EventOutcome> {
        self.browser
            .close_window(window)
            .expect("close window")
            .into_iter()
            .map(|event| self.deliver(event))
            .collect()
    }

    /// Compact shape of the scope's current forest
    pub fn shape(&self, scope: ScopeId) -> String {
        let snapshot = self.maintainer.snapshot(scope).expect("snapshot");
        shape(&snapshot.forest)
    }

    /// Record as last written to the store
    pub fn stored(&self, scope: ScopeId) -> Option<ScopeRecord> {
        self.store.load(scope).expect("store load")
    }
}

/// Render a forest as `1[2[3]],4`
pub fn shape(forest: &[TreeNode]) -> String {
    forest
        .iter()
        .map(|node| {
            if node.children.is_empty() {
                node.id.to_string()
            } else {
                format!("{}[{}]", node.id, shape(&node.children))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
