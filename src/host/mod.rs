//! Browser host abstraction
//!
//! The maintainer never owns tabs; it asks the host for the live tab list of a
//! scope whenever it needs ground truth. This module defines that seam:
//!
//! - `TabHost`: live queries the maintainer relies on
//! - `TabQuery`: which tabs a scope covers
//! - `HostError`: why a query could not be answered
//! - `simulated`: an in-process browser used by the CLI replay and tests

pub mod simulated;

pub use simulated::{BrowserAction, SimulatedBrowser};

use canopy_tree::{Tab, WindowId, WindowInfo};
use std::sync::Arc;
use thiserror::Error;

/// Which live tabs to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabQuery {
    /// Every tab in every window
    All,
    /// Tabs of one window
    Window(WindowId),
}

/// Errors reported by a host query
#[derive(Debug, Error)]
pub enum HostError {
    /// The window was closed (or never existed)
    #[error("window {0} does not exist")]
    WindowGone(WindowId),

    /// The tab does not exist
    #[error("tab {0} does not exist")]
    TabGone(u64),

    /// An ID the caller asked for is already in use
    #[error("{kind} id {id} is already in use")]
    DuplicateId { kind: &'static str, id: u64 },

    /// The host could not answer the query
    #[error("host query failed: {0}")]
    Query(String),
}

/// Live tab and window queries provided by the browser host.
pub trait TabHost: Send + Sync {
    /// All current tabs matching `query`, in tab strip order
    fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, HostError>;

    /// All currently open windows
    fn windows(&self) -> Result<Vec<WindowInfo>, HostError>;

    /// Whether `window_id` is still open
    fn window_exists(&self, window_id: WindowId) -> bool;
}

impl<T: TabHost + ?Sized> TabHost for Arc<T> {
    fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, HostError> {
        (**self).query_tabs(query)
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, HostError> {
        (**self).windows()
    }

    fn window_exists(&self, window_id: WindowId) -> bool {
        (**self).window_exists(window_id)
    }
}
