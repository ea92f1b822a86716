//! canopy: keeps a browser's tabs organised as opener trees.
//!
//! The pure tree logic lives in `canopy-tree`; this crate wires it to a
//! browser host and a snapshot store:
//!
//! - `host`: the live tab query seam and an in-process simulated browser
//! - `store`: scope-keyed record persistence (memory and JSON file)
//! - `maintainer`: event handling, per-scope state and change notifications
//! - `pump`: single-writer async event queue
//! - `replay`: JSON Lines scripts driving the simulated browser
//! - `cli` / `debug`: binary glue and the log bridge

pub mod cli;
pub mod debug;
pub mod host;
pub mod maintainer;
pub mod pump;
pub mod replay;
pub mod store;

pub use host::{BrowserAction, HostError, SimulatedBrowser, TabHost, TabQuery};
pub use maintainer::{
    ChangeKind, DropReason, EventOutcome, MaintainerOptions, SnapshotChanged, StartupReport,
    TreeMaintainer,
};
pub use pump::{EventPump, PumpStats};
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError};
