//! Tab tree maintenance core for canopy.
//!
//! This crate holds the pure, I/O-free part of the tab tree maintainer:
//!
//! - Core identifiers and host-supplied tab data (`types.rs`)
//! - The persisted parent relation and expansion-state map (`relation.rs`)
//! - Derived tree nodes and forest helpers (`node.rs`)
//! - Stale-reference purging against the live tab list (`reconcile.rs`)
//! - Forest construction from relation + live tabs (`builder.rs`)
//! - Child promotion when a tab is removed (`reparent.rs`)
//! - The per-scope persisted record (`record.rs`)
//! - Host lifecycle events (`event.rs`)
//!
//! Everything that talks to a browser or to storage lives in the root `canopy`
//! crate; this crate only transforms values.

mod builder;
mod event;
mod node;
mod reconcile;
mod record;
mod relation;
mod reparent;
mod types;

pub use builder::build_forest;
pub use event::{HostEvent, TabChange};
pub use node::{TreeNode, count_nodes, find_node, find_node_mut, render_outline};
pub use reconcile::{ReconcileReport, reconcile};
pub use record::{ScopeRecord, ScopeSnapshot};
pub use relation::{ExpansionStates, ParentRelation};
pub use reparent::reparent_children;
pub use types::{ParseScopeIdError, ScopeId, Tab, TabId, WindowId, WindowInfo, WindowKind};
