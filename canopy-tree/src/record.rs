//! The per-scope persisted record.
//!
//! One record per scope holds the two sources of truth (parent relation and
//! expansion states) plus the cached forest that readers render from.

use crate::builder::build_forest;
use crate::node::{TreeNode, find_node_mut};
use crate::reconcile::{ReconcileReport, reconcile};
use crate::relation::{ExpansionStates, ParentRelation};
use crate::types::{Tab, TabId};
use serde::{Deserialize, Serialize};

/// Persisted state for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRecord {
    /// Child -> parent tab relation
    #[serde(default)]
    pub parent_relation: ParentRelation,
    /// Per-tab expanded/collapsed flags
    #[serde(default)]
    pub expansion_states: ExpansionStates,
    /// Forest built from the two maps at the last write
    #[serde(default)]
    pub cached_forest: Vec<TreeNode>,
}

/// What the presentation layer reads for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSnapshot {
    pub forest: Vec<TreeNode>,
    pub expansion_states: ExpansionStates,
}

impl ScopeRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Purge stale entries against `tabs` and rebuild the cached forest.
    pub fn rebuild(&mut self, tabs: &[Tab]) -> ReconcileReport {
        let report = reconcile(tabs, &mut self.parent_relation, &mut self.expansion_states);
        self.cached_forest = build_forest(tabs, &self.parent_relation, &self.expansion_states);
        report
    }

    /// Purge stale entries against `tabs` and leave the cached forest empty.
    pub fn reconcile_without_forest(&mut self, tabs: &[Tab]) -> ReconcileReport {
        let report = reconcile(tabs, &mut self.parent_relation, &mut self.expansion_states);
        self.cached_forest.clear();
        report
    }

    /// Set one tab's expansion flag, patching the cached node in place.
    ///
    /// Returns `false` (and changes nothing) if the tab is not in the cached
    /// forest.
    pub fn set_expanded(&mut self, tab: TabId, expanded: bool) -> bool {
        let Some(node) = find_node_mut(&mut self.cached_forest, tab) else {
            return false;
        };
        node.expanded = expanded;
        self.expansion_states.set(tab, expanded);
        true
    }

    /// Copy of the forest and expansion states
    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            forest: self.cached_forest.clone(),
            expansion_states: self.expansion_states.clone(),
        }
    }
}
