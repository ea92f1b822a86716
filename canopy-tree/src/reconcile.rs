//! Stale-reference purging against the live tab list.

use crate::relation::{ExpansionStates, ParentRelation};
use crate::types::{Tab, TabId};
use std::collections::HashSet;

/// Number of entries dropped by one [`reconcile`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Relation entries whose child or parent is not live
    pub stale_relations: usize,
    /// Expansion entries whose tab is not live
    pub stale_expansions: usize,
}

impl ReconcileReport {
    /// Whether the pass changed anything
    pub fn is_clean(&self) -> bool {
        self.stale_relations == 0 && self.stale_expansions == 0
    }
}

/// Drop every relation and expansion entry that references a tab missing
/// from `tabs`.
///
/// A relation entry survives only if both its child and its parent are live.
/// Running this twice with the same tab list changes nothing the second time.
pub fn reconcile(
    tabs: &[Tab],
    relation: &mut ParentRelation,
    expansion: &mut ExpansionStates,
) -> ReconcileReport {
    let live: HashSet<TabId> = tabs.iter().map(|t| t.id).collect();

    let relations_before = relation.len();
    relation.retain(|child, parent| live.contains(&child) && live.contains(&parent));

    let expansions_before = expansion.len();
    expansion.retain(|tab| live.contains(&tab));

    let report = ReconcileReport {
        stale_relations: relations_before - relation.len(),
        stale_expansions: expansions_before - expansion.len(),
    };
    if !report.is_clean() {
        log::debug!(
            "Reconciled against {} live tabs: dropped {} relation and {} expansion entries",
            live.len(),
            report.stale_relations,
            report.stale_expansions
        );
    }
    report
}
