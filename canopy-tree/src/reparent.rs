//! Child promotion when a tab is removed.

use crate::relation::{ExpansionStates, ParentRelation};
use crate::types::TabId;

/// Move the children of `removed` up one level and forget `removed`.
///
/// Every tab whose parent was `removed` is re-pointed at `removed`'s own
/// parent (its grandparent), or becomes a root when there is none. Deeper
/// descendants keep their entries, so the subtree survives flattened by one
/// level at the removal point. The entries for `removed` itself are dropped
/// from both maps.
///
/// Returns the children that were re-pointed or released, in ascending ID
/// order.
pub fn reparent_children(
    relation: &mut ParentRelation,
    expansion: &mut ExpansionStates,
    removed: TabId,
) -> Vec<TabId> {
    let grandparent = relation.get(removed).filter(|g| *g != removed);
    let children = relation.children_of(removed);

    for child in &children {
        match grandparent {
            // A corrupt two-tab loop would otherwise turn into a self-reference.
            Some(g) if g != *child => {
                relation.insert(*child, g);
            }
            _ => {
                relation.remove(*child);
            }
        }
    }

    relation.remove(removed);
    expansion.remove(removed);

    if !children.is_empty() {
        match grandparent {
            Some(g) => log::debug!(
                "Tab {removed} removed: moved children {children:?} under tab {g}"
            ),
            None => log::debug!("Tab {removed} removed: children {children:?} are now roots"),
        }
    }
    children
}
