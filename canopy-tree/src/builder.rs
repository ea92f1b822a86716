//! Forest construction from the parent relation and the live tab list.
//!
//! Nodes are linked through slot indices first and only assembled into owned
//! `TreeNode` values once every slot has exactly one place (a root or one
//! parent's child list). That keeps the assembly a plain walk over a tree even
//! when the relation is corrupt.

use crate::node::TreeNode;
use crate::relation::{ExpansionStates, ParentRelation};
use crate::types::{Tab, TabId};
use std::collections::HashMap;

/// Build the ordered forest for `tabs`.
///
/// Every live tab appears exactly once. A tab is nested under its recorded
/// parent when that parent is live and is not the tab itself; otherwise it is
/// a root. Children keep the order of `tabs`. If the relation contains a cycle
/// between distinct tabs, the cycle member that comes first in `tabs` is
/// promoted to a root.
pub fn build_forest(
    tabs: &[Tab],
    relation: &ParentRelation,
    expansion: &ExpansionStates,
) -> Vec<TreeNode> {
    let mut slot_of: HashMap<TabId, usize> = HashMap::with_capacity(tabs.len());
    let mut slots: Vec<&Tab> = Vec::with_capacity(tabs.len());
    for tab in tabs {
        if slot_of.contains_key(&tab.id) {
            log::debug!("Ignoring duplicate live tab {}", tab.id);
            continue;
        }
        slot_of.insert(tab.id, slots.len());
        slots.push(tab);
    }

    let mut parent_of: Vec<Option<usize>> = slots
        .iter()
        .map(|tab| match relation.get(tab.id) {
            Some(parent) if parent == tab.id => {
                log::debug!("Tab {} is recorded as its own parent, treating as root", tab.id);
                None
            }
            Some(parent) => slot_of.get(&parent).copied(),
            None => None,
        })
        .collect();

    break_cycles(&mut parent_of, &slots);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); slots.len()];
    let mut roots = Vec::new();
    for (slot, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(parent) => children[*parent].push(slot),
            None => roots.push(slot),
        }
    }

    assemble(&roots, &slots, &children, expansion)
}

/// Detach one member of every parent cycle so all slots reach a root.
fn break_cycles(parent_of: &mut [Option<usize>], slots: &[&Tab]) {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        OnPath,
        Rooted,
    }

    let mut marks = vec![Mark::Unvisited; parent_of.len()];
    let mut path = Vec::new();

    for start in 0..parent_of.len() {
        path.clear();
        let mut cursor = Some(start);
        while let Some(slot) = cursor {
            match marks[slot] {
                Mark::Rooted => break,
                Mark::OnPath => {
                    // `slot` closes a loop: everything on the path from its
                    // first occurrence onwards is a cycle member.
                    let first = path.iter().position(|s| *s == slot).unwrap_or(0);
                    let promoted = path[first..].iter().copied().min().unwrap_or(slot);
                    log::debug!(
                        "Parent cycle detected at tab {}, promoting it to root",
                        slots[promoted].id
                    );
                    parent_of[promoted] = None;
                    break;
                }
                Mark::Unvisited => {
                    marks[slot] = Mark::OnPath;
                    path.push(slot);
                    cursor = parent_of[slot];
                }
            }
        }
        for slot in &path {
            marks[*slot] = Mark::Rooted;
        }
    }
}

/// Turn the slot links into owned nodes, children before their parents, so
/// chain depth never reaches the call stack.
fn assemble(
    roots: &[usize],
    slots: &[&Tab],
    children: &[Vec<usize>],
    expansion: &ExpansionStates,
) -> Vec<TreeNode> {
    // Pre-order: every parent precedes its children
    let mut order = Vec::with_capacity(slots.len());
    let mut pending: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = pending.pop() {
        order.push(slot);
        pending.extend(children[slot].iter().rev().copied());
    }

    let mut built: Vec<Option<TreeNode>> = (0..slots.len()).map(|_| None).collect();
    for &slot in order.iter().rev() {
        let tab = slots[slot];
        let node = TreeNode {
            id: tab.id,
            title: tab.title.clone(),
            url: tab.url.clone(),
            fav_icon_url: tab.fav_icon_url.clone(),
            children: children[slot]
                .iter()
                .filter_map(|child| built[*child].take())
                .collect(),
            expanded: expansion.is_expanded(tab.id),
        };
        built[slot] = Some(node);
    }

    roots.iter().filter_map(|root| built[*root].take()).collect()
}
