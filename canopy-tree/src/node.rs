//! Derived tree nodes and forest helpers.
//!
//! A forest is never ground truth: it is rebuilt from the parent relation and
//! the live tab list on every event. These helpers exist for readers of a
//! cached forest (the presentation layer, the CLI dump, tests).

use crate::types::TabId;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One live tab in the forest, with its ordered children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Tab ID
    pub id: TabId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Current URL
    #[serde(default)]
    pub url: String,
    /// Favicon URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Child nodes in live tab order
    #[serde(default)]
    pub children: Vec<TreeNode>,
    /// Whether the children are shown
    #[serde(default = "default_expanded")]
    pub expanded: bool,
}

fn default_expanded() -> bool {
    true
}

// Dropping a long chain through the derived glue would recurse once per level
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl TreeNode {
    /// Whether this node has any children
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// IDs of the direct children
    pub fn child_ids(&self) -> Vec<TabId> {
        self.children.iter().map(|c| c.id).collect()
    }
}

/// Total number of nodes in a forest
pub fn count_nodes(forest: &[TreeNode]) -> usize {
    let mut pending: Vec<&TreeNode> = forest.iter().collect();
    let mut count = 0;
    while let Some(node) = pending.pop() {
        count += 1;
        pending.extend(&node.children);
    }
    count
}

/// Find a node anywhere in the forest, searching depth-first in tab order
pub fn find_node(forest: &[TreeNode], id: TabId) -> Option<&TreeNode> {
    let mut pending: Vec<&TreeNode> = forest.iter().rev().collect();
    while let Some(node) = pending.pop() {
        if node.id == id {
            return Some(node);
        }
        pending.extend(node.children.iter().rev());
    }
    None
}

/// Find a node anywhere in the forest, mutably
pub fn find_node_mut(forest: &mut [TreeNode], id: TabId) -> Option<&mut TreeNode> {
    let mut pending: Vec<&mut TreeNode> = forest.iter_mut().rev().collect();
    while let Some(node) = pending.pop() {
        if node.id == id {
            return Some(node);
        }
        pending.extend(node.children.iter_mut().rev());
    }
    None
}

/// Render a forest as an indented outline.
///
/// Collapsed nodes with children are marked `[+]` and their subtree is
/// hidden; expanded parents are marked `[-]`. Untitled tabs fall back to their
/// URL, then to `New Tab`.
pub fn render_outline(forest: &[TreeNode]) -> String {
    let mut out = String::new();
    let mut pending: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = pending.pop() {
        write_line(&mut out, node, depth);
        if node.expanded {
            pending.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
    out
}

fn write_line(out: &mut String, node: &TreeNode, depth: usize) {
    let marker = match (node.has_children(), node.expanded) {
        (false, _) => "   ",
        (true, true) => "[-]",
        (true, false) => "[+]",
    };
    let label = if !node.title.is_empty() {
        node.title.as_str()
    } else if !node.url.is_empty() {
        node.url.as_str()
    } else {
        "New Tab"
    };
    let _ = writeln!(
        out,
        "{}{} {} (#{})",
        "  ".repeat(depth),
        marker,
        label,
        node.id
    );
}
