//! Parent relation and expansion-state map.
//!
//! Both maps are persisted between runs and may therefore contain garbage:
//! entries for tabs that closed while nothing was listening, or keys that were
//! hand-edited into something that is not a tab ID at all. Loading is lenient
//! (unparsable entries never match a live tab, so they are dropped on the way
//! in) and the reconciler purges the rest before use.

use crate::types::TabId;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping from child tab ID to parent tab ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, LooseId>")]
pub struct ParentRelation(BTreeMap<TabId, TabId>);

impl ParentRelation {
    /// Create an empty relation
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent of `child`, if recorded
    pub fn get(&self, child: TabId) -> Option<TabId> {
        self.0.get(&child).copied()
    }

    /// Record `parent` as the parent of `child`, returning the previous parent
    pub fn insert(&mut self, child: TabId, parent: TabId) -> Option<TabId> {
        self.0.insert(child, parent)
    }

    /// Forget the parent of `child`
    pub fn remove(&mut self, child: TabId) -> Option<TabId> {
        self.0.remove(&child)
    }

    /// Children that currently point at `parent`, in ascending ID order
    pub fn children_of(&self, parent: TabId) -> Vec<TabId> {
        self.0
            .iter()
            .filter(|(_, p)| **p == parent)
            .map(|(c, _)| *c)
            .collect()
    }

    /// Keep only the entries for which `keep(child, parent)` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(TabId, TabId) -> bool) {
        self.0.retain(|child, parent| keep(*child, *parent));
    }

    /// Iterate `(child, parent)` pairs in ascending child order
    pub fn iter(&self) -> impl Iterator<Item = (TabId, TabId)> + '_ {
        self.0.iter().map(|(c, p)| (*c, *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TabId, TabId)> for ParentRelation {
    fn from_iter<I: IntoIterator<Item = (TabId, TabId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, LooseId>> for ParentRelation {
    fn from(raw: BTreeMap<String, LooseId>) -> Self {
        let mut relation = BTreeMap::new();
        for (key, value) in raw {
            match (parse_tab_id(&key), value.into_tab_id()) {
                (Some(child), Some(parent)) => {
                    relation.insert(child, parent);
                }
                _ => log::debug!("Dropping unparsable parent relation entry '{key}'"),
            }
        }
        Self(relation)
    }
}

/// Mapping from tab ID to "children visible" flag.
///
/// A missing entry means expanded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, LooseFlag>")]
pub struct ExpansionStates(BTreeMap<TabId, bool>);

impl ExpansionStates {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored flag for `tab`, if any
    pub fn get(&self, tab: TabId) -> Option<bool> {
        self.0.get(&tab).copied()
    }

    /// Effective flag for `tab` (defaults to expanded)
    pub fn is_expanded(&self, tab: TabId) -> bool {
        self.get(tab).unwrap_or(true)
    }

    pub fn set(&mut self, tab: TabId, expanded: bool) -> Option<bool> {
        self.0.insert(tab, expanded)
    }

    pub fn remove(&mut self, tab: TabId) -> Option<bool> {
        self.0.remove(&tab)
    }

    /// Keep only the entries for which `keep(tab)` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(TabId) -> bool) {
        self.0.retain(|tab, _| keep(*tab));
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, bool)> + '_ {
        self.0.iter().map(|(t, e)| (*t, *e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(TabId, bool)> for ExpansionStates {
    fn from_iter<I: IntoIterator<Item = (TabId, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, LooseFlag>> for ExpansionStates {
    fn from(raw: BTreeMap<String, LooseFlag>) -> Self {
        let mut states = BTreeMap::new();
        for (key, value) in raw {
            match (parse_tab_id(&key), value) {
                (Some(tab), LooseFlag::Flag(expanded)) => {
                    states.insert(tab, expanded);
                }
                _ => log::debug!("Dropping unparsable expansion state entry '{key}'"),
            }
        }
        Self(states)
    }
}

/// Persisted tab ID value: a number, a numeric string, or anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[doc(hidden)]
pub enum LooseId {
    Number(TabId),
    Text(String),
    Other(IgnoredAny),
}

impl LooseId {
    fn into_tab_id(self) -> Option<TabId> {
        match self {
            LooseId::Number(id) => Some(id),
            LooseId::Text(text) => parse_tab_id(&text),
            LooseId::Other(_) => None,
        }
    }
}

/// Persisted expansion flag: a boolean or anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
#[doc(hidden)]
pub enum LooseFlag {
    Flag(bool),
    Other(IgnoredAny),
}

fn parse_tab_id(text: &str) -> Option<TabId> {
    text.trim().parse().ok()
}
