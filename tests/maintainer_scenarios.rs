//! Tree maintenance scenarios driven through the simulated browser.
//!
//! Each test opens tabs with openers, closes some, and checks the resulting
//! parent relation and forest for one window scope.

mod common;

use canopy::{ChangeKind, EventOutcome};
use canopy_tree::{ScopeId, ScopeRecord};
use common::{Harness, shape};

/// Tabs 1, 2 (opened from 1), 3 (opened from 2) in one window
fn chain() -> (Harness, ScopeId) {
    let h = Harness::window_mode();
    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);
    let t2 = h.open_tab(w, "two", Some(t1));
    h.open_tab(w, "three", Some(t2));
    (h, ScopeId::Window(w))
}

#[test]
fn test_opener_chain_builds_nested_tree() {
    let (h, scope) = chain();

    assert_eq!(h.shape(scope), "1[2[3]]");
    let stored = h.stored(scope).unwrap();
    assert_eq!(stored.parent_relation.get(2), Some(1));
    assert_eq!(stored.parent_relation.get(3), Some(2));
    assert_eq!(shape(&stored.cached_forest), "1[2[3]]");
}

#[test]
fn test_removing_middle_tab_promotes_child_to_grandparent() {
    let (h, scope) = chain();

    assert_eq!(h.close_tab(2), EventOutcome::Persisted);

    let stored = h.stored(scope).unwrap();
    assert_eq!(stored.parent_relation.iter().collect::<Vec<_>>(), vec![(3, 1)]);
    assert_eq!(h.shape(scope), "1[3]");
}

#[test]
fn test_removing_root_promotes_child_to_root() {
    let (h, scope) = chain();

    assert_eq!(h.close_tab(1), EventOutcome::Persisted);

    let stored = h.stored(scope).unwrap();
    assert_eq!(stored.parent_relation.iter().collect::<Vec<_>>(), vec![(3, 2)]);
    assert_eq!(h.shape(scope), "2[3]");
}

#[test]
fn test_removing_leaf_keeps_rest_of_tree() {
    let (h, scope) = chain();
    h.close_tab(3);
    assert_eq!(h.shape(scope), "1[2]");
}

#[test]
fn test_stale_stored_entries_are_purged() {
    let h = Harness::window_mode();
    h.store.insert(
        ScopeId::Window(1),
        ScopeRecord {
            parent_relation: [(5, 9)].into_iter().collect(),
            expansion_states: [(9, false)].into_iter().collect(),
            cached_forest: Vec::new(),
        },
    );

    let w = h.open_window();
    assert_eq!(w, 1);
    let t1 = h.open_tab(w, "one", None);
    h.open_tab(w, "two", Some(t1));

    let stored = h.stored(ScopeId::Window(w)).unwrap();
    assert_eq!(stored.parent_relation.get(5), None);
    assert_eq!(stored.expansion_states.get(9), None);
    assert_eq!(h.shape(ScopeId::Window(w)), "1[2]");
}

#[test]
fn test_title_update_rebuilds_node() {
    let (h, scope) = chain();

    let event = h
        .browser
        .update_tab(
            3,
            canopy_tree::TabChange {
                title: Some("renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(h.deliver(event), EventOutcome::Persisted);

    let snapshot = h.maintainer.snapshot(scope).unwrap();
    assert_eq!(snapshot.forest[0].children[0].children[0].title, "renamed");
}

#[test]
fn test_toggling_leaf_is_persisted_without_structure_change() {
    let (h, scope) = chain();
    let writes = h.store.write_count();

    assert_eq!(h.maintainer.toggle_expanded(scope, 3), Some(false));

    assert_eq!(h.store.write_count(), writes + 1);
    let stored = h.stored(scope).unwrap();
    assert_eq!(stored.expansion_states.get(3), Some(false));
    assert_eq!(shape(&stored.cached_forest), "1[2[3]]");
}

#[test]
fn test_collapse_survives_rebuild() {
    let (h, scope) = chain();
    assert_eq!(h.maintainer.set_expanded(scope, 2, false), Some(false));

    // Any later event rebuilds the forest from the expansion map
    h.open_tab(1, "four", None);

    let snapshot = h.maintainer.snapshot(scope).unwrap();
    assert!(!snapshot.forest[0].children[0].expanded);
    assert_eq!(snapshot.expansion_states.get(2), Some(false));
    assert_eq!(shape(&snapshot.forest), "1[2[3]],4");
}

#[test]
fn test_toggle_twice_restores_flag() {
    let (h, scope) = chain();
    assert_eq!(h.maintainer.toggle_expanded(scope, 1), Some(false));
    assert_eq!(h.maintainer.toggle_expanded(scope, 1), Some(true));
    assert_eq!(h.stored(scope).unwrap().expansion_states.get(1), Some(true));
}

#[test]
fn test_expansion_of_unknown_tab_is_noop() {
    let (h, scope) = chain();
    let writes = h.store.write_count();

    assert_eq!(h.maintainer.set_expanded(scope, 42, false), None);
    assert_eq!(h.maintainer.toggle_expanded(ScopeId::Window(99), 1), None);

    assert_eq!(h.store.write_count(), writes);
}

#[test]
fn test_subscribers_see_every_write() {
    let h = Harness::window_mode();
    let changes = h.maintainer.subscribe();

    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);
    h.maintainer.toggle_expanded(ScopeId::Window(w), t1);

    let received: Vec<_> = changes.try_iter().collect();
    assert_eq!(received.len(), 3);
    assert!(
        received
            .iter()
            .all(|c| c.scope == ScopeId::Window(w) && c.kind == ChangeKind::Written)
    );
}

#[test]
fn test_windows_are_isolated() {
    let h = Harness::window_mode();
    let w1 = h.open_window();
    let w2 = h.open_window();
    let a = h.open_tab(w1, "a", None);
    h.open_tab(w1, "b", Some(a));
    let c = h.open_tab(w2, "c", None);
    h.open_tab(w2, "d", Some(c));

    h.close_tab(a);

    assert_eq!(h.shape(ScopeId::Window(w1)), "2");
    assert_eq!(h.shape(ScopeId::Window(w2)), "3[4]");
}
