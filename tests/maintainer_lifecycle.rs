//! Scope lifecycle: start-up, window teardown, host and store failures.

mod common;

use canopy::{
    ChangeKind, DropReason, EventOutcome, HostError, MaintainerOptions, MemoryStore, SnapshotStore,
    TabHost, TabQuery, TreeMaintainer,
};
use canopy_config::ScopeMode;
use canopy_tree::{HostEvent, ScopeId, ScopeRecord, Tab, TabChange, WindowId, WindowInfo, WindowKind};
use common::{Harness, shape};
use std::sync::Arc;

fn seeded_record() -> ScopeRecord {
    ScopeRecord {
        parent_relation: [(2, 1)].into_iter().collect(),
        ..Default::default()
    }
}

// ============================================================================
// Window teardown
// ============================================================================

#[test]
fn test_closing_window_destroys_scope() {
    let h = Harness::window_mode();
    let changes = h.maintainer.subscribe();
    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);
    h.open_tab(w, "two", Some(t1));

    let outcomes = h.close_window(w);

    assert_eq!(
        outcomes,
        vec![
            EventOutcome::Ignored,
            EventOutcome::Ignored,
            EventOutcome::Destroyed
        ]
    );
    assert!(h.stored(ScopeId::Window(w)).is_none());
    assert!(h.maintainer.snapshot(ScopeId::Window(w)).is_none());
    assert!(h.maintainer.tracked_scopes().is_empty());
    let last = changes.try_iter().last().unwrap();
    assert_eq!(last.kind, ChangeKind::Removed);
}

#[test]
fn test_late_event_for_closed_window_keeps_store_untouched() {
    let h = Harness::window_mode();
    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);
    let tab = h.browser.tab(t1).unwrap();

    // Window closes in the browser, the removal events are still queued
    let queued = h.browser.close_window(w).unwrap();
    let writes = h.store.write_count();
    let stored = h.stored(ScopeId::Window(w));

    let late = HostEvent::TabUpdated {
        tab,
        change: TabChange {
            title: Some("late".into()),
            ..Default::default()
        },
    };
    assert_eq!(h.deliver(late), EventOutcome::Dropped(DropReason::ScopeGone));
    assert_eq!(h.store.write_count(), writes);
    assert_eq!(h.stored(ScopeId::Window(w)), stored);

    for event in queued {
        h.deliver(event);
    }
    assert!(h.stored(ScopeId::Window(w)).is_none());
}

#[test]
fn test_event_after_scope_destroyed_does_not_resurrect_it() {
    let h = Harness::window_mode();
    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);
    let tab = h.browser.tab(t1).unwrap();
    h.close_window(w);

    let late = HostEvent::TabUpdated {
        tab,
        change: TabChange {
            url: Some("https://late".into()),
            ..Default::default()
        },
    };
    assert!(matches!(h.deliver(late), EventOutcome::Dropped(_)));
    assert!(h.stored(ScopeId::Window(w)).is_none());
    assert!(h.maintainer.tracked_scopes().is_empty());
}

/// Host whose windows have all vanished but whose queries still succeed
struct VanishedHost;

impl TabHost for VanishedHost {
    fn query_tabs(&self, _query: TabQuery) -> Result<Vec<Tab>, HostError> {
        Ok(Vec::new())
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, HostError> {
        Ok(Vec::new())
    }

    fn window_exists(&self, _window_id: WindowId) -> bool {
        false
    }
}

#[test]
fn test_empty_query_for_vanished_window_does_not_overwrite() {
    let store = Arc::new(MemoryStore::new());
    store.insert(ScopeId::Window(3), seeded_record());
    let maintainer = TreeMaintainer::new(VanishedHost, Arc::clone(&store), MaintainerOptions::default());

    let outcome = maintainer.handle_event(HostEvent::TabRemoved {
        tab_id: 1,
        window_id: Some(3),
        window_closing: false,
    });

    assert_eq!(outcome, EventOutcome::Dropped(DropReason::ScopeGone));
    assert_eq!(store.load(ScopeId::Window(3)).unwrap(), Some(seeded_record()));
    assert_eq!(store.write_count(), 0);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_host_query_failure_drops_event() {
    let h = Harness::window_mode();
    let w = h.open_window();
    h.open_tab(w, "one", None);
    let writes = h.store.write_count();

    h.browser.set_query_failure(true);
    let (_, event) = h.browser.open_tab(w, "two", "", Some(1)).unwrap();
    assert_eq!(h.deliver(event), EventOutcome::Dropped(DropReason::HostQuery));
    assert_eq!(h.store.write_count(), writes);

    // The relation change is kept and lands with the next successful event
    h.browser.set_query_failure(false);
    h.open_tab(w, "three", None);
    assert_eq!(h.shape(ScopeId::Window(w)), "1[2],3");
}

#[test]
fn test_store_failure_keeps_mutation_for_next_write() {
    let h = Harness::window_mode();
    let w = h.open_window();
    let t1 = h.open_tab(w, "one", None);

    h.store.set_fail_writes(true);
    let (t2, event) = h.browser.open_tab(w, "two", "", Some(t1)).unwrap();
    assert_eq!(h.deliver(event), EventOutcome::Dropped(DropReason::StoreWrite));
    assert_eq!(h.stored(ScopeId::Window(w)).unwrap().parent_relation.get(t2), None);

    h.store.set_fail_writes(false);
    h.open_tab(w, "three", None);
    let stored = h.stored(ScopeId::Window(w)).unwrap();
    assert_eq!(stored.parent_relation.get(t2), Some(t1));
    assert_eq!(shape(&stored.cached_forest), "1[2],3");
}

// ============================================================================
// Start-up
// ============================================================================

#[test]
fn test_initialize_populates_and_purges() {
    let store = MemoryStore::new();
    store.insert(ScopeId::Window(1), seeded_record());
    store.insert(ScopeId::Window(7), seeded_record());
    let h = Harness::with_store(MaintainerOptions::default(), store);

    let (w, _) = h.browser.open_window(WindowKind::Normal);
    h.browser.open_tab(w, "one", "", None).unwrap();
    h.browser.open_tab(w, "two", "", None).unwrap();

    let report = h.maintainer.initialize().unwrap();

    assert_eq!(report.populated, vec![ScopeId::Window(1)]);
    assert_eq!(report.purged, vec![ScopeId::Window(7)]);
    assert_eq!(h.store.scopes().unwrap(), vec![ScopeId::Window(1)]);
    // The stored relation survives because both tabs are live again
    assert_eq!(h.shape(ScopeId::Window(1)), "1[2]");
}

#[test]
fn test_initialize_without_purge_keeps_closed_scopes() {
    let store = MemoryStore::new();
    store.insert(ScopeId::Window(7), seeded_record());
    let options = MaintainerOptions {
        purge_closed_windows_on_startup: false,
        ..Default::default()
    };
    let h = Harness::with_store(options, store);

    let report = h.maintainer.initialize().unwrap();

    assert!(report.purged.is_empty());
    assert!(h.stored(ScopeId::Window(7)).is_some());
}

#[test]
fn test_initialize_builds_popup_windows_too() {
    let h = Harness::window_mode();
    let (normal, _) = h.browser.open_window(WindowKind::Normal);
    let (popup, _) = h.browser.open_window(WindowKind::Popup);
    h.browser.open_tab(normal, "a", "", None).unwrap();
    h.browser.open_tab(popup, "b", "", None).unwrap();

    let report = h.maintainer.initialize().unwrap();

    assert_eq!(report.populated.len(), 2);
    assert_eq!(h.shape(ScopeId::Window(normal)), "1");
    assert_eq!(h.shape(ScopeId::Window(popup)), "2");
}

#[test]
fn test_popup_opening_with_tabs_stores_reconciled_empty_forest() {
    let h = Harness::window_mode();
    let scope = ScopeId::Window(7);
    h.store.insert(scope, seeded_record());
    // The host reuses the window ID; tab 2 from the old record is gone
    let event = h
        .browser
        .apply(&canopy::BrowserAction::OpenWindow {
            window: Some(7),
            kind: WindowKind::Popup,
        })
        .unwrap()
        .remove(0);
    h.browser.open_tab(7, "c", "", None).unwrap();

    assert_eq!(h.deliver(event), EventOutcome::Persisted);

    let stored = h.stored(scope).unwrap();
    assert!(stored.parent_relation.is_empty());
    assert!(stored.cached_forest.is_empty());
}

#[test]
fn test_popup_tab_events_rebuild_its_tree() {
    let h = Harness::window_mode();
    let normal = h.open_window();
    let (popup, event) = h.browser.open_window(WindowKind::Popup);
    assert_eq!(h.deliver(event), EventOutcome::Persisted);

    let a = h.open_tab(popup, "a", None);
    h.open_tab(popup, "b", Some(a));
    assert_eq!(h.shape(ScopeId::Window(popup)), "1[2]");
    assert!(h.shape(ScopeId::Window(normal)).is_empty());

    let c = h.open_tab(popup, "c", None);
    let update = h
        .browser
        .update_tab(
            c,
            TabChange {
                title: Some("renamed".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(h.deliver(update), EventOutcome::Persisted);
    assert_eq!(h.close_tab(a), EventOutcome::Persisted);
    assert_eq!(h.shape(ScopeId::Window(popup)), "2,3");
}

#[test]
fn test_popup_tab_opened_from_other_window_is_a_root() {
    let h = Harness::window_mode();
    let normal = h.open_window();
    let opener = h.open_tab(normal, "a", None);
    let (popup, event) = h.browser.open_window(WindowKind::Popup);
    h.deliver(event);

    let tab = h.open_tab(popup, "b", Some(opener));

    let stored = h.stored(ScopeId::Window(popup)).unwrap();
    assert!(stored.parent_relation.is_empty());
    assert_eq!(shape(&stored.cached_forest), tab.to_string());
    assert_eq!(h.shape(ScopeId::Window(normal)), opener.to_string());
}

#[test]
fn test_popup_tracked_when_filter_disabled() {
    let options = MaintainerOptions {
        normal_windows_only: false,
        ..Default::default()
    };
    let h = Harness::new(options);
    let (popup, event) = h.browser.open_window(WindowKind::Popup);
    h.deliver(event);
    h.open_tab(popup, "a", None);
    assert_eq!(h.shape(ScopeId::Window(popup)), "1");
}

#[test]
fn test_global_mode_initialize_skips_popup_tabs() {
    let options = MaintainerOptions {
        scope_mode: ScopeMode::Global,
        ..Default::default()
    };
    let h = Harness::new(options);
    let (normal, _) = h.browser.open_window(WindowKind::Normal);
    let (popup, _) = h.browser.open_window(WindowKind::Popup);
    h.browser.open_tab(normal, "a", "", None).unwrap();
    h.browser.open_tab(popup, "b", "", None).unwrap();
    h.browser.open_tab(normal, "c", "", None).unwrap();

    let report = h.maintainer.initialize().unwrap();

    assert_eq!(report.populated, vec![ScopeId::Global]);
    assert_eq!(h.shape(ScopeId::Global), "1,3");
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_windows_do_not_interfere() {
    let h = Harness::window_mode();
    let windows: Vec<WindowId> = (0..4).map(|_| h.open_window()).collect();

    std::thread::scope(|s| {
        for &w in &windows {
            let h = &h;
            s.spawn(move || {
                let mut previous = None;
                for i in 0..10 {
                    previous = Some(h.open_tab(w, &format!("w{w}-{i}"), previous));
                }
            });
        }
    });

    for &w in &windows {
        let snapshot = h.maintainer.snapshot(ScopeId::Window(w)).unwrap();
        assert_eq!(canopy_tree::count_nodes(&snapshot.forest), 10);
        // Each window is one chain of ten tabs
        assert_eq!(snapshot.forest.len(), 1);
    }
}

#[test]
fn test_concurrent_events_in_one_window_match_serial_result() {
    let h = Harness::window_mode();
    let w = h.open_window();
    let root = h.open_tab(w, "root", None);

    let mut children: Vec<_> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let h = &h;
                s.spawn(move || {
                    let mut opened = Vec::new();
                    for i in 0..5 {
                        let child = h.open_tab(w, &format!("c{worker}-{i}"), Some(root));
                        let grandchild = h.open_tab(w, &format!("g{worker}-{i}"), Some(child));
                        assert_eq!(h.close_tab(grandchild), EventOutcome::Persisted);
                        opened.push(child);
                    }
                    opened
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });
    children.sort();

    // Applied serially, every child hangs off the root and every
    // grandchild is gone
    let scope = ScopeId::Window(w);
    let stored = h.stored(scope).unwrap();
    let expected: canopy_tree::ParentRelation = children.iter().map(|c| (*c, root)).collect();
    assert_eq!(stored.parent_relation, expected);

    let snapshot = h.maintainer.snapshot(scope).unwrap();
    assert_eq!(snapshot.forest.len(), 1);
    assert_eq!(snapshot.forest[0].id, root);
    let mut attached = snapshot.forest[0].child_ids();
    attached.sort();
    assert_eq!(attached, children);
    assert_eq!(snapshot.forest, stored.cached_forest);
}
