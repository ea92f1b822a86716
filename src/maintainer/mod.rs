//! Event-driven tab tree maintenance
//!
//! [`TreeMaintainer`] owns one [`ScopeSlot`] per scope and turns every
//! [`HostEvent`] into the same pipeline:
//!
//! 1. apply the relation change the event implies
//! 2. re-query the live tabs of the scope
//! 3. reconcile the stored maps against them
//! 4. rebuild the forest
//! 5. persist the record and notify subscribers
//!
//! Each slot sits behind its own mutex held for the whole pipeline, so two
//! handlers for one scope never interleave while different scopes proceed in
//! parallel. The registry lock is only held to look up or insert a slot.
//!
//! A non-normal window opening with `normal_windows_only` set stops after
//! step 3 and stores an empty forest. Its later tab events run the whole
//! pipeline like any other window.

pub mod notify;
pub mod scope;

pub use notify::{ChangeKind, ChangeNotifier, SnapshotChanged};
pub use scope::{ScopeSlot, ScopeState};

use crate::host::{HostError, TabHost, TabQuery};
use crate::store::SnapshotStore;
use canopy_config::{Config, ScopeMode};
use canopy_tree::{
    HostEvent, ScopeId, ScopeRecord, ScopeSnapshot, Tab, TabId, WindowId, find_node,
    reparent_children,
};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// Behaviour switches taken from the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaintainerOptions {
    pub scope_mode: ScopeMode,
    pub normal_windows_only: bool,
    pub purge_closed_windows_on_startup: bool,
}

impl Default for MaintainerOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for MaintainerOptions {
    fn from(config: &Config) -> Self {
        Self {
            scope_mode: config.scope_mode,
            normal_windows_only: config.normal_windows_only,
            purge_closed_windows_on_startup: config.purge_closed_windows_on_startup,
        }
    }
}

/// Why an event was dropped without persisting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The live-tab query failed
    HostQuery,
    /// The window is gone (teardown race)
    ScopeGone,
    /// The scope was destroyed while the event was in flight
    ScopeDestroyed,
    /// The store rejected the write; memory keeps the change
    StoreWrite,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::HostQuery => "host query failed",
            DropReason::ScopeGone => "window no longer exists",
            DropReason::ScopeDestroyed => "scope destroyed",
            DropReason::StoreWrite => "store write failed",
        };
        f.write_str(text)
    }
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// The scope's record was rebuilt and written
    Persisted,
    /// The scope and its stored record were removed
    Destroyed,
    /// Nothing to do for this event
    Ignored,
    /// The event was abandoned; the stored record is unchanged
    Dropped(DropReason),
}

/// How far one pass goes after the live-tab query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipeline {
    /// Reconcile and rebuild the forest
    Rebuild,
    /// Reconcile only and store an empty forest; used once, when a
    /// non-normal window opens
    Register,
}

/// Summary of [`TreeMaintainer::initialize`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupReport {
    /// Scopes that were populated and written
    pub populated: Vec<ScopeId>,
    /// Scopes whose population was dropped
    pub dropped: Vec<(ScopeId, DropReason)>,
    /// Stored scopes removed because their window is closed
    pub purged: Vec<ScopeId>,
}

/// Keeps one tab forest per scope in step with host events.
pub struct TreeMaintainer<H, S> {
    host: H,
    store: S,
    options: MaintainerOptions,
    scopes: RwLock<HashMap<ScopeId, Arc<Mutex<ScopeSlot>>>>,
    notifier: ChangeNotifier,
}

impl<H: TabHost, S: SnapshotStore> TreeMaintainer<H, S> {
    pub fn new(host: H, store: S, options: MaintainerOptions) -> Self {
        log::info!(
            "Tree maintainer created (scope_mode={}, normal_windows_only={})",
            options.scope_mode,
            options.normal_windows_only
        );
        Self {
            host,
            store,
            options,
            scopes: RwLock::new(HashMap::new()),
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> MaintainerOptions {
        self.options
    }

    /// Scope a window's events belong to
    pub fn scope_for_window(&self, window_id: WindowId) -> ScopeId {
        match self.options.scope_mode {
            ScopeMode::Window => ScopeId::Window(window_id),
            ScopeMode::Global => ScopeId::Global,
        }
    }

    /// Scopes currently held in memory, sorted
    pub fn tracked_scopes(&self) -> Vec<ScopeId> {
        let mut scopes: Vec<ScopeId> = self.scopes.read().keys().copied().collect();
        scopes.sort();
        scopes
    }

    /// Receive a [`SnapshotChanged`] after every write or scope removal
    pub fn subscribe(&self) -> Receiver<SnapshotChanged> {
        self.notifier.subscribe()
    }

    /// Populate every open window's scope and drop stored scopes of closed
    /// windows.
    pub fn initialize(&self) -> Result<StartupReport, HostError> {
        let windows = self.host.windows()?;
        log::info!("Initializing from {} open windows", windows.len());

        let mut report = StartupReport::default();
        let mut note = |scope: ScopeId, outcome: EventOutcome| match outcome {
            EventOutcome::Dropped(reason) => report.dropped.push((scope, reason)),
            EventOutcome::Persisted => report.populated.push(scope),
            EventOutcome::Destroyed | EventOutcome::Ignored => {}
        };

        match self.options.scope_mode {
            ScopeMode::Window => {
                for info in &windows {
                    let scope = ScopeId::Window(info.id);
                    note(scope, self.apply(scope, |_| {}));
                }
            }
            ScopeMode::Global => note(ScopeId::Global, self.apply(ScopeId::Global, |_| {})),
        }

        if self.options.purge_closed_windows_on_startup {
            let open: HashSet<WindowId> = windows.iter().map(|w| w.id).collect();
            match self.store.scopes() {
                Ok(stored) => {
                    for scope in stored {
                        let Some(window_id) = scope.window_id() else {
                            continue;
                        };
                        if !open.contains(&window_id) {
                            self.destroy_scope(scope);
                            report.purged.push(scope);
                        }
                    }
                }
                Err(e) => log::warn!("Could not list stored scopes for purge: {}", e),
            }
        }

        log::info!(
            "Initialization complete: {} populated, {} dropped, {} purged",
            report.populated.len(),
            report.dropped.len(),
            report.purged.len()
        );
        Ok(report)
    }

    /// Process one host event.
    pub fn handle_event(&self, event: HostEvent) -> EventOutcome {
        let name = event.name();
        let outcome = self.dispatch(event);
        log::debug!("{} -> {:?}", name, outcome);
        outcome
    }

    fn dispatch(&self, event: HostEvent) -> EventOutcome {
        match event {
            HostEvent::TabCreated(tab) => {
                let scope = self.scope_for_window(tab.window_id);
                self.apply(scope, |record| match tab.opener_tab_id {
                    Some(opener) if opener != tab.id => {
                        record.parent_relation.insert(tab.id, opener);
                    }
                    Some(_) => log::debug!("Ignoring self-opener on tab {}", tab.id),
                    None => {}
                })
            }
            HostEvent::TabRemoved {
                tab_id,
                window_id,
                window_closing,
            } => {
                let Some(window_id) = window_id else {
                    log::debug!("Ignoring removal of tab {} with unknown window", tab_id);
                    return EventOutcome::Ignored;
                };
                let scope = self.scope_for_window(window_id);
                if window_closing && self.options.scope_mode == ScopeMode::Window {
                    // The window's own removal destroys the scope next
                    if let Some(slot) = self.existing_slot(scope) {
                        let mut guard = slot.lock();
                        if guard.is_ready() {
                            let record = &mut guard.record;
                            reparent_children(
                                &mut record.parent_relation,
                                &mut record.expansion_states,
                                tab_id,
                            );
                        }
                    }
                    return EventOutcome::Ignored;
                }
                self.apply(scope, |record| {
                    let moved = reparent_children(
                        &mut record.parent_relation,
                        &mut record.expansion_states,
                        tab_id,
                    );
                    if !moved.is_empty() {
                        log::debug!("Re-parented children of tab {}: {:?}", tab_id, moved);
                    }
                })
            }
            HostEvent::TabUpdated { tab, change } => {
                if !change.affects_display() {
                    return EventOutcome::Ignored;
                }
                self.apply(self.scope_for_window(tab.window_id), |_| {})
            }
            HostEvent::ScopeCreated(info) => {
                let scope = self.scope_for_window(info.id);
                let pipeline = if scope.window_id().is_some()
                    && self.options.normal_windows_only
                    && !info.is_normal()
                {
                    log::debug!("Window {} is {:?}, skipping its first build", info.id, info.kind);
                    Pipeline::Register
                } else {
                    Pipeline::Rebuild
                };
                self.run(scope, pipeline, |_| {})
            }
            HostEvent::ScopeRemoved(window_id) => match self.options.scope_mode {
                ScopeMode::Window => self.destroy_scope(ScopeId::Window(window_id)),
                ScopeMode::Global => self.apply(ScopeId::Global, |_| {}),
            },
        }
    }

    /// Copy of the scope's forest and expansion states.
    ///
    /// Falls back to the stored record for scopes not loaded yet.
    pub fn snapshot(&self, scope: ScopeId) -> Option<ScopeSnapshot> {
        if let Some(slot) = self.existing_slot(scope) {
            let guard = slot.lock();
            if guard.destroyed {
                return None;
            }
            if guard.is_ready() {
                return Some(guard.record.snapshot());
            }
        }
        match self.store.load(scope) {
            Ok(record) => record.map(|r| r.snapshot()),
            Err(e) => {
                log::warn!("Failed to load snapshot for scope {}: {}", scope, e);
                None
            }
        }
    }

    /// Set a tab's expansion flag. Returns the new flag, or `None` if the tab
    /// is not in the scope's forest or the change could not be saved.
    pub fn set_expanded(&self, scope: ScopeId, tab: TabId, expanded: bool) -> Option<bool> {
        self.update_expansion(scope, tab, |_| expanded)
    }

    /// Flip a tab's expansion flag. Returns the new flag, or `None` if the tab
    /// is not in the scope's forest or the change could not be saved.
    pub fn toggle_expanded(&self, scope: ScopeId, tab: TabId) -> Option<bool> {
        self.update_expansion(scope, tab, |current| !current)
    }

    fn update_expansion(
        &self,
        scope: ScopeId,
        tab: TabId,
        next: impl FnOnce(bool) -> bool,
    ) -> Option<bool> {
        let slot = match self.existing_slot(scope) {
            Some(slot) => slot,
            // Only scopes with a stored record get a slot here
            None => match self.store.load(scope) {
                Ok(Some(_)) => self.slot(scope),
                Ok(None) => return None,
                Err(e) => {
                    log::warn!("Failed to load stored record for scope {}: {}", scope, e);
                    return None;
                }
            },
        };
        let mut guard = slot.lock();
        if guard.destroyed {
            return None;
        }
        self.ensure_loaded(scope, &mut guard);

        let current = find_node(&guard.record.cached_forest, tab)?.expanded;
        let previous = guard.record.expansion_states.get(tab);
        let expanded = next(current);
        guard.record.set_expanded(tab, expanded);
        // No reconcile or rebuild; the structure is unchanged
        if let EventOutcome::Dropped(reason) = self.persist(scope, &guard.record) {
            log::warn!("Expansion change for tab {} in scope {} reverted: {}", tab, scope, reason);
            guard.record.set_expanded(tab, current);
            if previous.is_none() {
                guard.record.expansion_states.remove(tab);
            }
            return None;
        }
        Some(expanded)
    }

    fn existing_slot(&self, scope: ScopeId) -> Option<Arc<Mutex<ScopeSlot>>> {
        self.scopes.read().get(&scope).cloned()
    }

    fn slot(&self, scope: ScopeId) -> Arc<Mutex<ScopeSlot>> {
        if let Some(slot) = self.existing_slot(scope) {
            return slot;
        }
        Arc::clone(self.scopes.write().entry(scope).or_default())
    }

    fn ensure_loaded(&self, scope: ScopeId, slot: &mut ScopeSlot) {
        if slot.state != ScopeState::Uninitialized {
            return;
        }
        let record = match self.store.load(scope) {
            Ok(Some(record)) => record,
            Ok(None) => ScopeRecord::new(),
            Err(e) => {
                log::warn!("Failed to load stored record for scope {}: {}", scope, e);
                ScopeRecord::new()
            }
        };
        log::debug!(
            "Loaded scope {} ({} relations, {} expansion flags)",
            scope,
            record.parent_relation.len(),
            record.expansion_states.len()
        );
        slot.load(record);
    }

    /// Run the full pipeline for `scope` with `mutate` as the relation change.
    fn apply(&self, scope: ScopeId, mutate: impl FnOnce(&mut ScopeRecord)) -> EventOutcome {
        self.run(scope, Pipeline::Rebuild, mutate)
    }

    /// Load, mutate, query and reconcile, then rebuild or register and persist.
    fn run(
        &self,
        scope: ScopeId,
        pipeline: Pipeline,
        mutate: impl FnOnce(&mut ScopeRecord),
    ) -> EventOutcome {
        let slot = self.slot(scope);
        let mut guard = slot.lock();
        if guard.destroyed {
            log::debug!("Scope {} destroyed while event was in flight", scope);
            return EventOutcome::Dropped(DropReason::ScopeDestroyed);
        }
        let first_load = guard.state == ScopeState::Uninitialized;
        self.ensure_loaded(scope, &mut guard);

        mutate(&mut guard.record);

        let tabs = match self.live_tabs(scope) {
            Ok(tabs) => tabs,
            Err(HostError::WindowGone(window_id)) => {
                log::debug!("Window {} gone before scope {} could rebuild", window_id, scope);
                if first_load {
                    self.forget_slot(scope, &slot, &mut guard);
                }
                return EventOutcome::Dropped(DropReason::ScopeGone);
            }
            Err(e) => {
                log::warn!("Live tab query for scope {} failed: {}", scope, e);
                return EventOutcome::Dropped(DropReason::HostQuery);
            }
        };

        if tabs.is_empty()
            && let Some(window_id) = scope.window_id()
            && !self.host.window_exists(window_id)
        {
            log::debug!("Empty tab list for closed window {}, keeping stored state", window_id);
            if first_load {
                self.forget_slot(scope, &slot, &mut guard);
            }
            return EventOutcome::Dropped(DropReason::ScopeGone);
        }

        // A scope that already holds a forest keeps it up to date
        let report = match pipeline {
            Pipeline::Register if first_load => guard.record.reconcile_without_forest(&tabs),
            _ => guard.record.rebuild(&tabs),
        };
        if !report.is_clean() {
            log::debug!(
                "Scope {}: purged {} stale relations, {} stale expansion flags",
                scope,
                report.stale_relations,
                report.stale_expansions
            );
        }
        self.persist(scope, &guard.record)
    }

    fn live_tabs(&self, scope: ScopeId) -> Result<Vec<Tab>, HostError> {
        match scope {
            ScopeId::Window(window_id) => self.host.query_tabs(TabQuery::Window(window_id)),
            ScopeId::Global => {
                let tabs = self.host.query_tabs(TabQuery::All)?;
                if !self.options.normal_windows_only {
                    return Ok(tabs);
                }
                let normal: HashSet<WindowId> = self
                    .host
                    .windows()?
                    .into_iter()
                    .filter(|w| w.is_normal())
                    .map(|w| w.id)
                    .collect();
                Ok(tabs
                    .into_iter()
                    .filter(|t| normal.contains(&t.window_id))
                    .collect())
            }
        }
    }

    fn persist(&self, scope: ScopeId, record: &ScopeRecord) -> EventOutcome {
        match self.store.save(scope, record) {
            Ok(()) => {
                self.notifier.notify(SnapshotChanged {
                    scope,
                    kind: ChangeKind::Written,
                });
                EventOutcome::Persisted
            }
            Err(e) => {
                log::error!("Failed to persist scope {}: {}", scope, e);
                EventOutcome::Dropped(DropReason::StoreWrite)
            }
        }
    }

    /// Drop a slot that was created for a window which turned out to be gone.
    /// Caller holds the slot lock; the registry lock is taken after it.
    fn forget_slot(&self, scope: ScopeId, slot: &Arc<Mutex<ScopeSlot>>, guard: &mut ScopeSlot) {
        guard.destroyed = true;
        let mut scopes = self.scopes.write();
        if scopes.get(&scope).is_some_and(|s| Arc::ptr_eq(s, slot)) {
            scopes.remove(&scope);
        }
    }

    /// Remove a scope from memory and from the store.
    fn destroy_scope(&self, scope: ScopeId) -> EventOutcome {
        let slot = self.scopes.write().remove(&scope);
        let mut guard = slot.as_ref().map(|s| s.lock());
        if let Some(guard) = guard.as_mut() {
            guard.destroyed = true;
        }

        match self.store.remove(scope) {
            Ok(existed) => log::info!("Destroyed scope {} (stored record: {})", scope, existed),
            Err(e) => log::error!("Failed to remove stored record for scope {}: {}", scope, e),
        }
        self.notifier.notify(SnapshotChanged {
            scope,
            kind: ChangeKind::Removed,
        });
        EventOutcome::Destroyed
    }
}
