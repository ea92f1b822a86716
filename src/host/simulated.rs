//! In-process simulated browser
//!
//! Holds windows and tabs in memory and turns scripted [`BrowserAction`]s into
//! the [`HostEvent`]s a real browser would fire, in the same order (closing a
//! window reports each of its tabs as removed with `window_closing` set before
//! the window itself). The handle is cheap to clone; clones share state.

use super::{HostError, TabHost, TabQuery};
use canopy_tree::{HostEvent, Tab, TabChange, TabId, WindowId, WindowInfo, WindowKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One scripted browser operation (one JSON object per script line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BrowserAction {
    /// Open a window (ID assigned when omitted)
    OpenWindow {
        #[serde(default)]
        window: Option<WindowId>,
        #[serde(default)]
        kind: WindowKind,
    },
    /// Close a window and every tab in it
    CloseWindow { window: WindowId },
    /// Open a tab, optionally spawned from `opener`
    OpenTab {
        window: WindowId,
        #[serde(default)]
        tab: Option<TabId>,
        #[serde(default)]
        title: String,
        #[serde(default)]
        url: String,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        opener: Option<TabId>,
    },
    /// Close one tab
    CloseTab { tab: TabId },
    /// Change a tab's attributes
    UpdateTab {
        tab: TabId,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
    /// Flip a tab's expansion flag from the panel (not a browser event)
    ToggleExpanded {
        #[serde(default)]
        window: Option<WindowId>,
        tab: TabId,
    },
}

#[derive(Debug)]
struct BrowserState {
    windows: BTreeMap<WindowId, WindowInfo>,
    tabs: Vec<Tab>,
    next_window_id: WindowId,
    next_tab_id: TabId,
    fail_queries: bool,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            windows: BTreeMap::new(),
            tabs: Vec::new(),
            next_window_id: 1,
            next_tab_id: 1,
            fail_queries: false,
        }
    }
}

/// Shared handle to a simulated browser
#[derive(Debug, Clone, Default)]
pub struct SimulatedBrowser {
    state: Arc<RwLock<BrowserState>>,
}

impl SimulatedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one scripted action and return the events it fires.
    ///
    /// `ToggleExpanded` fires nothing; it is handled by whoever drives the
    /// panel.
    pub fn apply(&self, action: &BrowserAction) -> Result<Vec<HostEvent>, HostError> {
        match action {
            BrowserAction::OpenWindow { window, kind } => {
                let (_, event) = self.open_window_with(*window, *kind)?;
                Ok(vec![event])
            }
            BrowserAction::CloseWindow { window } => self.close_window(*window),
            BrowserAction::OpenTab {
                window,
                tab,
                title,
                url,
                icon,
                opener,
            } => {
                let mut new_tab = Tab::new(tab.unwrap_or(0), *window, title.clone(), url.clone());
                new_tab.fav_icon_url = icon.clone();
                new_tab.opener_tab_id = *opener;
                let (_, event) = self.insert_tab(new_tab, tab.is_some())?;
                Ok(vec![event])
            }
            BrowserAction::CloseTab { tab } => Ok(vec![self.close_tab(*tab)?]),
            BrowserAction::UpdateTab {
                tab,
                title,
                url,
                icon,
                status,
            } => {
                let change = TabChange {
                    title: title.clone(),
                    url: url.clone(),
                    fav_icon_url: icon.clone(),
                    status: status.clone(),
                };
                Ok(vec![self.update_tab(*tab, change)?])
            }
            BrowserAction::ToggleExpanded { .. } => Ok(Vec::new()),
        }
    }

    /// Open a window with the next free ID
    pub fn open_window(&self, kind: WindowKind) -> (WindowId, HostEvent) {
        let mut state = self.state.write();
        let id = state.next_window_id;
        state.next_window_id += 1;
        let info = WindowInfo { id, kind };
        state.windows.insert(id, info);
        (id, HostEvent::ScopeCreated(info))
    }

    fn open_window_with(
        &self,
        id: Option<WindowId>,
        kind: WindowKind,
    ) -> Result<(WindowId, HostEvent), HostError> {
        let Some(id) = id else {
            return Ok(self.open_window(kind));
        };
        let mut state = self.state.write();
        if state.windows.contains_key(&id) {
            return Err(HostError::DuplicateId { kind: "window", id });
        }
        state.next_window_id = state.next_window_id.max(id + 1);
        let info = WindowInfo { id, kind };
        state.windows.insert(id, info);
        Ok((id, HostEvent::ScopeCreated(info)))
    }

    /// Open a tab in `window` with the next free ID
    pub fn open_tab(
        &self,
        window: WindowId,
        title: &str,
        url: &str,
        opener: Option<TabId>,
    ) -> Result<(TabId, HostEvent), HostError> {
        let mut tab = Tab::new(0, window, title, url);
        tab.opener_tab_id = opener;
        self.insert_tab(tab, false)
    }

    fn insert_tab(&self, mut tab: Tab, explicit_id: bool) -> Result<(TabId, HostEvent), HostError> {
        let mut state = self.state.write();
        if !state.windows.contains_key(&tab.window_id) {
            return Err(HostError::WindowGone(tab.window_id));
        }
        if explicit_id {
            if state.tabs.iter().any(|t| t.id == tab.id) {
                return Err(HostError::DuplicateId {
                    kind: "tab",
                    id: tab.id,
                });
            }
            state.next_tab_id = state.next_tab_id.max(tab.id + 1);
        } else {
            tab.id = state.next_tab_id;
            state.next_tab_id += 1;
        }
        let id = tab.id;
        state.tabs.push(tab.clone());
        Ok((id, HostEvent::TabCreated(tab)))
    }

    /// Close one tab
    pub fn close_tab(&self, tab_id: TabId) -> Result<HostEvent, HostError> {
        let mut state = self.state.write();
        let index = state
            .tabs
            .iter()
            .position(|t| t.id == tab_id)
            .ok_or(HostError::TabGone(tab_id))?;
        let tab = state.tabs.remove(index);
        Ok(HostEvent::TabRemoved {
            tab_id,
            window_id: Some(tab.window_id),
            window_closing: false,
        })
    }

    /// Change a tab's attributes
    pub fn update_tab(&self, tab_id: TabId, change: TabChange) -> Result<HostEvent, HostError> {
        let mut state = self.state.write();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.id == tab_id)
            .ok_or(HostError::TabGone(tab_id))?;
        if let Some(title) = &change.title {
            tab.title = title.clone();
        }
        if let Some(url) = &change.url {
            tab.url = url.clone();
        }
        if let Some(icon) = &change.fav_icon_url {
            tab.fav_icon_url = Some(icon.clone());
        }
        Ok(HostEvent::TabUpdated {
            tab: tab.clone(),
            change,
        })
    }

    /// Close a window: one `TabRemoved` per tab, then `ScopeRemoved`
    pub fn close_window(&self, window_id: WindowId) -> Result<Vec<HostEvent>, HostError> {
        let mut state = self.state.write();
        if state.windows.remove(&window_id).is_none() {
            return Err(HostError::WindowGone(window_id));
        }
        let mut events = Vec::new();
        state.tabs.retain(|tab| {
            if tab.window_id != window_id {
                return true;
            }
            events.push(HostEvent::TabRemoved {
                tab_id: tab.id,
                window_id: Some(window_id),
                window_closing: true,
            });
            false
        });
        events.push(HostEvent::ScopeRemoved(window_id));
        Ok(events)
    }

    /// Make every live query fail until reset
    pub fn set_query_failure(&self, fail: bool) {
        self.state.write().fail_queries = fail;
    }

    /// Current state of one tab
    pub fn tab(&self, tab_id: TabId) -> Option<Tab> {
        self.state.read().tabs.iter().find(|t| t.id == tab_id).cloned()
    }

    /// Number of open tabs across all windows
    pub fn tab_count(&self) -> usize {
        self.state.read().tabs.len()
    }
}

impl TabHost for SimulatedBrowser {
    fn query_tabs(&self, query: TabQuery) -> Result<Vec<Tab>, HostError> {
        let state = self.state.read();
        if state.fail_queries {
            return Err(HostError::Query("simulated query failure".to_string()));
        }
        match query {
            TabQuery::All => Ok(state.tabs.clone()),
            TabQuery::Window(window_id) => {
                if !state.windows.contains_key(&window_id) {
                    return Err(HostError::WindowGone(window_id));
                }
                Ok(state
                    .tabs
                    .iter()
                    .filter(|t| t.window_id == window_id)
                    .cloned()
                    .collect())
            }
        }
    }

    fn windows(&self) -> Result<Vec<WindowInfo>, HostError> {
        let state = self.state.read();
        if state.fail_queries {
            return Err(HostError::Query("simulated query failure".to_string()));
        }
        Ok(state.windows.values().copied().collect())
    }

    fn window_exists(&self, window_id: WindowId) -> bool {
        self.state.read().windows.contains_key(&window_id)
    }
}
