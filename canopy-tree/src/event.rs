//! Host lifecycle events.
//!
//! Every browser callback the maintainer cares about is funnelled into one
//! [`HostEvent`] value so that ordering is decided in a single dispatch
//! function rather than in scattered listeners.

use crate::types::{Tab, TabId, WindowId, WindowInfo};

/// Fields that changed on a tab update.
///
/// Only title, URL and favicon changes affect the tree; other changes (such
/// as loading status) are reported but ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabChange {
    pub title: Option<String>,
    pub url: Option<String>,
    pub fav_icon_url: Option<String>,
    pub status: Option<String>,
}

impl TabChange {
    /// Whether the change alters anything a tree node displays
    pub fn affects_display(&self) -> bool {
        self.title.is_some() || self.url.is_some() || self.fav_icon_url.is_some()
    }
}

/// A lifecycle notification from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A tab was opened (with its opener, if any)
    TabCreated(Tab),
    /// A tab was closed
    TabRemoved {
        tab_id: TabId,
        /// Owning window, when the host knows it
        window_id: Option<WindowId>,
        /// Whether the tab closed because its window is closing
        window_closing: bool,
    },
    /// A tab's attributes changed
    TabUpdated { tab: Tab, change: TabChange },
    /// A window was opened
    ScopeCreated(WindowInfo),
    /// A window was closed
    ScopeRemoved(WindowId),
}

impl HostEvent {
    /// Window the event refers to, if known
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            HostEvent::TabCreated(tab) => Some(tab.window_id),
            HostEvent::TabRemoved { window_id, .. } => *window_id,
            HostEvent::TabUpdated { tab, .. } => Some(tab.window_id),
            HostEvent::ScopeCreated(info) => Some(info.id),
            HostEvent::ScopeRemoved(id) => Some(*id),
        }
    }

    /// Short name for log lines
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::TabCreated(_) => "tab-created",
            HostEvent::TabRemoved { .. } => "tab-removed",
            HostEvent::TabUpdated { .. } => "tab-updated",
            HostEvent::ScopeCreated(_) => "scope-created",
            HostEvent::ScopeRemoved(_) => "scope-removed",
        }
    }
}
