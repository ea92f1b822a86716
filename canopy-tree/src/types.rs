//! Core types for the tab tree
//!
//! These types mirror what the browser host reports about its tabs and
//! windows. The maintainer only observes them; it never creates or destroys
//! tabs itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Browser tab ID (unique within a scope)
pub type TabId = u64;

/// Browser window ID
pub type WindowId = u64;

/// A live tab as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    /// Tab ID
    pub id: TabId,
    /// Window that owns the tab
    pub window_id: WindowId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Current URL
    #[serde(default)]
    pub url: String,
    /// Favicon URL, if the page has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Tab that was active when this one was spawned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener_tab_id: Option<TabId>,
}

impl Tab {
    /// Create a tab with no icon and no opener
    pub fn new(
        id: TabId,
        window_id: WindowId,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            window_id,
            title: title.into(),
            url: url.into(),
            fav_icon_url: None,
            opener_tab_id: None,
        }
    }

    /// Builder-style setter for the opener
    pub fn with_opener(mut self, opener: TabId) -> Self {
        self.opener_tab_id = Some(opener);
        self
    }

    /// Builder-style setter for the favicon
    pub fn with_icon(mut self, fav_icon_url: impl Into<String>) -> Self {
        self.fav_icon_url = Some(fav_icon_url.into());
        self
    }
}

/// Kind of browser window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Regular browsing window
    #[default]
    Normal,
    /// Popup window (no tab strip)
    Popup,
    /// Installed web app window
    App,
    /// Developer tools window
    Devtools,
}

/// A live window as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Window ID
    pub id: WindowId,
    /// Window kind
    #[serde(default)]
    pub kind: WindowKind,
}

impl WindowInfo {
    /// A normal browsing window
    pub fn normal(id: WindowId) -> Self {
        Self {
            id,
            kind: WindowKind::Normal,
        }
    }

    /// Whether this window shows a tab strip (and therefore a tab tree)
    pub fn is_normal(&self) -> bool {
        self.kind == WindowKind::Normal
    }
}

/// Isolation unit owning one parent relation, expansion map and forest.
///
/// Serialized as `"global"` or the decimal window ID so it can be used as a
/// JSON object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ScopeId {
    /// The single implicit scope covering every window
    Global,
    /// One scope per browser window
    Window(WindowId),
}

impl ScopeId {
    /// Window ID for per-window scopes
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            ScopeId::Global => None,
            ScopeId::Window(id) => Some(*id),
        }
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Global => f.write_str("global"),
            ScopeId::Window(id) => write!(f, "{id}"),
        }
    }
}

/// Error returned when a scope key is neither `global` nor a window ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseScopeIdError(pub String);

impl fmt::Display for ParseScopeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid scope id '{}'", self.0)
    }
}

impl std::error::Error for ParseScopeIdError {}

impl FromStr for ScopeId {
    type Err = ParseScopeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("global") {
            return Ok(ScopeId::Global);
        }
        trimmed
            .parse::<WindowId>()
            .map(ScopeId::Window)
            .map_err(|_| ParseScopeIdError(s.to_string()))
    }
}

impl From<ScopeId> for String {
    fn from(scope: ScopeId) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for ScopeId {
    type Error = ParseScopeIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
