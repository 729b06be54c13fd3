use crate::shell::session::{EngineSession, SessionId};
use crate::shell::tab::Thumbnail;
use std::fmt::Display;
use url::Url;
use uuid::Uuid;

/// Title every tab starts with, and the fallback for [`Tab::display_title`].
pub const DEFAULT_TAB_TITLE: &str = "New Tab";

/// A unique identifier for a browser tab within a [`TabManager`](crate::shell::TabManager).
///
/// Internally, a `TabId` is a wrapper around a [`Uuid`], ensuring process-wide
/// uniqueness for each tab. `TabId` implements common traits such as `Copy`, `Clone`,
/// `Eq`, `Hash`, and ordering traits, so it can be freely duplicated, compared, sorted,
/// or used as a key in hash maps.
///
/// **Note:** The use of [`Uuid`] is an implementation detail. Always treat `TabId` as an
/// opaque handle.
///
/// # Purpose
///
/// Tabs are stored exactly once, inside the manager's collection. Everything else
/// (the selection, the switcher, deferred actions) refers to a tab by its `TabId`, so
/// "same tab" is always an id comparison and a stale id simply stops resolving once
/// the tab is closed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(Uuid);

impl TabId {
    /// Create a new unique `TabId` using a random UUID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of the engine session owned by a tab, as far as the shell knows.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Session has not been opened yet, or has been closed
    #[default]
    Closed,
    /// Session is open and usable
    Open,
    /// The engine reported a crash or kill. Waits for a recovery decision.
    Crashed,
}

/// A single browser tab: one engine session plus the metadata the shell shows for it.
///
/// A tab owns its session exclusively. The session is created together with the tab
/// and never replaced; after a crash the same session is reopened and `generation` moves on.
pub struct Tab {
    /// ID of the tab
    id: TabId,
    /// Engine session driven by this tab
    session: Box<dyn EngineSession>,
    session_state: SessionState,
    /// Bumped each time the session is reopened after a crash
    generation: u64,

    /// Title reported by the engine
    pub(crate) title: String,
    /// Last requested or committed URL
    pub(crate) url: Option<String>,
    /// Snapshot shown in the tab switcher
    pub(crate) thumbnail: Option<Thumbnail>,
    pub(crate) can_go_back: bool,
    pub(crate) can_go_forward: bool,
    /// Is a page load in progress?
    pub(crate) is_loading: bool,
}

impl Tab {
    /// Creates a new tab around a session. Does NOT open the session.
    pub fn new(session: Box<dyn EngineSession>) -> Self {
        Self {
            id: TabId::new(),
            session,
            session_state: SessionState::Closed,
            generation: 0,
            title: DEFAULT_TAB_TITLE.to_string(),
            url: None,
            thumbnail: None,
            can_go_back: false,
            can_go_forward: false,
            is_loading: false,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn session_id(&self) -> SessionId {
        self.session.id()
    }

    pub fn session_state(&self) -> SessionState {
        self.session_state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_ref()
    }

    pub fn can_go_back(&self) -> bool {
        self.can_go_back
    }

    pub fn can_go_forward(&self) -> bool {
        self.can_go_forward
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Title to show for this tab: the engine title when it is meaningful, otherwise the
    /// host of the current URL, otherwise [`DEFAULT_TAB_TITLE`].
    pub fn display_title(&self) -> String {
        if !self.title.is_empty() && self.title != DEFAULT_TAB_TITLE {
            return self.title.clone();
        }

        self.url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| DEFAULT_TAB_TITLE.to_string())
    }

    /// Open the underlying session.
    pub fn open(&mut self) {
        self.session.open();
        self.session_state = SessionState::Open;
    }

    /// Close the underlying session. The tab must not be navigated afterwards.
    pub fn close(&mut self) {
        self.session.close();
        self.session_state = SessionState::Closed;
    }

    /// Reopen the session after a crash. Returns the new generation.
    pub(crate) fn reopen(&mut self) -> u64 {
        self.session.open();
        self.session_state = SessionState::Open;
        self.generation += 1;
        self.generation
    }

    pub(crate) fn mark_crashed(&mut self) {
        self.session_state = SessionState::Crashed;
        self.is_loading = false;
    }

    /// Load a URL. The stored URL is updated right away so the UI reflects what the
    /// user asked for before the navigation commits.
    pub fn load(&mut self, url: &str) {
        log::debug!("Tab {}: loading '{}'", self.id, url);
        self.url = Some(url.to_string());
        self.session.load(url);
    }

    pub fn reload(&mut self) {
        self.session.reload();
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn go_back(&mut self) {
        self.session.go_back();
    }

    pub fn go_forward(&mut self) {
        self.session.go_forward();
    }
}

impl PartialEq for Tab {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tab {}

impl std::fmt::Debug for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.id)
            .field("session", &self.session.id())
            .field("session_state", &self.session_state)
            .field("title", &self.title)
            .field("url", &self.url)
            .finish()
    }
}
