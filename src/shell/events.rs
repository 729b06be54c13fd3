//! Shell event types.
//!
//! This module defines the notifications that flow into the shell from engine
//! sessions, the answers the shell gives back, and the structural events the
//! [`TabManager`](crate::shell::TabManager) publishes to asynchronous listeners.
//!
//! # Main Types
//!
//! - [`SessionEvent`]: one engine notification, tagged with the session that emitted it.
//! - [`SessionEventKind`]: the payload of a session event.
//! - [`RouteOutcome`]: what the router decided for an event (load decisions, new sessions).
//! - [`TabEvent`]: tab added / removed / selected / updated.

use crate::shell::session::SessionId;
use crate::shell::tab::TabId;
use std::fmt::Display;

/// A permission the engine reports alongside a location change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPermission {
    /// Origin the permission applies to
    pub uri: String,
    /// Permission name (geolocation, notifications, ...)
    pub name: String,
    /// Has the user granted it?
    pub granted: bool,
}

/// Which kind of frame a load request is for
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadTarget {
    TopLevel,
    SubFrame,
}

/// A navigation the engine asks permission for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub target: LoadTarget,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadDecision {
    Allow,
    Deny,
}

impl Display for LoadDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadDecision::Allow => write!(f, "Allow"),
            LoadDecision::Deny => write!(f, "Deny"),
        }
    }
}

/// Notification emitted by one engine session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    /// Session that emitted the event
    pub session: SessionId,
    pub kind: SessionEventKind,
}

impl SessionEvent {
    pub fn new(session: SessionId, kind: SessionEventKind) -> Self {
        Self { session, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEventKind {
    // ****************************************
    // ** Navigation
    /// The committed location of the session has changed
    LocationChanged {
        url: Option<String>,
        permissions: Vec<ContentPermission>,
    },
    /// Back navigation became (un)available
    CanGoBackChanged(bool),
    /// Forward navigation became (un)available
    CanGoForwardChanged(bool),
    /// The engine asks whether a load may proceed
    LoadRequest(LoadRequest),
    /// Content asked for a new browsing context (target="_blank", window.open)
    NewSessionRequested { uri: String },

    // ****************************************
    // ** Progress
    /// Loading of a page started
    PageStart { url: String },
    /// Loading of a page stopped, successfully or not
    PageStop { success: bool },
    /// Loading progress in percent (0-100)
    ProgressChanged { percent: u8 },

    // ****************************************
    // ** Content
    /// Document title changed
    TitleChanged { title: String },
    /// Content entered or left full-screen
    FullScreenChanged { full_screen: bool },
    /// Content process crashed
    Crashed,
    /// Content process was killed by the system
    Killed,
    /// Script asked to close the window
    CloseRequested,
    /// Content asked for focus
    FocusRequested,
    /// First contentful paint happened
    FirstContentfulPaint,
}

impl SessionEventKind {
    /// Short name of the event, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SessionEventKind::LocationChanged { .. } => "LocationChanged",
            SessionEventKind::CanGoBackChanged(_) => "CanGoBackChanged",
            SessionEventKind::CanGoForwardChanged(_) => "CanGoForwardChanged",
            SessionEventKind::LoadRequest(_) => "LoadRequest",
            SessionEventKind::NewSessionRequested { .. } => "NewSessionRequested",
            SessionEventKind::PageStart { .. } => "PageStart",
            SessionEventKind::PageStop { .. } => "PageStop",
            SessionEventKind::ProgressChanged { .. } => "ProgressChanged",
            SessionEventKind::TitleChanged { .. } => "TitleChanged",
            SessionEventKind::FullScreenChanged { .. } => "FullScreenChanged",
            SessionEventKind::Crashed => "Crashed",
            SessionEventKind::Killed => "Killed",
            SessionEventKind::CloseRequested => "CloseRequested",
            SessionEventKind::FocusRequested => "FocusRequested",
            SessionEventKind::FirstContentfulPaint => "FirstContentfulPaint",
        }
    }
}

/// Result of routing one [`SessionEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// No tab owns the session, nothing was touched
    Ignored,
    /// The event was applied
    Handled,
    /// Answer to a [`SessionEventKind::LoadRequest`]
    Load(LoadDecision),
    /// Answer to a [`SessionEventKind::NewSessionRequested`]: the session that should
    /// receive the new content
    NewSession(Option<SessionId>),
}

/// Structural and metadata changes of the tab collection, published on the
/// [`TabManager`](crate::shell::TabManager) broadcast bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TabEvent {
    /// Tab has been created and appended
    Added { tab_id: TabId },
    /// Tab has been closed and removed
    Removed { tab_id: TabId },
    /// Tab has been (re)selected
    Selected { tab_id: TabId },
    /// Something about the tabs changed, re-read the current state
    Updated,
}
