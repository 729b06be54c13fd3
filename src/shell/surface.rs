//! The single visible rendering surface and the on-screen controls around it.
//!
//! There is exactly one [`SessionView`]. At the end of every rebinding step it is attached
//! to the session of the selected tab and to nothing else. [`ShellSurface`] owns the view
//! together with the [`ChromeState`] and keeps both in line with the selection by
//! observing the [`TabManager`].

use crate::shell::manager::{TabManager, TabObserver};
use crate::shell::session::null::CallLog;
use crate::shell::session::SessionId;
use crate::shell::tab::{Tab, Thumbnail};
use anyhow::anyhow;
use parking_lot::Mutex;

/// The on-screen view that shows one engine session at a time.
pub trait SessionView: Send {
    /// Show the given session. Callers detach first; a view never shows two sessions.
    fn attach(&mut self, session: SessionId);
    /// Stop showing whatever session is attached.
    fn detach(&mut self);
    /// Session currently shown, if any
    fn attached(&self) -> Option<SessionId>;
    /// Capture the visible content, scaled so its largest edge is at most `max_dim`.
    fn snapshot(&mut self, max_dim: u32) -> anyhow::Result<Thumbnail>;
}

/// Model of the visible browser controls: URL bar, back/forward buttons, loading
/// indicator, progress bar, full-screen chrome hiding and the tab-count badge.
///
/// Every setter that actually changes a value bumps `revision`, so a caller can tell
/// whether anything on screen changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromeState {
    url: Option<String>,
    can_go_back: bool,
    can_go_forward: bool,
    is_loading: bool,
    /// Progress in 0.0..=1.0, `None` when the progress bar is hidden
    progress: Option<f32>,
    /// Toolbars hidden for full-screen content
    chrome_hidden: bool,
    tab_count: usize,
    revision: u64,
}

impl ChromeState {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
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
    pub fn progress(&self) -> Option<f32> {
        self.progress
    }
    pub fn chrome_hidden(&self) -> bool {
        self.chrome_hidden
    }
    pub fn tab_count(&self) -> usize {
        self.tab_count
    }
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch<T: PartialEq>(revision: &mut u64, slot: &mut T, value: T) {
        if *slot != value {
            *slot = value;
            *revision += 1;
        }
    }

    pub(crate) fn set_url(&mut self, url: Option<&str>) {
        Self::touch(&mut self.revision, &mut self.url, url.map(str::to_string));
    }

    pub(crate) fn set_can_go_back(&mut self, on: bool) {
        Self::touch(&mut self.revision, &mut self.can_go_back, on);
    }

    pub(crate) fn set_can_go_forward(&mut self, on: bool) {
        Self::touch(&mut self.revision, &mut self.can_go_forward, on);
    }

    /// Starting a load shows an empty progress bar, stopping hides it.
    pub(crate) fn set_loading(&mut self, loading: bool) {
        Self::touch(&mut self.revision, &mut self.is_loading, loading);
        let progress = if loading { Some(0.0) } else { None };
        Self::touch(&mut self.revision, &mut self.progress, progress);
    }

    pub(crate) fn set_progress(&mut self, percent: u8) {
        let fraction = f32::from(percent.min(100)) / 100.0;
        Self::touch(&mut self.revision, &mut self.progress, Some(fraction));
    }

    pub(crate) fn set_chrome_hidden(&mut self, hidden: bool) {
        Self::touch(&mut self.revision, &mut self.chrome_hidden, hidden);
    }

    pub(crate) fn set_tab_count(&mut self, count: usize) {
        Self::touch(&mut self.revision, &mut self.tab_count, count);
    }
}

/// Owns the view and the chrome. Registered as a [`TabObserver`] so that every
/// selection rebinds the view before the selecting call returns.
pub(crate) struct ShellSurface {
    view: Mutex<Box<dyn SessionView>>,
    chrome: Mutex<ChromeState>,
}

impl ShellSurface {
    pub fn new(view: Box<dyn SessionView>) -> Self {
        Self {
            view: Mutex::new(view),
            chrome: Mutex::new(ChromeState::default()),
        }
    }

    pub fn chrome(&self) -> ChromeState {
        self.chrome.lock().clone()
    }

    pub fn with_chrome<R>(&self, f: impl FnOnce(&mut ChromeState) -> R) -> R {
        f(&mut *self.chrome.lock())
    }

    pub fn attached(&self) -> Option<SessionId> {
        self.view.lock().attached()
    }

    pub fn snapshot(&self, max_dim: u32) -> anyhow::Result<Thumbnail> {
        self.view.lock().snapshot(max_dim)
    }

    /// Rebind the view to `tab`'s session and show the tab's stored state.
    pub fn bind(&self, tab: &Tab) {
        let session = tab.session_id();
        {
            let mut view = self.view.lock();
            if view.attached().is_some() {
                view.detach();
            }
            view.attach(session);
        }
        log::debug!("View bound to session {} of tab {}", session, tab.id());

        let mut chrome = self.chrome.lock();
        chrome.set_url(tab.url());
        chrome.set_can_go_back(tab.can_go_back());
        chrome.set_can_go_forward(tab.can_go_forward());
        chrome.set_loading(tab.is_loading());
        chrome.set_chrome_hidden(false);
    }

    /// Detach the view if it shows `session`.
    pub fn release(&self, session: SessionId) {
        let mut view = self.view.lock();
        if view.attached() == Some(session) {
            view.detach();
            log::debug!("View released session {}", session);
        }
    }
}

impl TabObserver for ShellSurface {
    fn did_add_tab(&self, _manager: &TabManager, tab: &Tab) {
        log::trace!("Tab {} added, session {} not bound", tab.id(), tab.session_id());
    }

    fn did_remove_tab(&self, _manager: &TabManager, tab: &Tab) {
        self.release(tab.session_id());
    }

    fn did_select_tab(&self, manager: &TabManager, tab: &Tab) {
        self.bind(tab);
        self.chrome.lock().set_tab_count(manager.tab_count());
    }

    fn tabs_updated(&self, manager: &TabManager) {
        self.chrome.lock().set_tab_count(manager.tab_count());
    }
}

/// Null view that shows nothing. Records `attach`, `detach` and `snapshot` calls into a
/// [`CallLog`] and produces blank thumbnails.
pub struct NullView {
    attached: Option<SessionId>,
    log: CallLog,
    fail_snapshots: bool,
}

impl NullView {
    pub fn new(log: CallLog) -> Self {
        Self {
            attached: None,
            log,
            fail_snapshots: false,
        }
    }

    /// Make every snapshot fail, as a view would while it is off screen.
    pub fn fail_snapshots(mut self, on: bool) -> Self {
        self.fail_snapshots = on;
        self
    }
}

impl SessionView for NullView {
    fn attach(&mut self, session: SessionId) {
        self.log.lock().push(format!("attach {session}"));
        self.attached = Some(session);
    }

    fn detach(&mut self) {
        if let Some(session) = self.attached.take() {
            self.log.lock().push(format!("detach {session}"));
        }
    }

    fn attached(&self) -> Option<SessionId> {
        self.attached
    }

    fn snapshot(&mut self, max_dim: u32) -> anyhow::Result<Thumbnail> {
        let session = self.attached.ok_or_else(|| anyhow!("no session attached"))?;
        if self.fail_snapshots {
            return Err(anyhow!("snapshot of session {session} failed"));
        }

        self.log.lock().push(format!("snapshot {session}"));
        let dim = max_dim.min(32);
        Ok(Thumbnail::blank(dim, dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::session::null::call_log;

    #[test]
    fn chrome_revision_moves_only_on_change() {
        let mut c = ChromeState::default();
        c.set_url(Some("https://a.test"));
        assert_eq!(c.revision(), 1);
        c.set_url(Some("https://a.test"));
        assert_eq!(c.revision(), 1);

        c.set_loading(true);
        assert!(c.is_loading());
        assert_eq!(c.progress(), Some(0.0));
        c.set_progress(50);
        assert_eq!(c.progress(), Some(0.5));
        c.set_progress(250);
        assert_eq!(c.progress(), Some(1.0));
        c.set_loading(false);
        assert_eq!(c.progress(), None);
    }

    #[test]
    fn null_view_attach_and_snapshot() {
        let log = call_log();
        let mut view = NullView::new(log.clone());
        assert!(view.snapshot(64).is_err());

        let sid = SessionId::new();
        view.attach(sid);
        assert_eq!(view.attached(), Some(sid));
        let thumb = view.snapshot(64).unwrap();
        assert_eq!(thumb.width, 32);

        view.detach();
        view.detach();
        assert_eq!(view.attached(), None);
        assert_eq!(
            log.lock().clone(),
            vec![format!("attach {sid}"), format!("snapshot {sid}"), format!("detach {sid}")]
        );
    }

    #[test]
    fn failing_view_reports_error() {
        let mut view = NullView::new(call_log()).fail_snapshots(true);
        view.attach(SessionId::new());
        assert!(view.snapshot(64).is_err());
    }

    #[test]
    fn release_only_detaches_matching_session() {
        let surface = ShellSurface::new(Box::new(NullView::new(call_log())));
        let shown = SessionId::new();
        surface.view.lock().attach(shown);

        surface.release(SessionId::new());
        assert_eq!(surface.attached(), Some(shown));
        surface.release(shown);
        assert_eq!(surface.attached(), None);
    }
}
