//! Routing of engine session events.
//!
//! Every event goes through [`BrowserShell::route`]. It resolves the tab owning the
//! emitting session and then makes two separate decisions:
//!
//! 1. The event's data is always stored on the owning tab, foreground or not, so a tab
//!    shows the right state as soon as it is selected.
//! 2. The visible chrome is only touched when the owning tab is the selected tab.

use crate::shell::deferred::DeferredAction;
use crate::shell::events::{LoadDecision, RouteOutcome, SessionEvent, SessionEventKind};
use crate::shell::manager::TabUpdate;
use crate::shell::shell::{BrowserShell, CrashPrompt};
use crate::shell::tab::TabId;
use std::time::Instant;

impl BrowserShell {
    /// Apply one session event. Events from sessions no tab owns are ignored, except load
    /// requests, which are always allowed.
    pub fn route(&mut self, event: SessionEvent) -> RouteOutcome {
        let SessionEvent { session, kind } = event;

        let Some(tab_id) = self.manager.tab_for_session(session).map(|t| t.id()) else {
            if let SessionEventKind::LoadRequest(req) = &kind {
                log::debug!("Allowing load of '{}' for unowned session {}", req.url, session);
                return RouteOutcome::Load(LoadDecision::Allow);
            }
            log::debug!("Dropping {} from unowned session {}", kind.name(), session);
            return RouteOutcome::Ignored;
        };

        let foreground = self.manager.is_selected(tab_id);
        let name = kind.name();
        log::debug!(
            "Routing {} for tab {} ({})",
            name,
            tab_id,
            if foreground { "foreground" } else { "background" }
        );

        match kind {
            SessionEventKind::LocationChanged { url, .. } => {
                if let Some(url) = &url {
                    self.manager.update_tab(tab_id, TabUpdate::url(url.as_str()));
                }
                if foreground {
                    self.surface.with_chrome(|c| c.set_url(url.as_deref()));
                }
            }
            SessionEventKind::CanGoBackChanged(can_go_back) => {
                let can_go_forward = self.manager.tab(tab_id).is_some_and(|t| t.can_go_forward());
                self.manager.update_navigation(tab_id, can_go_back, can_go_forward);
                if foreground {
                    self.surface.with_chrome(|c| c.set_can_go_back(can_go_back));
                }
            }
            SessionEventKind::CanGoForwardChanged(can_go_forward) => {
                let can_go_back = self.manager.tab(tab_id).is_some_and(|t| t.can_go_back());
                self.manager.update_navigation(tab_id, can_go_back, can_go_forward);
                if foreground {
                    self.surface.with_chrome(|c| c.set_can_go_forward(can_go_forward));
                }
            }
            SessionEventKind::LoadRequest(req) => {
                log::trace!("Allowing {:?} load of '{}'", req.target, req.url);
                return RouteOutcome::Load(LoadDecision::Allow);
            }
            SessionEventKind::NewSessionRequested { uri } => {
                // The engine loads `uri` into the returned session itself
                self.capture_thumbnail();
                let new_tab = self.manager.create_tab(None, true);
                self.manager.update_tab(new_tab, TabUpdate::url(uri.as_str()));
                self.surface.with_chrome(|c| c.set_url(Some(uri.as_str())));
                let new_session = self.manager.tab(new_tab).map(|t| t.session_id());
                return RouteOutcome::NewSession(new_session);
            }
            SessionEventKind::PageStart { url } => {
                log::trace!("Tab {} started loading '{}'", tab_id, url);
                self.manager.set_loading(tab_id, true);
                if foreground {
                    self.surface.with_chrome(|c| c.set_loading(true));
                }
            }
            SessionEventKind::PageStop { success } => {
                if !success {
                    log::debug!("Tab {} stopped loading with a failure", tab_id);
                }
                self.manager.set_loading(tab_id, false);
                if foreground {
                    self.surface.with_chrome(|c| c.set_loading(false));
                    self.schedule_capture(tab_id);
                }
            }
            SessionEventKind::ProgressChanged { percent } => {
                if foreground {
                    log::trace!("Progress {}%", percent);
                    self.surface.with_chrome(|c| c.set_progress(percent));
                }
            }
            SessionEventKind::TitleChanged { title } => {
                self.manager.update_tab(tab_id, TabUpdate::title(title));
            }
            SessionEventKind::FullScreenChanged { full_screen } => {
                if foreground {
                    self.surface.with_chrome(|c| c.set_chrome_hidden(full_screen));
                }
            }
            SessionEventKind::Crashed | SessionEventKind::Killed => {
                log::warn!("Session {} of tab {} is gone ({})", session, tab_id, name);
                if let Some(tab) = self.manager.tab_mut(tab_id) {
                    tab.mark_crashed();
                }
                if foreground {
                    self.surface.with_chrome(|c| c.set_loading(false));
                }
                self.queue_crash_prompt(CrashPrompt { tab: tab_id, session });
            }
            SessionEventKind::CloseRequested => {
                self.manager.close_tab(tab_id);
            }
            SessionEventKind::FocusRequested | SessionEventKind::FirstContentfulPaint => {}
        }

        RouteOutcome::Handled
    }

    fn schedule_capture(&mut self, tab_id: TabId) {
        let Some(tab) = self.manager.tab(tab_id) else {
            return;
        };
        let action = DeferredAction::CaptureThumbnail {
            tab_id,
            session: tab.session_id(),
            generation: tab.generation(),
        };
        self.deferred.schedule(Instant::now() + self.config.thumbnail_delay(), action);
    }
}
