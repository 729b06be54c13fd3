use crate::shell::config::ShellConfig;
use crate::shell::deferred::{DeferredAction, DeferredQueue};
use crate::shell::handle::{ShellCommand, ShellHandle};
use crate::shell::input::resolve_input;
use crate::shell::manager::{TabManager, TabUpdate};
use crate::shell::session::{SessionEventReceiver, SessionEventSink, SessionFactory, SessionId, SessionMessage};
use crate::shell::surface::{ChromeState, SessionView, ShellSurface};
use crate::shell::switcher::{SwitcherIntent, TabSwitcherModel};
use crate::shell::tab::{SessionState, TabId};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Something the user did in the browser chrome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    /// Text submitted from the URL bar
    Submit(String),
    Back,
    Forward,
    Reload,
    Stop,
    /// Load the homepage in the selected tab
    Home,
    /// Open a new tab on the homepage and select it
    NewTab,
    /// Capture the selected tab and show the tab switcher
    OpenTabSwitcher,
}

/// A crashed or killed session waiting for the user to pick a recovery.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CrashPrompt {
    /// Tab owning the crashed session. Not necessarily the selected tab.
    pub tab: TabId,
    pub session: SessionId,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CrashRecovery {
    /// Reopen the session and load its last URL (or the homepage)
    Reload,
    /// Close the tab
    Close,
}

/// Point-in-time view of the shell, for hosts and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellSnapshot {
    pub chrome: ChromeState,
    /// Tab ids in display order
    pub tabs: Vec<TabId>,
    pub selected: Option<TabId>,
    /// Session the visible view is attached to
    pub attached: Option<SessionId>,
    pub switcher_visible: bool,
    pub crash_prompts: Vec<CrashPrompt>,
}

/// The browser shell controller.
///
/// Owns the [`TabManager`], the visible surface and every engine session (through the
/// manager). All mutation happens on whoever drives the shell: either directly through
/// `&mut self`, or on the task started by [`BrowserShell::start`], which serializes
/// engine events, host commands and deferred actions onto one loop.
pub struct BrowserShell {
    pub(crate) config: Arc<ShellConfig>,
    pub(crate) manager: TabManager,
    pub(crate) surface: Arc<ShellSurface>,
    pub(crate) deferred: DeferredQueue,
    pub(crate) crash_prompts: VecDeque<CrashPrompt>,
    pub(crate) switcher_visible: bool,
    sink: SessionEventSink,
    event_rx: SessionEventReceiver,
}

impl BrowserShell {
    /// Creates a new shell without any tabs.
    ///
    /// The surface is subscribed to the tab manager before anything else, so it sees every
    /// tab from the first one on.
    pub fn new(config: ShellConfig, factory: Box<dyn SessionFactory>, view: Box<dyn SessionView>) -> Self {
        let config = Arc::new(config);
        let (sink, event_rx) = SessionEventSink::channel();

        let mut manager = TabManager::new(config.clone(), factory, sink.clone());
        let surface = Arc::new(ShellSurface::new(view));
        manager.subscribe(surface.clone());

        Self {
            config,
            manager,
            surface,
            deferred: DeferredQueue::new(),
            crash_prompts: VecDeque::new(),
            switcher_visible: false,
            sink,
            event_rx,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Sink that delivers events into this shell. Every session already gets one from the
    /// tab manager; this is for hosts that relay engine callbacks themselves.
    pub fn event_sink(&self) -> SessionEventSink {
        self.sink.clone()
    }

    pub fn manager(&self) -> &TabManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut TabManager {
        &mut self.manager
    }

    pub fn chrome(&self) -> ChromeState {
        self.surface.chrome()
    }

    /// Session the visible view is attached to
    pub fn attached_session(&self) -> Option<SessionId> {
        self.surface.attached()
    }

    pub fn is_switcher_visible(&self) -> bool {
        self.switcher_visible
    }

    /// Open the homepage in a selected tab if there is no tab yet.
    pub fn ensure_tab(&mut self) {
        if self.manager.is_empty() {
            let homepage = self.config.homepage.clone();
            self.manager.create_tab(Some(&homepage), true);
        }
    }

    // ---------- Engine events ----------

    /// Route every queued session event. Returns the number of events routed.
    ///
    /// Routing can make sessions emit further events (a new tab starts loading, for
    /// example); those are routed in the same call.
    pub fn pump_events(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.event_rx.try_recv() {
            self.dispatch(msg);
            count += 1;
        }
        count
    }

    fn dispatch(&mut self, msg: SessionMessage) {
        let outcome = self.route(msg.event);
        if let Some(reply) = msg.reply {
            if reply.send(outcome).is_err() {
                log::debug!("Session dropped its reply receiver");
            }
        }
    }

    // ---------- Deferred actions ----------

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deferred.next_deadline()
    }

    /// Run every deferred action due at `now`. Actions that no longer apply are dropped.
    pub fn run_due(&mut self, now: Instant) {
        for action in self.deferred.take_due(now) {
            match action {
                DeferredAction::CaptureThumbnail { tab_id, session, generation } => {
                    let current = self.manager.tab(tab_id).is_some_and(|t| {
                        t.session_id() == session
                            && t.generation() == generation
                            && t.session_state() == SessionState::Open
                    });

                    if !current || !self.manager.is_selected(tab_id) {
                        log::debug!("Dropping stale thumbnail capture for tab {}", tab_id);
                        continue;
                    }
                    self.capture_thumbnail();
                }
            }
        }
    }

    /// Snapshot the visible view into the selected tab. Returns false when nothing was
    /// captured.
    pub fn capture_thumbnail(&mut self) -> bool {
        let Some(tab) = self.manager.selected_tab() else {
            return false;
        };
        let tab_id = tab.id();
        if self.surface.attached() != Some(tab.session_id()) {
            log::debug!("View is not showing tab {}, skipping thumbnail", tab_id);
            return false;
        }

        match self.surface.snapshot(self.config.thumbnail_max_dim) {
            Ok(thumbnail) => self.manager.update_tab(tab_id, TabUpdate::thumbnail(thumbnail)),
            Err(e) => {
                log::warn!("Thumbnail capture for tab {} failed: {}", tab_id, e);
                false
            }
        }
    }

    // ---------- User intents ----------

    /// Apply a chrome action to the selected tab. Returns the switcher model when the
    /// action opened the tab switcher.
    pub fn handle_action(&mut self, action: ShellAction) -> Option<TabSwitcherModel> {
        log::debug!("Shell action: {:?}", action);

        match action {
            ShellAction::Submit(text) => {
                let Some(url) = resolve_input(&text, &self.config) else {
                    return None;
                };
                self.load_in_selected(&url);
            }
            ShellAction::Home => {
                let homepage = self.config.homepage.clone();
                self.load_in_selected(&homepage);
            }
            ShellAction::Back => {
                if let Some(tab) = self.manager.selected_tab_mut() {
                    tab.go_back();
                }
            }
            ShellAction::Forward => {
                if let Some(tab) = self.manager.selected_tab_mut() {
                    tab.go_forward();
                }
            }
            ShellAction::Reload => {
                if let Some(tab) = self.manager.selected_tab_mut() {
                    tab.reload();
                }
            }
            ShellAction::Stop => {
                if let Some(tab) = self.manager.selected_tab_mut() {
                    tab.stop();
                }
            }
            ShellAction::NewTab => {
                self.capture_thumbnail();
                let homepage = self.config.homepage.clone();
                self.manager.create_tab(Some(&homepage), true);
            }
            ShellAction::OpenTabSwitcher => return Some(self.open_tab_switcher()),
        }
        None
    }

    fn load_in_selected(&mut self, url: &str) {
        let Some(tab) = self.manager.selected_tab_mut() else {
            return;
        };
        tab.load(url);
        self.surface.with_chrome(|c| c.set_url(Some(url)));
    }

    /// Capture the selected tab, then show the switcher.
    pub fn open_tab_switcher(&mut self) -> TabSwitcherModel {
        self.capture_thumbnail();
        self.switcher_visible = true;
        TabSwitcherModel::from_manager(&self.manager)
    }

    /// Apply a switcher intent. Returns the refreshed model while the switcher stays open.
    pub fn handle_switcher(&mut self, intent: SwitcherIntent) -> Option<TabSwitcherModel> {
        log::debug!("Switcher intent: {:?}", intent);

        match intent {
            SwitcherIntent::Select(id) => {
                self.manager.select_tab(id);
            }
            SwitcherIntent::Close(id) => {
                self.manager.close_tab(id);
                return Some(TabSwitcherModel::from_manager(&self.manager));
            }
            SwitcherIntent::NewTab => {
                self.capture_thumbnail();
                let homepage = self.config.homepage.clone();
                self.manager.create_tab(Some(&homepage), true);
            }
            SwitcherIntent::Dismiss => {
                // The view may have been repointed while the switcher was up
                if let Some(id) = self.manager.selected_id() {
                    self.manager.select_tab(id);
                }
            }
        }

        self.switcher_visible = false;
        None
    }

    // ---------- Crash recovery ----------

    /// Crash prompts still waiting for a decision, oldest first
    pub fn crash_prompts(&self) -> Vec<CrashPrompt> {
        self.crash_prompts
            .iter()
            .filter(|p| self.manager.contains(p.tab))
            .copied()
            .collect()
    }

    pub(crate) fn queue_crash_prompt(&mut self, prompt: CrashPrompt) {
        let manager = &self.manager;
        self.crash_prompts.retain(|p| manager.contains(p.tab));
        if self.crash_prompts.iter().any(|p| p.tab == prompt.tab) {
            log::debug!("Crash prompt for tab {} already pending", prompt.tab);
            return;
        }
        self.crash_prompts.push_back(prompt);
    }

    /// Resolve the crash prompt of `tab`. Returns false when the tab no longer exists or
    /// its session is not crashed, so repeated or stale decisions do nothing.
    pub fn resolve_crash(&mut self, tab: TabId, recovery: CrashRecovery) -> bool {
        self.crash_prompts.retain(|p| p.tab != tab);
        match self.manager.tab(tab).map(|t| t.session_state()) {
            None => {
                log::debug!("Ignoring crash recovery for unknown tab {}", tab);
                return false;
            }
            Some(SessionState::Crashed) => {}
            Some(state) => {
                log::debug!("Ignoring crash recovery for tab {} in state {:?}", tab, state);
                return false;
            }
        }

        match recovery {
            CrashRecovery::Close => self.manager.close_tab(tab),
            CrashRecovery::Reload => {
                let homepage = self.config.homepage.clone();
                let Some(t) = self.manager.tab_mut(tab) else {
                    return false;
                };
                let generation = t.reopen();
                let url = t.url().map(str::to_string).unwrap_or(homepage);
                log::info!("Reopened session of tab {} (generation {})", tab, generation);

                if self.manager.is_selected(tab) {
                    self.manager.select_tab(tab);
                }
                if let Some(t) = self.manager.tab_mut(tab) {
                    t.load(&url);
                }
                true
            }
        }
    }

    // ---------- Snapshot / lifecycle ----------

    pub fn snapshot(&self) -> ShellSnapshot {
        ShellSnapshot {
            chrome: self.surface.chrome(),
            tabs: self.manager.tabs().iter().map(|t| t.id()).collect(),
            selected: self.manager.selected_id(),
            attached: self.surface.attached(),
            switcher_visible: self.switcher_visible,
            crash_prompts: self.crash_prompts(),
        }
    }

    /// Starts the shell loop on the current tokio runtime and returns a handle to it.
    /// A homepage tab is opened first if there are no tabs.
    pub fn start(self) -> (ShellHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ShellCommand>(self.config.event_channel_capacity);
        let handle = ShellHandle::new(cmd_tx, self.manager.event_sender());
        let join_handle = tokio::spawn(self.run(cmd_rx));

        (handle, join_handle)
    }

    /// Run the shell loop until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self, mut cmd_rx: mpsc::Receiver<ShellCommand>) {
        self.ensure_tab();
        self.pump_events();

        loop {
            let deadline = self.deferred.next_deadline();

            tokio::select! {
                Some(msg) = self.event_rx.recv() => {
                    self.dispatch(msg);
                    self.pump_events();
                }

                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else {
                        log::info!("All shell handles dropped, stopping");
                        self.shutdown();
                        break;
                    };
                    if !self.handle_command(cmd) {
                        break;
                    }
                    self.pump_events();
                }

                _ = async {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                        None => futures::future::pending().await,
                    }
                } => {
                    self.run_due(Instant::now());
                    self.pump_events();
                }
            }
        }
    }

    /// Returns false once the loop should stop.
    fn handle_command(&mut self, cmd: ShellCommand) -> bool {
        match cmd {
            ShellCommand::Action { action, reply } => {
                let _ = reply.send(self.handle_action(action));
            }
            ShellCommand::Switcher { intent, reply } => {
                let _ = reply.send(self.handle_switcher(intent));
            }
            ShellCommand::ResolveCrash { tab, recovery, reply } => {
                let _ = reply.send(self.resolve_crash(tab, recovery));
            }
            ShellCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            ShellCommand::Shutdown { reply } => {
                self.shutdown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn shutdown(&mut self) {
        log::info!(
            "Shutting down shell with {} tab(s), dropping {} deferred action(s)",
            self.manager.tab_count(),
            self.deferred.len()
        );
        self.manager.shutdown();
        self.deferred = DeferredQueue::new();
        self.crash_prompts.clear();
    }
}
