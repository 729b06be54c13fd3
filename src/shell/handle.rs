use crate::shell::errors::ShellError;
use crate::shell::events::TabEvent;
use crate::shell::shell::{CrashRecovery, ShellAction, ShellSnapshot};
use crate::shell::switcher::{SwitcherIntent, TabSwitcherModel};
use crate::shell::tab::TabId;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Commands sent from a [`ShellHandle`] to the shell loop. Each carries a reply channel.
#[derive(Debug)]
pub(crate) enum ShellCommand {
    Action {
        action: ShellAction,
        reply: oneshot::Sender<Option<TabSwitcherModel>>,
    },
    Switcher {
        intent: SwitcherIntent,
        reply: oneshot::Sender<Option<TabSwitcherModel>>,
    },
    ResolveCrash {
        tab: TabId,
        recovery: CrashRecovery,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<ShellSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running [`BrowserShell`](crate::shell::BrowserShell).
#[derive(Clone)]
pub struct ShellHandle {
    /// Command sender into the shell loop
    cmd_tx: mpsc::Sender<ShellCommand>,
    /// Tab manager event bus
    event_tx: broadcast::Sender<TabEvent>,
}

impl std::fmt::Debug for ShellHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellHandle")
            .field("cmd_tx", &self.cmd_tx)
            .field("closed", &self.cmd_tx.is_closed())
            .finish()
    }
}

impl ShellHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<ShellCommand>, event_tx: broadcast::Sender<TabEvent>) -> Self {
        Self { cmd_tx, event_tx }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TabEvent> {
        self.event_tx.subscribe()
    }

    /// Send a command and wait for its reply.
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> ShellCommand) -> Result<T, ShellError> {
        let (tx, rx) = oneshot::channel();

        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| ShellError::ChannelClosed)?;

        rx.await.map_err(|_| ShellError::ChannelClosed)
    }

    /// Perform a chrome action. Yields the switcher model when the action opened it.
    pub async fn action(&self, action: ShellAction) -> Result<Option<TabSwitcherModel>, ShellError> {
        self.request(|reply| ShellCommand::Action { action, reply }).await
    }

    /// Apply a tab switcher intent. Yields the refreshed model while the switcher stays open.
    pub async fn switcher(&self, intent: SwitcherIntent) -> Result<Option<TabSwitcherModel>, ShellError> {
        self.request(|reply| ShellCommand::Switcher { intent, reply }).await
    }

    pub async fn resolve_crash(&self, tab: TabId, recovery: CrashRecovery) -> Result<bool, ShellError> {
        self.request(|reply| ShellCommand::ResolveCrash { tab, recovery, reply }).await
    }

    pub async fn snapshot(&self) -> Result<ShellSnapshot, ShellError> {
        self.request(|reply| ShellCommand::Snapshot { reply }).await
    }

    /// Close every session and stop the shell loop.
    pub async fn shutdown(&self) -> Result<(), ShellError> {
        self.request(|reply| ShellCommand::Shutdown { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::events::{SessionEvent, SessionEventKind};
    use crate::shell::shell::testing::{shell, HOME};
    use crate::shell::shell::CrashPrompt;
    use std::time::Duration;

    #[tokio::test]
    async fn start_opens_homepage_tab() {
        let (s, log) = shell(true);
        let (handle, join) = s.start();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.tabs.len(), 1);
        assert_eq!(snap.chrome.url(), Some(HOME));
        assert!(!snap.chrome.is_loading());
        let attached = snap.attached.expect("view attached to the first tab");
        assert!(log.lock().contains(&format!("attach {attached}")));

        handle.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn actions_and_switcher_round_trip() {
        let (s, _) = shell(true);
        let (handle, join) = s.start();
        let mut events = handle.subscribe_events();

        assert!(handle.action(ShellAction::NewTab).await.unwrap().is_none());
        // The thumbnail of the previous tab may be stored before the new tab is added
        loop {
            if let TabEvent::Added { .. } = events.recv().await.unwrap() {
                break;
            }
        }

        let model = handle.action(ShellAction::OpenTabSwitcher).await.unwrap().unwrap();
        assert_eq!(model.count_label, "2 tabs");
        let first = model.cards[0].id;

        handle.switcher(SwitcherIntent::Select(first)).await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.selected, Some(first));
        assert!(!snap.switcher_visible);

        handle.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn engine_events_reach_the_loop() {
        let (mut s, _) = shell(false);
        s.ensure_tab();
        let tab = s.manager().selected_tab().unwrap();
        let (tab_id, session) = (tab.id(), tab.session_id());
        let sink = s.event_sink();
        let (handle, join) = s.start();

        sink.emit(SessionEvent::new(session, SessionEventKind::Crashed)).unwrap();
        let mut snap = handle.snapshot().await.unwrap();
        for _ in 0..10 {
            if !snap.crash_prompts.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            snap = handle.snapshot().await.unwrap();
        }
        assert_eq!(snap.crash_prompts, vec![CrashPrompt { tab: tab_id, session }]);

        assert!(handle.resolve_crash(tab_id, CrashRecovery::Reload).await.unwrap());
        assert!(handle.snapshot().await.unwrap().crash_prompts.is_empty());

        handle.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn deferred_capture_fires_on_the_loop() {
        let (s, log) = shell(true);
        let (handle, join) = s.start();
        let snap = handle.snapshot().await.unwrap();
        assert!(!log.lock().iter().any(|e| e.starts_with("snapshot")));

        tokio::time::sleep(Duration::from_millis(700)).await;
        let attached = snap.attached.unwrap();
        assert!(log.lock().contains(&format!("snapshot {attached}")));

        handle.shutdown().await.unwrap();
        join.await.unwrap();
    }

    #[tokio::test]
    async fn requests_fail_after_shutdown() {
        let (s, _) = shell(false);
        let (handle, join) = s.start();
        handle.shutdown().await.unwrap();
        join.await.unwrap();

        assert!(matches!(handle.snapshot().await, Err(ShellError::ChannelClosed)));
    }
}
