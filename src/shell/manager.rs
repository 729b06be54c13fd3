//! Tab manager: the single authority over the ordered tab collection and the selection.
//!
//! Tabs are created only by [`TabManager::create_tab`] (which opens their session) and
//! destroyed only by [`TabManager::close_tab`] (which closes the session first). Once the
//! first tab exists the collection is never left empty: closing the last selected tab
//! creates a replacement tab on the homepage before returning.
//!
//! Operations on a tab that is no longer a member are silently ignored. UI actions can
//! race with asynchronous removal, so none of this is treated as an error.

mod observer;

pub use observer::{ObserverId, TabObserver};

use crate::shell::config::ShellConfig;
use crate::shell::events::TabEvent;
use crate::shell::session::{SessionEventSink, SessionFactory, SessionId};
use crate::shell::tab::{Tab, TabId, Thumbnail};
use crate::shell::DEFAULT_CHANNEL_CAPACITY;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Metadata update for [`TabManager::update_tab`]. Fields left at `None` are not touched.
#[derive(Debug, Clone, Default)]
pub struct TabUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

impl TabUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), ..Default::default() }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Self { url: Some(url.into()), ..Default::default() }
    }

    pub fn thumbnail(thumbnail: Thumbnail) -> Self {
        Self { thumbnail: Some(thumbnail), ..Default::default() }
    }
}

pub struct TabManager {
    config: Arc<ShellConfig>,
    /// All tabs, in creation order
    tabs: Vec<Tab>,
    /// Currently selected tab. Always a member of `tabs` when set.
    selected: Option<TabId>,

    /// Creates the engine session for each new tab
    factory: Box<dyn SessionFactory>,
    /// Handed to every new session so its events reach the router
    sink: SessionEventSink,

    /// Synchronous observers, notified in subscription order
    observers: Vec<(ObserverId, Arc<dyn TabObserver>)>,
    next_observer_id: u64,
    /// Broadcast bus for asynchronous listeners
    event_tx: broadcast::Sender<TabEvent>,
}

impl TabManager {
    pub fn new(config: Arc<ShellConfig>, factory: Box<dyn SessionFactory>, sink: SessionEventSink) -> Self {
        let (event_tx, _first_rx) = broadcast::channel::<TabEvent>(DEFAULT_CHANNEL_CAPACITY);

        Self {
            config,
            tabs: Vec::new(),
            selected: None,
            factory,
            sink,
            observers: Vec::new(),
            next_observer_id: 0,
            event_tx,
        }
    }

    // ---------- Observers ----------

    /// Register a synchronous observer. Every registered observer receives every notification.
    pub fn subscribe(&mut self, observer: Arc<dyn TabObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    /// Receive [`TabEvent`]s from this point on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<TabEvent> {
        self.event_tx.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<TabEvent> {
        self.event_tx.clone()
    }

    fn notify(&self, f: impl Fn(&dyn TabObserver)) {
        for (_, observer) in &self.observers {
            f(observer.as_ref());
        }
    }

    fn notify_updated(&self) {
        self.notify(|o| o.tabs_updated(self));
        let _ = self.event_tx.send(TabEvent::Updated);
    }

    // ---------- Read access ----------

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == id)
    }

    pub(crate) fn tab_mut(&mut self, id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id() == id)
    }

    pub fn contains(&self, id: TabId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    pub fn selected_id(&self) -> Option<TabId> {
        self.selected
    }

    pub fn selected_tab(&self) -> Option<&Tab> {
        self.selected.and_then(|id| self.tab(id))
    }

    pub(crate) fn selected_tab_mut(&mut self) -> Option<&mut Tab> {
        let selected = self.selected;
        selected.and_then(move |id| self.tab_mut(id))
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|id| self.index_of(id))
    }

    pub fn is_selected(&self, id: TabId) -> bool {
        self.selected == Some(id)
    }

    /// Find the tab that owns the given session.
    pub fn tab_for_session(&self, session: SessionId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.session_id() == session)
    }

    // ---------- Creation ----------

    /// Create a tab, open its session and append it.
    ///
    /// With `select`, the tab is selected before anything is loaded into it, so observers
    /// bind it to the visible view first. A load issued before that would go to a session
    /// no view is attached to. The first tab is always selected.
    pub fn create_tab(&mut self, url: Option<&str>, select: bool) -> TabId {
        let tab_id = self.insert_tab(url, select);
        self.notify_updated();
        tab_id
    }

    /// Create, announce and optionally select a tab without the final "tabs updated".
    fn insert_tab(&mut self, url: Option<&str>, select: bool) -> TabId {
        let session = self.factory.create_session(SessionId::new(), self.sink.clone());
        let mut tab = Tab::new(session);
        tab.open();

        let tab_id = tab.id();
        self.tabs.push(tab);
        log::info!("Created tab {} (total: {})", tab_id, self.tabs.len());

        if let Some(tab) = self.tabs.last() {
            self.notify(|o| o.did_add_tab(self, tab));
        }
        let _ = self.event_tx.send(TabEvent::Added { tab_id });

        if select || self.selected.is_none() {
            self.select_tab(tab_id);
        }

        if let Some(url) = url {
            if let Some(tab) = self.tab_mut(tab_id) {
                tab.load(url);
            }
        }
        tab_id
    }

    // ---------- Selection ----------

    /// Select a tab. Selecting the already selected tab notifies again, which reruns the
    /// view binding of observers. Returns false if the tab is not a member.
    pub fn select_tab(&mut self, id: TabId) -> bool {
        let Some(index) = self.index_of(id) else {
            log::debug!("Ignoring selection of unknown tab {}", id);
            return false;
        };

        self.selected = Some(id);
        log::debug!("Selected tab {} (index {})", id, index);

        let tab = &self.tabs[index];
        self.notify(|o| o.did_select_tab(self, tab));
        let _ = self.event_tx.send(TabEvent::Selected { tab_id: id });
        true
    }

    pub fn select_tab_at(&mut self, index: usize) -> bool {
        match self.tabs.get(index) {
            Some(tab) => {
                let id = tab.id();
                self.select_tab(id)
            }
            None => false,
        }
    }

    // ---------- Closing ----------

    /// Close a tab: close its session, remove it, and fix up the selection.
    ///
    /// When the selected tab is closed, the tab that slid into its position is selected,
    /// or the new last tab when it was at the end. When it was the only tab, a new tab on
    /// the homepage replaces it. Returns false if the tab is not a member.
    pub fn close_tab(&mut self, id: TabId) -> bool {
        let Some(index) = self.index_of(id) else {
            log::debug!("Ignoring close of unknown tab {}", id);
            return false;
        };

        log::info!("Closing tab {} (index {})", id, index);

        self.tabs[index].close();
        let removed = self.tabs.remove(index);

        let was_selected = self.selected == Some(id);
        if was_selected {
            self.selected = None;
        }

        self.notify(|o| o.did_remove_tab(self, &removed));
        let _ = self.event_tx.send(TabEvent::Removed { tab_id: id });

        if was_selected {
            if self.tabs.is_empty() {
                let homepage = self.config.homepage.clone();
                self.insert_tab(Some(&homepage), true);
            } else {
                let new_index = index.min(self.tabs.len() - 1);
                let next = self.tabs[new_index].id();
                self.select_tab(next);
            }
        }

        self.notify_updated();
        true
    }

    pub fn close_tab_at(&mut self, index: usize) -> bool {
        match self.tabs.get(index) {
            Some(tab) => {
                let id = tab.id();
                self.close_tab(id)
            }
            None => false,
        }
    }

    /// Close every tab except `except` (if given and still a member).
    pub fn close_all_tabs(&mut self, except: Option<TabId>) {
        let to_close: Vec<TabId> = self
            .tabs
            .iter()
            .map(|t| t.id())
            .filter(|id| Some(*id) != except)
            .collect();

        for id in to_close {
            self.close_tab(id);
        }
    }

    /// Close every session and drop all tabs without creating a replacement. Only for
    /// tearing the shell down; the manager is empty afterwards.
    pub(crate) fn shutdown(&mut self) {
        self.selected = None;
        while let Some(mut tab) = self.tabs.pop() {
            tab.close();
            self.notify(|o| o.did_remove_tab(self, &tab));
            let _ = self.event_tx.send(TabEvent::Removed { tab_id: tab.id() });
        }
        log::info!("All tabs closed");
    }

    // ---------- Metadata ----------

    /// Apply the set fields of `update` to a tab and notify. Returns false if the tab is
    /// not a member.
    pub fn update_tab(&mut self, id: TabId, update: TabUpdate) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };

        if let Some(title) = update.title {
            tab.title = title;
        }
        if let Some(url) = update.url {
            tab.url = Some(url);
        }
        if let Some(thumbnail) = update.thumbnail {
            tab.thumbnail = Some(thumbnail);
        }

        self.notify_updated();
        true
    }

    /// Store back/forward availability. Does not notify.
    pub fn update_navigation(&mut self, id: TabId, can_go_back: bool, can_go_forward: bool) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };

        tab.can_go_back = can_go_back;
        tab.can_go_forward = can_go_forward;
        true
    }

    pub(crate) fn set_loading(&mut self, id: TabId, loading: bool) -> bool {
        let Some(tab) = self.tab_mut(id) else {
            return false;
        };

        tab.is_loading = loading;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::session::null::{CallLog, NullSessionFactory};
    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const HOME: &str = "https://home.test";

    fn manager() -> (TabManager, CallLog) {
        let cfg = Arc::new(ShellConfig::builder().homepage(HOME).build().unwrap());
        let factory = NullSessionFactory::new();
        let log = factory.log();
        let (sink, _rx) = SessionEventSink::channel();
        (TabManager::new(cfg, Box::new(factory), sink), log)
    }

    /// Observer that records every notification as a short string
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.calls.lock())
        }
    }

    impl TabObserver for Recorder {
        fn did_add_tab(&self, _manager: &TabManager, tab: &Tab) {
            self.calls.lock().push(format!("add {}", tab.id()));
        }
        fn did_remove_tab(&self, _manager: &TabManager, tab: &Tab) {
            self.calls.lock().push(format!("remove {}", tab.id()));
        }
        fn did_select_tab(&self, manager: &TabManager, tab: &Tab) {
            assert_eq!(manager.selected_id(), Some(tab.id()));
            self.calls.lock().push(format!("select {}", tab.id()));
        }
        fn tabs_updated(&self, _manager: &TabManager) {
            self.calls.lock().push("updated".to_string());
        }
    }

    fn assert_integrity(m: &TabManager) {
        assert!(!m.is_empty(), "tabs must never be empty once created");
        let selected = m.selected_id().expect("selection must be set");
        assert!(m.contains(selected), "selection must be a member");
    }

    #[test]
    fn create_selects_and_loads() {
        let (mut m, log) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(Some("https://x.test"), true);

        assert_eq!(m.tabs().iter().map(|t| t.id()).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(m.selected_id(), Some(b));
        assert_eq!(m.tab(b).unwrap().url(), Some("https://x.test"));
        assert_eq!(m.tab(a).unwrap().url(), None);

        let sid = m.tab(b).unwrap().session_id();
        let entries = log.lock().clone();
        assert!(entries.contains(&format!("open {sid}")));
        assert!(entries.contains(&format!("load {sid} https://x.test")));
    }

    #[test]
    fn create_without_select_keeps_selection() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(Some("https://bg.test"), false);
        assert_eq!(m.selected_id(), Some(a));
        assert_eq!(m.tab(b).unwrap().url(), Some("https://bg.test"));
    }

    #[test]
    fn first_tab_is_always_selected() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, false);
        assert_eq!(m.selected_id(), Some(a));
    }

    #[test]
    fn create_notifies_in_order() {
        let (mut m, _) = manager();
        let rec = Arc::new(Recorder::default());
        m.subscribe(rec.clone());

        let a = m.create_tab(Some("https://a.test"), true);
        assert_eq!(rec.take(), vec![format!("add {a}"), format!("select {a}"), "updated".to_string()]);

        let b = m.create_tab(None, false);
        assert_eq!(rec.take(), vec![format!("add {b}"), "updated".to_string()]);
    }

    #[test]
    fn reselect_notifies_again() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let rec = Arc::new(Recorder::default());
        m.subscribe(rec.clone());

        assert!(m.select_tab(a));
        assert!(m.select_tab(a));
        assert_eq!(rec.take(), vec![format!("select {a}"), format!("select {a}")]);
    }

    #[test]
    fn unknown_tabs_are_ignored() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let rec = Arc::new(Recorder::default());
        m.subscribe(rec.clone());

        let stranger = TabId::new();
        assert!(!m.select_tab(stranger));
        assert!(!m.close_tab(stranger));
        assert!(!m.update_tab(stranger, TabUpdate::title("x")));
        assert!(!m.update_navigation(stranger, true, true));
        assert!(!m.select_tab_at(7));
        assert!(!m.close_tab_at(7));

        assert_eq!(m.selected_id(), Some(a));
        assert!(rec.take().is_empty());
    }

    #[test]
    fn scenario_close_back_to_one_then_replace() {
        let (mut m, log) = manager();
        let a = m.create_tab(None, true);
        assert_eq!(m.tab(a).unwrap().url(), None);

        let b = m.create_tab(Some("https://x.test"), true);
        assert_eq!(m.tab(b).unwrap().url(), Some("https://x.test"));
        assert_eq!(m.tab_count(), 2);
        assert_eq!(m.selected_id(), Some(b));

        let b_session = m.tab(b).unwrap().session_id();
        assert!(m.close_tab(b));
        assert_eq!(m.tabs().iter().map(|t| t.id()).collect::<Vec<_>>(), vec![a]);
        assert_eq!(m.selected_id(), Some(a));
        assert!(log.lock().contains(&format!("close {b_session}")));

        assert!(m.close_tab(a));
        assert_eq!(m.tab_count(), 1);
        let c = m.selected_id().unwrap();
        assert_ne!(c, a);
        assert_eq!(m.tab(c).unwrap().url(), Some(HOME));
    }

    #[test]
    fn closing_selected_middle_selects_slid_in_tab() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(None, true);
        let c = m.create_tab(None, true);
        m.select_tab(b);
        assert_eq!(m.selected_index(), Some(1));

        m.close_tab(b);
        assert_eq!(m.tabs().iter().map(|t| t.id()).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(m.selected_id(), Some(c));
    }

    #[test]
    fn closing_selected_last_selects_new_last() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(None, true);
        let c = m.create_tab(None, true);
        assert_eq!(m.selected_id(), Some(c));

        m.close_tab(c);
        assert_eq!(m.selected_id(), Some(b));
        m.close_tab_at(0);
        assert_eq!(m.selected_id(), Some(b));
        assert!(!m.contains(a));
    }

    #[test]
    fn closing_background_tab_keeps_selection() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(None, true);
        m.close_tab(a);
        assert_eq!(m.selected_id(), Some(b));
        assert_eq!(m.tab_count(), 1);
    }

    #[test]
    fn close_last_updates_once_after_replacement() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let rec = Arc::new(Recorder::default());
        m.subscribe(rec.clone());

        m.close_tab(a);
        let calls = rec.take();
        assert_eq!(calls[0], format!("remove {a}"));
        let c = m.selected_id().unwrap();
        assert_eq!(calls[1..], [format!("add {c}"), format!("select {c}"), "updated".to_string()]);
    }

    #[test]
    fn close_all_except_keeps_exception_selected() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(None, true);
        let _c = m.create_tab(None, true);

        m.close_all_tabs(Some(b));
        assert_eq!(m.tabs().iter().map(|t| t.id()).collect::<Vec<_>>(), vec![b]);
        assert_eq!(m.selected_id(), Some(b));
        assert!(!m.contains(a));
    }

    #[test]
    fn close_all_leaves_one_homepage_tab() {
        let (mut m, _) = manager();
        let ids: Vec<_> = (0..4).map(|_| m.create_tab(None, true)).collect();
        m.select_tab(ids[1]);

        m.close_all_tabs(None);
        assert_eq!(m.tab_count(), 1);
        let only = &m.tabs()[0];
        assert!(!ids.contains(&only.id()));
        assert_eq!(only.url(), Some(HOME));
        assert_eq!(m.selected_id(), Some(only.id()));
    }

    #[test]
    fn update_tab_applies_only_set_fields() {
        let (mut m, _) = manager();
        let a = m.create_tab(Some("https://a.test"), true);

        m.update_tab(a, TabUpdate::title("A page"));
        let t = m.tab(a).unwrap();
        assert_eq!(t.title(), "A page");
        assert_eq!(t.url(), Some("https://a.test"));

        m.update_tab(a, TabUpdate::thumbnail(Thumbnail::blank(2, 2)));
        let t = m.tab(a).unwrap();
        assert_eq!(t.title(), "A page");
        assert!(t.thumbnail().is_some());

        m.update_tab(a, TabUpdate::default());
        assert_eq!(m.tab(a).unwrap().title(), "A page");
    }

    #[test]
    fn update_navigation_does_not_notify() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let rec = Arc::new(Recorder::default());
        m.subscribe(rec.clone());

        assert!(m.update_navigation(a, true, false));
        assert!(m.tab(a).unwrap().can_go_back());
        assert!(!m.tab(a).unwrap().can_go_forward());
        assert!(rec.take().is_empty());
    }

    #[test]
    fn tab_for_session_is_identity_lookup() {
        let (mut m, _) = manager();
        let a = m.create_tab(None, true);
        let b = m.create_tab(None, true);
        let sb = m.tab(b).unwrap().session_id();

        assert_eq!(m.tab_for_session(sb).map(|t| t.id()), Some(b));
        assert_ne!(m.tab_for_session(sb).map(|t| t.id()), Some(a));
        assert!(m.tab_for_session(SessionId::new()).is_none());

        m.close_tab(b);
        assert!(m.tab_for_session(sb).is_none());
    }

    #[test]
    fn multiple_observers_and_unsubscribe() {
        let (mut m, _) = manager();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let first_id = m.subscribe(first.clone());
        m.subscribe(second.clone());

        m.create_tab(None, true);
        assert_eq!(first.take().len(), 3);
        assert_eq!(second.take().len(), 3);

        assert!(m.unsubscribe(first_id));
        assert!(!m.unsubscribe(first_id));
        m.create_tab(None, true);
        assert!(first.take().is_empty());
        assert_eq!(second.take().len(), 3);
    }

    #[test]
    fn broadcast_bus_reports_structure() {
        let (mut m, _) = manager();
        let mut rx = m.subscribe_events();

        let a = m.create_tab(None, true);
        m.close_tab(a);

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }

        assert_eq!(events[0], TabEvent::Added { tab_id: a });
        assert_eq!(events[1], TabEvent::Selected { tab_id: a });
        assert_eq!(events[2], TabEvent::Updated);
        assert_eq!(events[3], TabEvent::Removed { tab_id: a });
        assert!(events.iter().filter(|e| matches!(e, TabEvent::Added { .. })).count() == 2);
    }

    #[test]
    fn shutdown_closes_every_session_without_replacement() {
        let (mut m, log) = manager();
        let a = m.create_tab(None, true);
        m.create_tab(None, false);
        let sa = m.tab(a).unwrap().session_id();

        m.shutdown();
        assert!(m.is_empty());
        assert_eq!(m.selected_id(), None);
        assert!(log.lock().contains(&format!("close {sa}")));
    }

    #[test]
    fn random_sequences_keep_invariants() {
        let mut rng = StdRng::seed_from_u64(0x7ab5);

        for _ in 0..50 {
            let (mut m, _) = manager();
            m.create_tab(None, true);

            for _ in 0..40 {
                let count = m.tab_count();
                match rng.random_range(0..5) {
                    0 => {
                        m.create_tab(Some("https://r.test"), rng.random::<bool>());
                    }
                    1 | 2 => {
                        m.close_tab_at(rng.random_range(0..count));
                    }
                    3 => {
                        m.select_tab_at(rng.random_range(0..count));
                    }
                    _ => {
                        let keep = m.tabs()[rng.random_range(0..count)].id();
                        m.close_all_tabs(Some(keep));
                        assert_eq!(m.selected_id(), Some(keep));
                    }
                }
                assert_integrity(&m);
            }
        }
    }
}
