use crate::shell::events::{SessionEvent, SessionEventKind};
use crate::shell::session::{EngineSession, SessionEventSink, SessionFactory, SessionId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, ordered journal of calls made on null sessions and views. Lets callers
/// check the relative order of operations across several collaborators.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Null engine session that does not render anything.
///
/// It records every call into its [`CallLog`] as `"<op> <session>[ <arg>]"` and keeps a
/// simple navigation history. When `emit_navigation` is set, it reports the events a real
/// engine would (page start, location, back/forward availability, page stop) through its sink.
pub struct NullSession {
    id: SessionId,
    open: bool,
    events: SessionEventSink,
    log: CallLog,
    history: Vec<String>,
    index: Option<usize>,
    emit_navigation: bool,
}

impl NullSession {
    pub fn new(id: SessionId, events: SessionEventSink, log: CallLog, emit_navigation: bool) -> Self {
        Self {
            id,
            open: false,
            events,
            log,
            history: Vec::new(),
            index: None,
            emit_navigation,
        }
    }

    fn record(&self, op: &str, arg: Option<&str>) {
        let entry = match arg {
            Some(arg) => format!("{op} {} {arg}", self.id),
            None => format!("{op} {}", self.id),
        };
        self.log.lock().push(entry);
    }

    fn emit(&self, kind: SessionEventKind) {
        if !self.emit_navigation {
            return;
        }
        if self.events.emit(SessionEvent::new(self.id, kind)).is_err() {
            log::debug!("NullSession {}: shell is gone, event dropped", self.id);
        }
    }

    fn commit_current(&self) {
        let Some(url) = self.index.map(|i| self.history[i].clone()) else {
            return;
        };

        self.emit(SessionEventKind::PageStart { url: url.clone() });
        self.emit(SessionEventKind::LocationChanged { url: Some(url), permissions: vec![] });
        self.emit(SessionEventKind::CanGoBackChanged(self.index.is_some_and(|i| i > 0)));
        self.emit(SessionEventKind::CanGoForwardChanged(
            self.index.is_some_and(|i| i + 1 < self.history.len()),
        ));
        self.emit(SessionEventKind::ProgressChanged { percent: 100 });
        self.emit(SessionEventKind::PageStop { success: true });
    }
}

impl EngineSession for NullSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) {
        self.record("open", None);
        self.open = true;
    }

    fn close(&mut self) {
        self.record("close", None);
        self.open = false;
    }

    fn load(&mut self, url: &str) {
        self.record("load", Some(url));
        if !self.open {
            return;
        }

        let next = self.index.map_or(0, |i| i + 1);
        self.history.truncate(next);
        self.history.push(url.to_string());
        self.index = Some(next);
        self.commit_current();
    }

    fn reload(&mut self) {
        self.record("reload", None);
        if self.open {
            self.commit_current();
        }
    }

    fn stop(&mut self) {
        self.record("stop", None);
    }

    fn go_back(&mut self) {
        self.record("go_back", None);
        if let Some(i) = self.index.filter(|i| *i > 0 && self.open) {
            self.index = Some(i - 1);
            self.commit_current();
        }
    }

    fn go_forward(&mut self) {
        self.record("go_forward", None);
        if let Some(i) = self.index.filter(|i| i + 1 < self.history.len() && self.open) {
            self.index = Some(i + 1);
            self.commit_current();
        }
    }
}

/// Factory for [`NullSession`]s that all share one [`CallLog`].
pub struct NullSessionFactory {
    log: CallLog,
    emit_navigation: bool,
}

impl NullSessionFactory {
    pub fn new() -> Self {
        Self::with_log(call_log())
    }

    pub fn with_log(log: CallLog) -> Self {
        Self { log, emit_navigation: false }
    }

    /// Make created sessions report navigation events like a real engine would.
    pub fn emit_navigation(mut self, on: bool) -> Self {
        self.emit_navigation = on;
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl Default for NullSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionFactory for NullSessionFactory {
    fn create_session(&mut self, id: SessionId, events: SessionEventSink) -> Box<dyn EngineSession> {
        Box::new(NullSession::new(id, events, self.log.clone(), self.emit_navigation))
    }
}
