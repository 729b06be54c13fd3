//! Engine session seam: [`EngineSession`], [`SessionFactory`], [`SessionId`] and the
//! [`SessionEventSink`] sessions use to report back to the shell.
//!
//! The rendering engine itself lives outside this crate. A session is one independent
//! browsing context; the shell only ever opens, closes and navigates it, and listens to
//! what it reports.

pub mod null;

use crate::shell::errors::ShellError;
use crate::shell::events::{RouteOutcome, SessionEvent};
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// A unique identifier for an engine session.
///
/// Engines receive the id when the session is created and must tag every event they
/// emit with it. Treat it as an opaque handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle operations of one engine session.
///
/// None of these report errors: failures surface asynchronously as session events.
/// Opening an already open session is the engine's concern.
pub trait EngineSession: Send {
    /// Identifier this session tags its events with
    fn id(&self) -> SessionId;
    fn is_open(&self) -> bool;
    fn open(&mut self);
    fn close(&mut self);
    fn load(&mut self, url: &str);
    fn reload(&mut self);
    fn stop(&mut self);
    fn go_back(&mut self);
    fn go_forward(&mut self);
}

/// Creates engine sessions wired to the shell's event sink.
pub trait SessionFactory: Send {
    fn create_session(&mut self, id: SessionId, events: SessionEventSink) -> Box<dyn EngineSession>;
}

/// A session event on its way to the router, with an optional reply slot for events
/// the engine needs an answer to.
#[derive(Debug)]
pub(crate) struct SessionMessage {
    pub event: SessionEvent,
    pub reply: Option<oneshot::Sender<RouteOutcome>>,
}

pub(crate) type SessionEventReceiver = mpsc::UnboundedReceiver<SessionMessage>;

/// Sending side of the session event channel. Cloned into every session.
///
/// The channel is unbounded because engines call back synchronously and must never block.
/// Ordering is preserved per sender, so events of one session arrive in emission order.
#[derive(Clone, Debug)]
pub struct SessionEventSink {
    tx: mpsc::UnboundedSender<SessionMessage>,
}

impl SessionEventSink {
    pub(crate) fn channel() -> (SessionEventSink, SessionEventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SessionEventSink { tx }, rx)
    }

    /// Report an event without waiting for an answer.
    pub fn emit(&self, event: SessionEvent) -> Result<(), ShellError> {
        self.tx
            .send(SessionMessage { event, reply: None })
            .map_err(|_| ShellError::ChannelClosed)
    }

    /// Report an event and receive the router's answer once it has been handled.
    pub fn request(&self, event: SessionEvent) -> Result<oneshot::Receiver<RouteOutcome>, ShellError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(SessionMessage { event, reply: Some(tx) })
            .map_err(|_| ShellError::ChannelClosed)?;
        Ok(rx)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
