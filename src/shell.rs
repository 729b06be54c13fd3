//! Tab lifecycle and session routing for a browser shell.
//!
//! The shell hosts an external rendering engine that is reached only through the
//! [`EngineSession`](session::EngineSession) seam. Everything in here is the
//! bookkeeping around those sessions: which [`Tab`](tab::Tab) owns which session,
//! which tab is bound to the single visible surface, and how engine callbacks
//! find their way back to the right tab.
//!
//! # Main Types
//!
//! - [`TabManager`]: the authority over the ordered tab collection and the selection.
//! - [`BrowserShell`]: the controller that owns the manager, the visible surface and
//!   routes session events.
//! - [`ShellHandle`]: cloneable handle used to drive a running shell from other tasks.

pub mod config;
pub mod errors;
pub mod events;
pub mod input;
pub mod manager;
pub mod session;
pub mod switcher;
pub mod tab;

mod deferred;
mod handle;
mod router;
#[allow(clippy::module_inception)]
mod shell;
mod surface;

pub use config::ShellConfig;
pub use errors::ShellError;
pub use events::{RouteOutcome, SessionEvent, SessionEventKind, TabEvent};
pub use handle::ShellHandle;
pub use manager::{TabManager, TabObserver};
pub use session::{EngineSession, SessionEventSink, SessionFactory, SessionId};
pub use shell::{BrowserShell, CrashPrompt, CrashRecovery, ShellAction, ShellSnapshot};
pub use surface::{ChromeState, NullView, SessionView};
pub use switcher::{SwitcherIntent, TabSwitcherModel};
pub use tab::{Tab, TabId};

/// Default capacity for the bounded command channel between a [`ShellHandle`] and the
/// shell run loop.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
