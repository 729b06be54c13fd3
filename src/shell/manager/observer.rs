use crate::shell::manager::TabManager;
use crate::shell::tab::Tab;

/// Handle returned by [`TabManager::subscribe`], used to unsubscribe again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Synchronous listener for tab manager changes.
///
/// Notifications are delivered in order, on the thread doing the mutation, before the
/// mutating call returns. They carry no payload guarantees beyond "re-read the current
/// state" from the manager that is passed in, and observers must tolerate being told
/// the same thing twice.
///
/// Observers get shared access only; they cannot mutate the manager from a callback.
pub trait TabObserver: Send + Sync {
    /// A tab has been appended. It may not be selected.
    fn did_add_tab(&self, _manager: &TabManager, _tab: &Tab) {}

    /// A tab has been closed and removed. Its session is already closed.
    fn did_remove_tab(&self, _manager: &TabManager, _tab: &Tab) {}

    /// A tab became (or was again made) the selected tab.
    fn did_select_tab(&self, _manager: &TabManager, _tab: &Tab) {}

    /// Tab metadata or the collection changed.
    fn tabs_updated(&self, _manager: &TabManager) {}
}
