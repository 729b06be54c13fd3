//! Deadline-ordered queue of deferred shell actions.
//!
//! Actions are fire-and-forget: nothing cancels them. Instead each action carries enough
//! identity to be re-validated when it comes due, and the shell drops the ones that no
//! longer apply.

use crate::shell::session::SessionId;
use crate::shell::tab::TabId;
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeferredAction {
    /// Snapshot the visible view into the tab, if the tab is still the selected owner of
    /// the same session generation.
    CaptureThumbnail {
        tab_id: TabId,
        session: SessionId,
        generation: u64,
    },
}

#[derive(Debug, Default)]
pub(crate) struct DeferredQueue {
    /// Keyed by (deadline, insertion sequence) so equal deadlines keep their order
    entries: BTreeMap<(Instant, u64), DeferredAction>,
    seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, action: DeferredAction) {
        self.entries.insert((due, self.seq), action);
        self.seq += 1;
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn capture(generation: u64) -> DeferredAction {
        DeferredAction::CaptureThumbnail {
            tab_id: TabId::new(),
            session: SessionId::new(),
            generation,
        }
    }

    #[test]
    fn takes_only_due_actions_in_deadline_order() {
        let mut q = DeferredQueue::new();
        let now = Instant::now();
        let late = capture(2);
        let early = capture(1);
        q.schedule(now + Duration::from_millis(500), late.clone());
        q.schedule(now + Duration::from_millis(100), early.clone());

        assert_eq!(q.next_deadline(), Some(now + Duration::from_millis(100)));
        assert!(q.take_due(now).is_empty());
        assert_eq!(q.take_due(now + Duration::from_millis(100)), vec![early]);
        assert_eq!(q.len(), 1);
        assert_eq!(q.take_due(now + Duration::from_secs(1)), vec![late]);
        assert_eq!(q.len(), 0);
        assert_eq!(q.next_deadline(), None);
    }

    #[test]
    fn equal_deadlines_keep_insertion_order() {
        let mut q = DeferredQueue::new();
        let at = Instant::now();
        let (a, b) = (capture(1), capture(2));
        q.schedule(at, a.clone());
        q.schedule(at, b.clone());
        assert_eq!(q.take_due(at), vec![a, b]);
    }
}
