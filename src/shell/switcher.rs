//! Read model and intents for the tab switcher.
//!
//! The switcher itself lives outside the shell. It gets a [`TabSwitcherModel`] when it is
//! opened and reports what the user did through [`SwitcherIntent`]s.

use crate::shell::manager::TabManager;
use crate::shell::tab::{TabId, Thumbnail};

/// What the user did in the tab switcher
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwitcherIntent {
    /// Switch to a tab and dismiss the switcher
    Select(TabId),
    /// Close a tab. The switcher stays open.
    Close(TabId),
    /// Open a new homepage tab and dismiss the switcher
    NewTab,
    /// Dismiss without changing the selection
    Dismiss,
}

/// One tab as shown in the switcher grid
#[derive(Debug, Clone, PartialEq)]
pub struct TabCard {
    pub id: TabId,
    pub title: String,
    pub thumbnail: Option<Thumbnail>,
    pub is_selected: bool,
}

/// Snapshot of the tab collection in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct TabSwitcherModel {
    pub cards: Vec<TabCard>,
    pub selected: Option<TabId>,
    /// "1 tab", "3 tabs"
    pub count_label: String,
}

impl TabSwitcherModel {
    pub fn from_manager(manager: &TabManager) -> Self {
        let cards = manager
            .tabs()
            .iter()
            .map(|tab| TabCard {
                id: tab.id(),
                title: tab.display_title(),
                thumbnail: tab.thumbnail().cloned(),
                is_selected: manager.is_selected(tab.id()),
            })
            .collect::<Vec<_>>();

        Self {
            count_label: count_label(cards.len()),
            cards,
            selected: manager.selected_id(),
        }
    }

    pub fn tab_count(&self) -> usize {
        self.cards.len()
    }
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "1 tab".to_string()
    } else {
        format!("{count} tabs")
    }
}
