//! Tab system: [`Tab`], [`TabId`] and [`Thumbnail`].
//!

#[allow(clippy::module_inception)]
mod tab;
mod thumbnail;

pub use tab::{SessionState, Tab, TabId, DEFAULT_TAB_TITLE};
pub use thumbnail::Thumbnail;
