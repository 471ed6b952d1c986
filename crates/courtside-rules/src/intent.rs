//! Do / undo intent.

use serde::{Deserialize, Serialize};

/// Whether an action is being recorded or taken back.
///
/// Threaded explicitly through every rule and ledger call so there is no
/// shared "decrement mode" toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionIntent {
    /// Record the action.
    #[default]
    Do,
    /// Take back the most recent matching action.
    Undo,
}

impl ActionIntent {
    /// True for [`ActionIntent::Undo`].
    #[must_use]
    pub const fn is_undo(self) -> bool {
        matches!(self, ActionIntent::Undo)
    }
}
