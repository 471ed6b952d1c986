//! Error types for ledger operations.

use courtside_core::{ActionId, MatchId};
use thiserror::Error;

/// Errors that can occur while appending to or annulling ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The action belongs to a different match.
    #[error("action belongs to match {found}, ledger is for {expected}")]
    WrongMatch {
        /// Match the ledger belongs to.
        expected: MatchId,
        /// Match named by the action.
        found: MatchId,
    },

    /// No entry with this id.
    #[error("action not found: {0}")]
    NotFound(ActionId),

    /// The entry was already annulled.
    #[error("action already annulled: {0}")]
    AlreadyAnnulled(ActionId),

    /// Undo found nothing to take back.
    #[error("no matching action to undo: {0}")]
    NoMatchingEntry(String),
}
