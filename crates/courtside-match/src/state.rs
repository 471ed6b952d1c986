//! Match lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a match.
///
/// `Scheduled -> InProgress -> Finished`, with `InProgress <-> Suspended`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Created, not yet tipped off. Rosters and jerseys may change.
    #[default]
    Scheduled,
    /// Being played; scoring actions are accepted.
    InProgress,
    /// Interrupted with a reason; may resume.
    Suspended,
    /// Terminal.
    Finished,
}

impl MatchState {
    /// Whether scoring actions are accepted.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, MatchState::InProgress)
    }

    /// Whether the match has ended.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, MatchState::Finished)
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchState::Scheduled => write!(f, "scheduled"),
            MatchState::InProgress => write!(f, "in_progress"),
            MatchState::Suspended => write!(f, "suspended"),
            MatchState::Finished => write!(f, "finished"),
        }
    }
}
