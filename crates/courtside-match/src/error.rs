//! Error types for match operations.

use courtside_core::PlayerId;
use courtside_ledger::LedgerError;
use courtside_rules::RuleViolation;
use thiserror::Error;

/// Errors returned by the match state machine.
///
/// Every error is raised before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// The request is malformed or asks to take back something that is not
    /// on record.
    #[error("validation error: {0}")]
    Validation(String),

    /// The request is well formed but the match may not do it now.
    #[error("cannot {action}: {reason}")]
    IllegalTransition {
        /// What was attempted.
        action: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// The player is not called up for the team.
    #[error("player not on the team sheet: {0}")]
    UnknownPlayer(PlayerId),

    /// The ledger refused the entry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl MatchError {
    pub(crate) fn illegal(action: &'static str, reason: impl Into<String>) -> Self {
        MatchError::IllegalTransition {
            action,
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        MatchError::Validation(message.into())
    }

    /// Whether the error is a local validation failure rather than a refused
    /// transition.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, MatchError::Validation(_) | MatchError::UnknownPlayer(_))
    }
}

impl From<RuleViolation> for MatchError {
    fn from(violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::TimeoutLimit { .. } => MatchError::illegal("call timeout", violation.to_string()),
            other => MatchError::Validation(other.to_string()),
        }
    }
}
