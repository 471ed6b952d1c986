//! Error types for the offline queue, the backend contract and sessions.

use courtside_core::{ActionId, MatchId};
use courtside_match::MatchError;
use courtside_realtime::RealtimeError;
use thiserror::Error;

/// Errors returned by a [`Backend`](crate::Backend).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached or timed out. The request may be
    /// retried.
    #[error("backend unreachable: {0}")]
    Transient(String),

    /// An entry with this idempotency id was already committed.
    #[error("duplicate submission: {0}")]
    Duplicate(ActionId),

    /// The match is unknown to the backend.
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// The ledger entry is unknown to the backend.
    #[error("action not found: {0}")]
    ActionNotFound(ActionId),

    /// The backend refused the request for good.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl BackendError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// Errors returned by sync components and sessions.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The local state machine refused the request; nothing was mutated.
    #[error(transparent)]
    Match(#[from] MatchError),

    /// A backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The realtime channel refused the subscription.
    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    /// A queued entry exceeded the retry ceiling and was dropped.
    #[error("action {action_id} abandoned after {attempts} attempts")]
    Abandoned {
        /// The dropped entry.
        action_id: ActionId,
        /// Failed attempts made.
        attempts: u32,
    },

    /// The realtime channel closed behind the session's back.
    #[error("realtime channel for match {0} is stale")]
    StaleChannel(MatchId),

    /// A drain is already running.
    #[error("a drain is already in progress")]
    DrainInProgress,

    /// The session was torn down.
    #[error("session has been torn down")]
    TornDown,

    /// Backend data that cannot be normalized.
    #[error("malformed backend data: {0}")]
    Malformed(String),

    /// Local persistence failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Whether the error is a local validation failure the user should see
    /// as a transient message.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Match(e) if e.is_validation())
    }
}
