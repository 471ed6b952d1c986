//! The contract the scoring core consumes from the backend.

use async_trait::async_trait;
use courtside_core::{ActionId, DeviceId, MatchId};
use courtside_ledger::Action;
use courtside_match::{MatchPatch, MatchRecord};
use courtside_realtime::MatchSubscription;

use crate::error::BackendError;
use crate::wire::WireMatch;

/// Result type for backend calls.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// The authoritative store and realtime push channel.
///
/// Submissions must be idempotent on [`Action::id`]: a resubmitted id is
/// answered with [`BackendError::Duplicate`] and never applied twice.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Commits a ledger entry recorded by `device`.
    async fn submit_action(&self, device: &DeviceId, action: &Action) -> BackendResult<()>;

    /// Flips a committed entry's annulled flag. Annulling an annulled entry
    /// succeeds and changes nothing.
    async fn annul_action(&self, match_id: MatchId, action_id: ActionId) -> BackendResult<Action>;

    /// Writes match header fields not modeled as ledger entries.
    async fn update_match(&self, match_id: MatchId, patch: &MatchPatch)
        -> BackendResult<MatchRecord>;

    /// Reads the match row with its team relations.
    async fn fetch_match(&self, match_id: MatchId) -> BackendResult<WireMatch>;

    /// Reads the whole ledger of a match.
    async fn fetch_actions(&self, match_id: MatchId) -> BackendResult<Vec<Action>>;

    /// Opens the realtime channel of a match.
    async fn subscribe(&self, match_id: MatchId) -> BackendResult<MatchSubscription>;
}
