//! Events delivered over match channels.

use courtside_core::{MatchId, Timestamp};
use courtside_ledger::Action;
use courtside_match::MatchPatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum MatchEvent {
    /// Partial update to the match row.
    MatchDelta(MatchPatch),
    /// A new ledger entry.
    ActionInserted(Action),
    /// An existing ledger entry changed (its annulled flag).
    ActionUpdated(Action),
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchEvent::MatchDelta(_) => write!(f, "match_delta"),
            MatchEvent::ActionInserted(_) => write!(f, "action_inserted"),
            MatchEvent::ActionUpdated(_) => write!(f, "action_updated"),
        }
    }
}

/// An event as delivered to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Match the event belongs to.
    pub match_id: MatchId,
    /// Payload.
    pub event: MatchEvent,
    /// When the hub emitted it.
    pub timestamp: Timestamp,
    /// Unique event id.
    pub event_id: Uuid,
}

impl RealtimeEvent {
    /// Wraps a payload for a match.
    #[must_use]
    pub fn new(match_id: MatchId, event: MatchEvent) -> Self {
        Self {
            match_id,
            event,
            timestamp: Timestamp::now(),
            event_id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let patch = MatchPatch {
            quarter: Some(3),
            ..MatchPatch::default()
        };
        let json = serde_json::to_value(MatchEvent::MatchDelta(patch)).unwrap();
        assert_eq!(json["kind"], "match_delta");
        assert_eq!(json["data"]["quarter"], 3);
    }

    #[test]
    fn event_ids_are_unique() {
        let id = MatchId::generate();
        let a = RealtimeEvent::new(id, MatchEvent::MatchDelta(MatchPatch::default()));
        let b = RealtimeEvent::new(id, MatchEvent::MatchDelta(MatchPatch::default()));
        assert_eq!(a.match_id, id);
        assert_ne!(a.event_id, b.event_id);
    }
}
