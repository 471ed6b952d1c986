//! Per-match realtime channels.
//!
//! An [`EventHub`] fans authoritative changes out to every connected client:
//! partial match row updates ([`MatchEvent::MatchDelta`]) and new or
//! updated ledger entries. A [`MatchSubscription`] is the handle a
//! scorekeeper or spectator session holds for one match; a client that
//! falls [`CLIENT_BUFFER`] events behind is dropped and its handle reports
//! the channel closed.
//!
//! # Example
//!
//! ```
//! use courtside_core::MatchId;
//! use courtside_match::MatchPatch;
//! use courtside_realtime::{EventHub, MatchEvent};
//! use std::sync::Arc;
//!
//! let hub = Arc::new(EventHub::new());
//! let id = MatchId::generate();
//! let mut subscription = hub.subscribe_match(id).unwrap();
//!
//! hub.publish_delta(id, MatchPatch { score_home: Some(2), ..MatchPatch::default() });
//!
//! let event = subscription.try_recv().unwrap();
//! assert!(matches!(event.event, MatchEvent::MatchDelta(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod event;
mod handle;
mod hub;

pub use client::{Client, ClientId, CLIENT_BUFFER};
pub use error::RealtimeError;
pub use event::{MatchEvent, RealtimeEvent};
pub use handle::MatchSubscription;
pub use hub::{EventHub, MAX_CONNECTIONS};

/// Result type for realtime operations.
pub type Result<T> = std::result::Result<T, RealtimeError>;
