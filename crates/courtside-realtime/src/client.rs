//! Connected clients.

use courtside_core::{MatchId, Timestamp};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::RealtimeError;
use crate::event::RealtimeEvent;

/// Events a client may hold undelivered before it counts as stale.
pub const CLIENT_BUFFER: usize = 256;

/// Unique identifier for a connected client.
pub type ClientId = String;

/// A connected client: a scorekeeper or spectator session listening to one
/// match.
#[derive(Debug)]
pub struct Client {
    /// Unique client identifier.
    pub id: ClientId,
    /// Match the client listens to.
    pub match_id: MatchId,
    /// When the client connected.
    pub connected_at: Timestamp,
    sender: mpsc::Sender<RealtimeEvent>,
}

impl Client {
    /// Creates a client delivering to `sender`.
    pub fn new(id: ClientId, match_id: MatchId, sender: mpsc::Sender<RealtimeEvent>) -> Self {
        Self {
            id,
            match_id,
            connected_at: Timestamp::now(),
            sender,
        }
    }

    /// Whether the client listens to `match_id`.
    #[must_use]
    pub fn listens_to(&self, match_id: &MatchId) -> bool {
        &self.match_id == match_id
    }

    /// Delivers an event without waiting.
    ///
    /// # Errors
    ///
    /// - [`RealtimeError::Lagged`] when the client's buffer is full.
    /// - [`RealtimeError::ChannelClosed`] when the receiver is gone.
    pub fn send(&self, event: RealtimeEvent) -> Result<(), RealtimeError> {
        self.sender.try_send(event).map_err(|err| match err {
            TrySendError::Full(_) => RealtimeError::Lagged(CLIENT_BUFFER),
            TrySendError::Closed(_) => RealtimeError::ChannelClosed,
        })
    }
}

/// Receiving end of a client's event stream.
pub type ClientReceiver = mpsc::Receiver<RealtimeEvent>;

/// Creates a client for `match_id` with its receiver.
pub fn create_client(id: ClientId, match_id: MatchId) -> (Arc<Client>, ClientReceiver) {
    let (sender, receiver) = mpsc::channel(CLIENT_BUFFER);
    (Arc::new(Client::new(id, match_id, sender)), receiver)
}
