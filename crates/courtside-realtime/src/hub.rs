//! Event hub: connected clients and event fan-out.

use courtside_core::MatchId;
use courtside_ledger::Action;
use courtside_match::MatchPatch;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{create_client, Client, ClientId, ClientReceiver};
use crate::error::RealtimeError;
use crate::event::{MatchEvent, RealtimeEvent};
use crate::handle::MatchSubscription;

/// Maximum number of concurrent connections.
pub const MAX_CONNECTIONS: usize = 10_000;

/// Event hub managing client connections and match event delivery.
#[derive(Debug, Default)]
pub struct EventHub {
    /// Connected clients indexed by ID.
    clients: RwLock<HashMap<ClientId, Arc<Client>>>,
}

impl EventHub {
    /// Create a new event hub.
    pub fn new() -> Self {
        Self::default()
    }

    fn connect(&self, match_id: MatchId) -> Result<(Arc<Client>, ClientReceiver), RealtimeError> {
        let mut clients = self.clients.write();
        if clients.len() >= MAX_CONNECTIONS {
            return Err(RealtimeError::ConnectionLimit(MAX_CONNECTIONS));
        }

        let client_id = uuid::Uuid::new_v4().to_string();
        let (client, receiver) = create_client(client_id.clone(), match_id);
        clients.insert(client_id.clone(), client.clone());

        info!(client_id = %client_id, match_id = %match_id, "Client connected");
        Ok((client, receiver))
    }

    /// Opens the subscription for one match.
    ///
    /// # Errors
    ///
    /// [`RealtimeError::ConnectionLimit`] when the hub is full.
    pub fn subscribe_match(
        self: &Arc<Self>,
        match_id: MatchId,
    ) -> Result<MatchSubscription, RealtimeError> {
        let (client, receiver) = self.connect(match_id)?;
        Ok(MatchSubscription::new(
            Arc::downgrade(self),
            client.id.clone(),
            match_id,
            receiver,
        ))
    }

    /// Disconnect a client. Its receiver sees the end of the stream once
    /// queued events are consumed.
    pub fn disconnect(&self, client_id: &str) {
        if self.clients.write().remove(client_id).is_some() {
            info!(client_id = %client_id, "Client disconnected");
        }
    }

    /// Disconnect every client, as when the transport drops.
    pub fn disconnect_all(&self) -> usize {
        let dropped = self.clients.write().drain().count();
        if dropped > 0 {
            info!(clients = dropped, "All clients disconnected");
        }
        dropped
    }

    /// Whether a client is still connected.
    pub fn is_connected(&self, client_id: &str) -> bool {
        self.clients.read().contains_key(client_id)
    }

    /// Current connection count.
    pub fn connection_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Delivers an event to every client of its match.
    ///
    /// A client whose buffer is full, or whose receiver is gone, is
    /// disconnected; its session sees a closed channel and refetches.
    pub fn emit(&self, event: RealtimeEvent) {
        let mut recipients = 0;
        let mut stale = Vec::new();
        {
            let clients = self.clients.read();
            for client in clients.values().filter(|c| c.listens_to(&event.match_id)) {
                match client.send(event.clone()) {
                    Ok(()) => recipients += 1,
                    Err(err) => stale.push((client.id.clone(), err)),
                }
            }
        }

        for (client_id, err) in stale {
            warn!(client_id = %client_id, error = %err, "Dropping client");
            self.disconnect(&client_id);
        }

        debug!(
            match_id = %event.match_id,
            event = %event.event,
            recipients,
            "Event delivered"
        );
    }

    /// Publish a partial match row update.
    pub fn publish_delta(&self, match_id: MatchId, patch: MatchPatch) {
        self.emit(RealtimeEvent::new(match_id, MatchEvent::MatchDelta(patch)));
    }

    /// Publish a newly inserted ledger entry.
    pub fn publish_inserted(&self, action: Action) {
        let match_id = action.match_id;
        self.emit(RealtimeEvent::new(match_id, MatchEvent::ActionInserted(action)));
    }

    /// Publish a changed ledger entry.
    pub fn publish_updated(&self, action: Action) {
        let match_id = action.match_id;
        self.emit(RealtimeEvent::new(match_id, MatchEvent::ActionUpdated(action)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CLIENT_BUFFER;
    use courtside_ledger::ActionKind;

    #[tokio::test]
    async fn test_hub_connect_and_disconnect() {
        let hub = Arc::new(EventHub::new());
        let sub = hub.subscribe_match(MatchId::generate()).unwrap();
        assert_eq!(hub.connection_count(), 1);
        assert!(hub.is_connected(sub.client_id()));

        hub.disconnect(sub.client_id());
        assert_eq!(hub.connection_count(), 0);
        assert!(!sub.is_open());
    }

    #[tokio::test]
    async fn test_hub_delivers_per_match() {
        let hub = Arc::new(EventHub::new());
        let watched = MatchId::generate();
        let mut first = hub.subscribe_match(watched).unwrap();
        let mut second = hub.subscribe_match(watched).unwrap();
        let mut other = hub.subscribe_match(MatchId::generate()).unwrap();

        hub.publish_inserted(Action::new(watched, 1, ActionKind::Timeout));
        hub.publish_delta(watched, MatchPatch::default());

        assert_eq!(first.drain_pending().len(), 2);
        assert_eq!(second.drain_pending().len(), 2);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_hub_drops_lagging_client() {
        let hub = Arc::new(EventHub::new());
        let id = MatchId::generate();
        let mut idle = hub.subscribe_match(id).unwrap();
        let mut busy = hub.subscribe_match(id).unwrap();

        for quarter in 0..=CLIENT_BUFFER {
            hub.publish_delta(
                id,
                MatchPatch {
                    quarter: u8::try_from(quarter % 200).ok(),
                    ..MatchPatch::default()
                },
            );
            busy.drain_pending();
        }

        assert!(!idle.is_open());
        assert!(busy.is_open());
        assert_eq!(hub.connection_count(), 1);
        // What was buffered before the drop is still readable.
        assert_eq!(idle.drain_pending().len(), CLIENT_BUFFER);
    }

    #[tokio::test]
    async fn test_hub_disconnect_all() {
        let hub = Arc::new(EventHub::new());
        let mut sub = hub.subscribe_match(MatchId::generate()).unwrap();
        let _other = hub.subscribe_match(MatchId::generate()).unwrap();

        assert_eq!(hub.disconnect_all(), 2);
        assert_eq!(hub.connection_count(), 0);
        // The stream ends once the hub holds no sender.
        assert!(sub.recv().await.is_none());
    }
}
