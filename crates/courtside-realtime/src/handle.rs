//! Per-match subscription handles.

use courtside_core::MatchId;
use futures::stream::{self, Stream};
use std::sync::Weak;
use tokio::sync::mpsc::error::TryRecvError;

use crate::client::{ClientId, ClientReceiver};
use crate::event::RealtimeEvent;
use crate::hub::EventHub;

/// A live subscription to one match's channel.
///
/// Holds only a weak reference to the hub: when the hub drops the client
/// (transport loss) or the hub itself goes away, [`recv`](Self::recv)
/// drains what was queued and then returns `None`, and
/// [`is_open`](Self::is_open) reports `false`. Dropping the handle
/// unsubscribes.
#[derive(Debug)]
pub struct MatchSubscription {
    hub: Weak<EventHub>,
    client_id: ClientId,
    match_id: MatchId,
    receiver: ClientReceiver,
}

impl MatchSubscription {
    pub(crate) fn new(
        hub: Weak<EventHub>,
        client_id: ClientId,
        match_id: MatchId,
        receiver: ClientReceiver,
    ) -> Self {
        Self {
            hub,
            client_id,
            match_id,
            receiver,
        }
    }

    /// The subscribed match.
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// The hub-side client id.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Whether the hub still delivers to this subscription.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.is_connected(&self.client_id))
    }

    /// Next event, or `None` once the channel is closed and drained.
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        self.receiver.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<RealtimeEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Every event already queued, in delivery order.
    pub fn drain_pending(&mut self) -> Vec<RealtimeEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Converts the handle into a stream of events.
    pub fn into_stream(self) -> impl Stream<Item = RealtimeEvent> {
        stream::unfold(self, |mut sub| async move {
            let event = sub.recv().await?;
            Some((event, sub))
        })
    }
}

impl Drop for MatchSubscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.disconnect(&self.client_id);
        }
    }
}
