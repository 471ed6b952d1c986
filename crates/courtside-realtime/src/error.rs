//! Error types for the realtime channel.

use thiserror::Error;

/// Errors that can occur in realtime operations.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Too many connected clients.
    #[error("connection limit reached: max {0} clients")]
    ConnectionLimit(usize),

    /// The client fell too far behind and was dropped.
    #[error("client lagged: more than {0} undelivered events")]
    Lagged(usize),

    /// The hub or the client's channel has gone away.
    #[error("channel closed")]
    ChannelClosed,
}
