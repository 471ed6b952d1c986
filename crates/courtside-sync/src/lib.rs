//! Offline-first synchronization for Courtside.
//!
//! A [`ScorekeeperSession`] is the single writer of a match: every action is
//! applied locally first, then submitted to a [`Backend`]. Submissions that
//! fail transiently wait in a durable [`OfflineQueue`] and are replayed in
//! order by a drain, triggered manually, when connectivity returns or when
//! the app comes back to the foreground. Action ids double as idempotency
//! keys, so a submission whose reply was lost is recognized on replay.
//!
//! A [`SpectatorSession`] only reads: it loads the match and then applies
//! whatever the realtime channel delivers.
//!
//! # Example
//!
//! ```
//! use courtside_core::{DeviceId, MatchId, TeamId};
//! use courtside_match::{Match, TeamSheet};
//! use courtside_sync::{InMemoryBackend, OfflineQueue, ScorekeeperSession, SyncConfig};
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! # rt.block_on(async {
//! let game = Match::new(
//!     MatchId::generate(),
//!     TeamSheet::new(TeamId::generate(), "Lions"),
//!     TeamSheet::new(TeamId::generate(), "Tigers"),
//! );
//! let backend = Arc::new(InMemoryBackend::new());
//! backend.register_match(&game);
//!
//! let session = ScorekeeperSession::open(
//!     backend,
//!     DeviceId::generate(),
//!     OfflineQueue::in_memory(5),
//!     &SyncConfig::default(),
//!     game,
//! )
//! .await
//! .unwrap();
//! assert!(session.queue().is_empty());
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod memory;
pub mod queue;
pub mod reconcile;
pub mod retry;
pub mod session;
pub mod spectator;
pub mod wire;

pub use backend::{Backend, BackendResult};
pub use config::{SyncConfig, DEFAULT_RETRY_CEILING};
pub use device::load_or_create_device_id;
pub use error::{BackendError, SyncError};
pub use memory::{BackendStats, InMemoryBackend};
pub use queue::{
    FailureOutcome, FileQueueStore, MemoryQueueStore, OfflineQueue, QueueEntry, QueueSnapshot,
    QueueStore,
};
pub use reconcile::{apply_delta, reconcile, ConfirmedState, DeltaOutcome, LocalOverlay, Reconciled};
pub use retry::RetryPolicy;
pub use session::{DrainReport, DrainTrigger, ScorekeeperSession, SessionEvent, SyncStatus};
pub use spectator::SpectatorSession;
pub use wire::{normalize, FetchedMatch, OneOrMany, WireMatch, WireTeam};

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
