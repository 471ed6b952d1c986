//! Read-only sessions for spectators.

use courtside_core::{MatchId, Side};
use courtside_ledger::Ledger;
use courtside_match::{Match, MatchEngine, MatchError, MatchRecord};
use courtside_realtime::{MatchEvent, MatchSubscription};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{BackendError, SyncError};
use crate::reconcile::apply_delta;
use crate::retry::RetryPolicy;
use crate::wire::normalize;
use crate::Result;

struct View {
    engine: MatchEngine,
    record: MatchRecord,
}

/// A pure reader: applies every delta the channel delivers.
pub struct SpectatorSession {
    match_id: MatchId,
    backend: Arc<dyn Backend>,
    retry: RetryPolicy,
    view: RwLock<View>,
    channel: Mutex<Option<MatchSubscription>>,
    alive: AtomicBool,
}

impl std::fmt::Debug for SpectatorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectatorSession")
            .field("match_id", &self.match_id)
            .field("alive", &self.alive.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SpectatorSession {
    /// Subscribes, then loads the match. Subscribing first means nothing
    /// published during the fetch is missed.
    ///
    /// # Errors
    ///
    /// Backend errors and malformed backend data.
    pub async fn open(
        backend: Arc<dyn Backend>,
        match_id: MatchId,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let subscription = retry
            .execute(|| backend.subscribe(match_id), BackendError::is_transient)
            .await?;
        let view = load(backend.as_ref(), match_id).await?;
        info!(match_id = %match_id, "Spectator session opened");
        Ok(Self {
            match_id,
            backend,
            retry,
            view: RwLock::new(view),
            channel: Mutex::new(Some(subscription)),
            alive: AtomicBool::new(true),
        })
    }

    /// The match row as last delivered.
    pub fn record(&self) -> MatchRecord {
        self.view.read().record.clone()
    }

    /// Score for one side, from the match row.
    pub fn score(&self, side: Side) -> u32 {
        self.view.read().record.score(side)
    }

    /// A snapshot of the replicated state machine, for box scores.
    pub fn engine(&self) -> MatchEngine {
        self.view.read().engine.clone()
    }

    /// Whether the realtime channel still delivers.
    pub fn channel_open(&self) -> bool {
        self.channel.lock().as_ref().is_some_and(MatchSubscription::is_open)
    }

    /// Applies everything the channel has delivered.
    pub fn pump(&self) -> Result<usize> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(SyncError::TornDown);
        }
        let events = match self.channel.lock().as_mut() {
            Some(subscription) => subscription.drain_pending(),
            None => Vec::new(),
        };
        let mut view = self.view.write();
        for event in &events {
            match &event.event {
                MatchEvent::MatchDelta(patch) => {
                    let outcome = apply_delta(&mut view.record, patch);
                    debug!(match_id = %self.match_id, ?outcome, "Delta applied");
                    let record = view.record.clone();
                    view.engine.adopt_record(&record);
                }
                MatchEvent::ActionInserted(action) | MatchEvent::ActionUpdated(action) => {
                    view.engine.merge_remote(action.clone())?;
                }
            }
        }
        Ok(events.len())
    }

    /// On returning to the foreground, a closed channel is reopened and the
    /// match reloaded from scratch.
    ///
    /// Returns whether a reload happened.
    pub async fn on_foreground(&self) -> Result<bool> {
        if self.channel_open() {
            return Ok(false);
        }
        warn!(match_id = %self.match_id, "Spectator channel stale, reloading");
        let subscription = self
            .retry
            .execute(|| self.backend.subscribe(self.match_id), BackendError::is_transient)
            .await?;
        let view = load(self.backend.as_ref(), self.match_id).await?;
        if !self.alive.load(Ordering::SeqCst) {
            return Err(SyncError::TornDown);
        }
        *self.channel.lock() = Some(subscription);
        *self.view.write() = view;
        Ok(true)
    }

    /// Releases the channel.
    pub fn teardown(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.channel.lock().take();
            debug!(match_id = %self.match_id, "Spectator session torn down");
        }
    }
}

async fn load(backend: &dyn Backend, match_id: MatchId) -> Result<View> {
    let fetched = normalize(backend.fetch_match(match_id).await?)?;
    let actions = backend.fetch_actions(match_id).await?;

    let ledger = Ledger::from_actions(match_id, actions).map_err(MatchError::from)?;
    let mut game = Match::new(match_id, fetched.home, fetched.away);
    game.adopt(&fetched.record);
    let engine = MatchEngine::restore(game, ledger)?;
    Ok(View {
        engine,
        record: fetched.record,
    })
}
