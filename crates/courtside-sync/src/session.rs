//! The scorekeeper session: the single writer of a match.
//!
//! Every action applies to local state first, unconditionally, then goes to
//! the backend. A transient failure parks it in the [`OfflineQueue`]; a
//! drain later replays the queue. Results of network calls are only applied
//! while the session is alive.

use courtside_core::{DeviceId, MatchId, PlayerId, Side};
use courtside_ledger::Action;
use courtside_match::{Alert, Applied, Match, MatchEngine, MatchRecord, RosterEntry};
use courtside_realtime::{MatchEvent, MatchSubscription, RealtimeEvent};
use courtside_rules::{ActionIntent, CoachFoulKind, FoulKind, PointValue};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::SyncConfig;
use crate::error::{BackendError, SyncError};
use crate::queue::{FailureOutcome, OfflineQueue, QueueEntry};
use crate::reconcile::{apply_delta, reconcile, ConfirmedState, DeltaOutcome, LocalOverlay};
use crate::retry::RetryPolicy;
use crate::wire::normalize;
use crate::Result;

/// Capacity of the session event channel.
const EVENT_CAPACITY: usize = 256;

/// What asked for a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainTrigger {
    /// The user asked to sync.
    Manual,
    /// The network came back.
    ConnectivityRestored,
    /// The app returned to the foreground.
    Foreground,
}

impl fmt::Display for DrainTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainTrigger::Manual => write!(f, "manual"),
            DrainTrigger::ConnectivityRestored => write!(f, "connectivity_restored"),
            DrainTrigger::Foreground => write!(f, "foreground"),
        }
    }
}

/// What one drain run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    /// What started the run.
    pub trigger: DrainTrigger,
    /// Entries the backend accepted.
    pub committed: u32,
    /// Entries the backend already held.
    pub duplicates: u32,
    /// Entries that failed and stay queued.
    pub retried: u32,
    /// Entries dropped for good.
    pub abandoned: u32,
    /// Queued submissions cancelled by a queued undo, counted per pair.
    pub cancelled: u32,
    /// Whether the run ended with a full refetch.
    pub refetched: bool,
}

impl DrainReport {
    fn new(trigger: DrainTrigger) -> Self {
        Self {
            trigger,
            committed: 0,
            duplicates: 0,
            retried: 0,
            abandoned: 0,
            cancelled: 0,
            refetched: false,
        }
    }
}

/// Sync state shown to the scorekeeper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Entries waiting in the queue.
    pub pending: usize,
    /// Entries dropped after exhausting their attempts.
    pub failed: u32,
    /// Whether the last backend call went through.
    pub online: bool,
    /// Whether a drain is running.
    pub draining: bool,
}

/// Notices for the scorekeeper's screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A rule alert raised by an applied action.
    Alert(Alert),
    /// A short confirmation of what was recorded.
    Toast(String),
    /// An action went to the offline queue.
    Queued {
        /// The queued entry.
        entry: QueueEntry,
        /// Queue length after the push.
        pending: usize,
    },
    /// An action was dropped for good.
    Abandoned {
        /// The dropped entry.
        entry: QueueEntry,
        /// The last error.
        reason: String,
    },
    /// A drain run finished.
    Drained(DrainReport),
    /// The realtime channel was reopened.
    Reconnected,
    /// Local state was rebuilt from a full refetch.
    Resynced,
}

struct LocalState {
    engine: MatchEngine,
    /// The last row the backend confirmed.
    confirmed: MatchRecord,
    /// Header fields changed locally and not yet pushed.
    dirty_header: bool,
    online: bool,
}

/// Resets the drain flag however the run ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The scorekeeper's view of one match.
pub struct ScorekeeperSession {
    match_id: MatchId,
    device: DeviceId,
    backend: Arc<dyn Backend>,
    queue: OfflineQueue,
    retry: RetryPolicy,
    refetch_after_drain: bool,
    state: RwLock<LocalState>,
    channel: Mutex<Option<MatchSubscription>>,
    alive: AtomicBool,
    draining: AtomicBool,
    status_tx: watch::Sender<SyncStatus>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl fmt::Debug for ScorekeeperSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScorekeeperSession")
            .field("match_id", &self.match_id)
            .field("device", &self.device)
            .field("pending", &self.queue.pending())
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

impl ScorekeeperSession {
    /// Opens a session for `game`.
    ///
    /// Subscribes to the match channel and refetches the authoritative
    /// state, laying anything still queued from an earlier run over it. If
    /// the backend is unreachable the session starts offline on the local
    /// copy and the queue.
    ///
    /// # Errors
    ///
    /// Non-transient backend errors, malformed backend data and queue I/O.
    pub async fn open(
        backend: Arc<dyn Backend>,
        device: DeviceId,
        queue: OfflineQueue,
        config: &SyncConfig,
        game: Match,
    ) -> Result<Arc<Self>> {
        let match_id = game.id;
        let engine = MatchEngine::new(game);
        let confirmed = engine.record();
        let (status_tx, _) = watch::channel(SyncStatus {
            pending: queue.pending(),
            failed: queue.failed(),
            online: true,
            draining: false,
        });
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let session = Arc::new(Self {
            match_id,
            device,
            backend,
            queue,
            retry: config.retry.clone(),
            refetch_after_drain: config.refetch_after_drain,
            state: RwLock::new(LocalState {
                engine,
                confirmed,
                dirty_header: false,
                online: true,
            }),
            channel: Mutex::new(None),
            alive: AtomicBool::new(true),
            draining: AtomicBool::new(false),
            status_tx,
            events_tx,
        });

        let connected = match session.reconnect().await {
            Ok(()) => session.refetch().await,
            Err(e) => Err(e),
        };
        match connected {
            Ok(()) => {}
            Err(e) if is_transient(&e) => {
                warn!(match_id = %match_id, error = %e, "Backend unreachable, starting offline");
                session.set_online(false);
                session.replay_queue()?;
            }
            Err(e) => return Err(e),
        }

        info!(
            match_id = %match_id,
            device_id = %device,
            pending = session.queue.pending(),
            "Scorekeeper session opened"
        );
        session.publish_status();
        Ok(session)
    }

    // ==================== Accessors ====================

    /// The match.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// This installation's device id.
    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// Whether the session has not been torn down.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// A snapshot of the local state machine.
    pub fn engine(&self) -> MatchEngine {
        self.state.read().engine.clone()
    }

    /// Reads the local state machine without cloning it.
    pub fn with_engine<R>(&self, f: impl FnOnce(&MatchEngine) -> R) -> R {
        f(&self.state.read().engine)
    }

    /// The local match row.
    pub fn record(&self) -> MatchRecord {
        self.state.read().engine.record()
    }

    /// Score for one side.
    pub fn score(&self, side: Side) -> u32 {
        self.state.read().engine.score(side)
    }

    /// The offline queue.
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Current sync status.
    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Follows sync status changes.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Follows session notices.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Whether the realtime channel still delivers.
    pub fn channel_open(&self) -> bool {
        self.channel.lock().as_ref().is_some_and(MatchSubscription::is_open)
    }

    /// Clears the failed total after the user has seen it.
    pub fn acknowledge_failed(&self) -> Result<u32> {
        let failed = self.queue.acknowledge_failed()?;
        self.publish_status();
        Ok(failed)
    }

    // ==================== Roster (local only) ====================

    /// Calls up a team's roster.
    pub fn call_up(&self, side: Side, entries: Vec<RosterEntry>) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.state.write().engine.call_up(side, entries)?)
    }

    /// Selects a team's starters.
    pub fn select_starters(&self, side: Side, starters: &[PlayerId]) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.state.write().engine.select_starters(side, starters)?)
    }

    /// Changes a jersey number before tip-off.
    pub fn set_jersey(&self, side: Side, player_id: &PlayerId, jersey: u8) -> Result<()> {
        self.ensure_alive()?;
        Ok(self.state.write().engine.set_jersey(side, player_id, jersey)?)
    }

    // ==================== Match operations ====================

    /// Tips off.
    pub async fn start(&self) -> Result<Applied> {
        self.apply(MatchEngine::start).await
    }

    /// Suspends with a reason.
    pub async fn suspend(&self, reason: &str) -> Result<Applied> {
        self.apply(|engine| engine.suspend(reason)).await
    }

    /// Resumes a suspended match.
    pub async fn resume(&self) -> Result<Applied> {
        self.apply(MatchEngine::resume).await
    }

    /// Ends the match.
    pub async fn finish(&self) -> Result<Applied> {
        self.apply(MatchEngine::finish).await
    }

    /// Moves to the next quarter or back to the previous one.
    pub async fn advance_quarter(&self, intent: ActionIntent) -> Result<Applied> {
        self.apply(|engine| engine.advance_quarter(intent)).await
    }

    /// Activates the final-two-minutes timeout rule.
    pub async fn activate_final_two_minutes(&self) -> Result<()> {
        self.ensure_alive()?;
        self.state.write().engine.activate_final_two_minutes()?;
        self.push_header().await?;
        self.publish_status();
        Ok(())
    }

    /// Records or takes back points.
    pub async fn record_point(
        &self,
        side: Side,
        player_id: &PlayerId,
        value: PointValue,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.apply(|engine| engine.record_point(side, player_id, value, intent))
            .await
    }

    /// Records or takes back a player foul.
    pub async fn record_foul(
        &self,
        side: Side,
        player_id: &PlayerId,
        kind: FoulKind,
        free_throws: u8,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.apply(|engine| engine.record_foul(side, player_id, kind, free_throws, intent))
            .await
    }

    /// Records or takes back a coach or bench foul.
    pub async fn record_coach_foul(
        &self,
        side: Side,
        kind: CoachFoulKind,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.apply(|engine| engine.record_coach_foul(side, kind, intent))
            .await
    }

    /// Calls or takes back a timeout.
    pub async fn call_timeout(&self, side: Side, intent: ActionIntent) -> Result<Applied> {
        self.apply(|engine| engine.call_timeout(side, intent)).await
    }

    /// Substitutes or swaps back.
    pub async fn substitute(
        &self,
        side: Side,
        entering: &PlayerId,
        leaving: &PlayerId,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.apply(|engine| engine.substitute(side, entering, leaving, intent))
            .await
    }

    /// Applies locally, then hands every resulting entry to the backend or
    /// the queue and pushes changed header fields.
    async fn apply<F>(&self, op: F) -> Result<Applied>
    where
        F: FnOnce(&mut MatchEngine) -> courtside_match::Result<Applied>,
    {
        self.ensure_alive()?;
        let applied = {
            let mut state = self.state.write();
            op(&mut state.engine)?
        };

        for alert in &applied.alerts {
            self.emit(SessionEvent::Alert(*alert));
        }
        for action in &applied.actions {
            self.emit(SessionEvent::Toast(toast(applied.intent, action)));
            let entry = match applied.intent {
                ActionIntent::Do => QueueEntry::submit(action.clone()),
                ActionIntent::Undo => QueueEntry::annul(action.clone()),
            };
            self.dispatch(entry).await?;
        }
        self.push_header().await?;
        self.publish_status();
        Ok(applied)
    }

    /// Sends an entry now, or queues it behind whatever is already waiting.
    async fn dispatch(&self, entry: QueueEntry) -> Result<()> {
        if !self.queue.is_empty() {
            return self.enqueue(entry);
        }

        let result = self.send(&entry).await;
        match result {
            Ok(()) | Err(BackendError::Duplicate(_)) => {
                self.ensure_alive()?;
                self.set_online(true);
                Ok(())
            }
            Err(e) if e.is_transient() => {
                debug!(entry = %entry, error = %e, "Submission failed, queueing");
                // The queue is durable and outlives the session.
                self.enqueue(entry)?;
                self.ensure_alive()?;
                self.set_online(false);
                Ok(())
            }
            Err(e) => {
                self.queue.record_rejected(&entry)?;
                self.ensure_alive()?;
                self.emit(SessionEvent::Abandoned {
                    entry,
                    reason: e.to_string(),
                });
                Ok(())
            }
        }
    }

    fn enqueue(&self, entry: QueueEntry) -> Result<()> {
        self.queue.push(entry.clone())?;
        let pending = self.queue.pending();
        info!(match_id = %self.match_id, action_id = %entry.action.id, pending, "Action queued");
        self.emit(SessionEvent::Queued { entry, pending });
        Ok(())
    }

    async fn send(&self, entry: &QueueEntry) -> std::result::Result<(), BackendError> {
        match entry.intent {
            ActionIntent::Do => self.backend.submit_action(&self.device, &entry.action).await,
            ActionIntent::Undo => {
                let target = entry.target.unwrap_or(entry.action.id);
                self.backend
                    .annul_action(self.match_id, target)
                    .await
                    .map(|_| ())
            }
        }
    }

    /// Pushes header fields that differ from the confirmed row. Waits while
    /// entries are queued so the backend never sees a row ahead of its
    /// ledger.
    async fn push_header(&self) -> Result<bool> {
        let patch = {
            let state = self.state.read();
            state.confirmed.diff(&state.engine.record())
        };
        if patch.is_empty() {
            return Ok(false);
        }
        if !self.queue.is_empty() {
            self.state.write().dirty_header = true;
            return Ok(false);
        }

        let result = self.backend.update_match(self.match_id, &patch).await;
        self.ensure_alive()?;
        match result {
            Ok(record) => {
                {
                    let mut state = self.state.write();
                    state.confirmed = record;
                    state.dirty_header = false;
                }
                self.set_online(true);
                Ok(true)
            }
            Err(e) if e.is_transient() => {
                debug!(match_id = %self.match_id, error = %e, "Header push failed");
                self.state.write().dirty_header = true;
                self.set_online(false);
                Ok(false)
            }
            Err(e) => {
                self.state.write().dirty_header = true;
                Err(e.into())
            }
        }
    }

    // ==================== Drain ====================

    /// Sync requested by the user.
    pub async fn sync_now(&self) -> Result<DrainReport> {
        self.drain(DrainTrigger::Manual).await
    }

    /// The network came back.
    pub async fn on_connectivity_restored(&self) -> Result<DrainReport> {
        if !self.channel_open() {
            self.resubscribe().await?;
        }
        self.drain(DrainTrigger::ConnectivityRestored).await
    }

    /// The app returned to the foreground: a closed channel means cached
    /// state may be stale, so reconnect and refetch before draining.
    pub async fn on_foreground(&self) -> Result<DrainReport> {
        self.ensure_alive()?;
        if !self.channel_open() {
            let stale = SyncError::StaleChannel(self.match_id);
            warn!(match_id = %self.match_id, "{stale}, reconnecting");
            self.resubscribe().await?;
        }
        self.drain(DrainTrigger::Foreground).await
    }

    async fn resubscribe(&self) -> Result<()> {
        self.reconnect().await?;
        self.refetch().await
    }

    /// Replays the queue against the backend. A single run never overlaps
    /// another.
    ///
    /// # Errors
    ///
    /// [`SyncError::DrainInProgress`] while another run is active,
    /// [`SyncError::TornDown`] after teardown.
    pub async fn drain(&self, trigger: DrainTrigger) -> Result<DrainReport> {
        self.ensure_alive()?;
        if self.draining.swap(true, Ordering::SeqCst) {
            debug!(match_id = %self.match_id, %trigger, "Drain already running");
            return Err(SyncError::DrainInProgress);
        }
        let result = {
            let _guard = DrainGuard(&self.draining);
            self.publish_status();
            self.drain_queue(trigger).await
        };
        self.publish_status();
        result
    }

    async fn drain_queue(&self, trigger: DrainTrigger) -> Result<DrainReport> {
        let mut report = DrainReport::new(trigger);
        info!(
            match_id = %self.match_id,
            %trigger,
            pending = self.queue.pending(),
            "Drain started"
        );

        report.cancelled = u32::try_from(self.queue.cancel_pairs()?.len()).unwrap_or(u32::MAX);

        let mut interrupted = false;
        while let Some(entry) = self.queue.front() {
            let result = self.send(&entry).await;
            self.ensure_alive()?;
            match result {
                Ok(()) => {
                    self.queue.remove(&entry.id)?;
                    report.committed += 1;
                    self.set_online(true);
                }
                Err(BackendError::Duplicate(_)) => {
                    self.queue.remove(&entry.id)?;
                    report.duplicates += 1;
                    self.set_online(true);
                }
                Err(e) if e.is_transient() => {
                    self.set_online(false);
                    match self.queue.record_failure(&entry.id)? {
                        Some(FailureOutcome::Abandoned(entry)) => {
                            report.abandoned += 1;
                            self.emit(SessionEvent::Abandoned {
                                entry,
                                reason: e.to_string(),
                            });
                        }
                        Some(FailureOutcome::Retry(attempts)) => {
                            debug!(action_id = %entry.action.id, attempts, "Drain attempt failed");
                            report.retried += 1;
                        }
                        None => {}
                    }
                    interrupted = true;
                    break;
                }
                Err(e) => {
                    if let Some(entry) = self.queue.abandon(&entry.id)? {
                        report.abandoned += 1;
                        self.emit(SessionEvent::Abandoned {
                            entry,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        if !interrupted {
            // Refetch first so abandoned entries drop out of the pushed row.
            if self.refetch_after_drain {
                match self.refetch().await {
                    Ok(()) => report.refetched = true,
                    Err(e) if is_transient(&e) => self.set_online(false),
                    Err(e) => return Err(e),
                }
            }
            self.push_header().await?;
        }

        info!(
            match_id = %self.match_id,
            %trigger,
            committed = report.committed,
            duplicates = report.duplicates,
            retried = report.retried,
            abandoned = report.abandoned,
            cancelled = report.cancelled,
            pending = self.queue.pending(),
            "Drain finished"
        );
        self.emit(SessionEvent::Drained(report.clone()));
        Ok(report)
    }

    // ==================== Realtime and refetch ====================

    /// Opens the realtime channel, backing off between attempts.
    async fn reconnect(&self) -> Result<()> {
        let subscription = self
            .retry
            .execute(|| self.backend.subscribe(self.match_id), BackendError::is_transient)
            .await?;
        self.ensure_alive()?;
        *self.channel.lock() = Some(subscription);
        info!(match_id = %self.match_id, "Realtime channel connected");
        self.emit(SessionEvent::Reconnected);
        Ok(())
    }

    /// Rebuilds local state from the backend's copy with the queue laid
    /// over it.
    pub async fn refetch(&self) -> Result<()> {
        self.ensure_alive()?;
        let wire = self.backend.fetch_match(self.match_id).await?;
        let actions = self.backend.fetch_actions(self.match_id).await?;
        self.ensure_alive()?;

        let fetched = normalize(wire)?;
        let entries = self.queue.entries();
        {
            let mut state = self.state.write();
            let local = state.engine.record();
            let overlay = LocalOverlay {
                entries: &entries,
                header: state.dirty_header.then_some(&local),
            };
            let merged = reconcile(
                &ConfirmedState {
                    record: fetched.record.clone(),
                    actions,
                },
                &overlay,
            );
            state.engine.replace_ledger(merged.actions)?;
            state.engine.adopt_record(&merged.header);
            state.confirmed = fetched.record;
            state.online = true;
        }
        info!(match_id = %self.match_id, pending = entries.len(), "State refetched");
        self.emit(SessionEvent::Resynced);
        self.publish_status();
        Ok(())
    }

    /// Applies whatever the realtime channel has delivered.
    pub fn pump_realtime(&self) -> Result<usize> {
        self.ensure_alive()?;
        let events = match self.channel.lock().as_mut() {
            Some(subscription) => subscription.drain_pending(),
            None => Vec::new(),
        };
        for event in &events {
            self.apply_event(event)?;
        }
        Ok(events.len())
    }

    fn apply_event(&self, event: &RealtimeEvent) -> Result<()> {
        let quiet = self.queue.is_empty();
        let mut state = self.state.write();
        match &event.event {
            MatchEvent::MatchDelta(patch) => {
                let outcome = apply_delta(&mut state.confirmed, patch);
                // Local header edits that are still unpushed win.
                if outcome == DeltaOutcome::Applied && quiet && !state.dirty_header {
                    let confirmed = state.confirmed.clone();
                    state.engine.adopt_record(&confirmed);
                }
            }
            MatchEvent::ActionInserted(action) | MatchEvent::ActionUpdated(action) => {
                let outcome = state.engine.merge_remote(action.clone())?;
                debug!(action_id = %action.id, ?outcome, "Remote entry merged");
            }
        }
        Ok(())
    }

    /// Pumps the realtime channel every `period` until teardown.
    pub fn spawn_listener(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            while session.is_alive() {
                ticker.tick().await;
                if let Err(e) = session.pump_realtime() {
                    debug!(error = %e, "Realtime listener stopped");
                    break;
                }
            }
        })
    }

    /// Stops the session: in-flight calls will not touch local state, and
    /// the realtime channel is released.
    pub fn teardown(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.channel.lock().take();
            info!(match_id = %self.match_id, "Scorekeeper session torn down");
        }
    }

    // ==================== Internals ====================

    /// Lays queued work from an earlier run over the local copy.
    fn replay_queue(&self) -> Result<()> {
        let entries = self.queue.entries();
        if entries.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write();
        let base = ConfirmedState {
            record: state.engine.record(),
            actions: state.engine.ledger().iter().cloned().collect(),
        };
        let merged = reconcile(
            &base,
            &LocalOverlay {
                entries: &entries,
                header: None,
            },
        );
        state.engine.replace_ledger(merged.actions)?;
        info!(match_id = %self.match_id, pending = entries.len(), "Queued actions replayed locally");
        Ok(())
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(SyncError::TornDown)
        }
    }

    fn set_online(&self, online: bool) {
        let changed = {
            let mut state = self.state.write();
            std::mem::replace(&mut state.online, online) != online
        };
        if changed {
            info!(match_id = %self.match_id, online, "Connectivity changed");
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        let status = SyncStatus {
            pending: self.queue.pending(),
            failed: self.queue.failed(),
            online: self.state.read().online,
            draining: self.draining.load(Ordering::SeqCst),
        };
        self.status_tx.send_if_modified(|current| {
            let modified = *current != status;
            *current = status;
            modified
        });
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events_tx.send(event);
    }
}

fn is_transient(err: &SyncError) -> bool {
    matches!(err, SyncError::Backend(e) if e.is_transient())
}

fn toast(intent: ActionIntent, action: &Action) -> String {
    let tag = action.kind.tag();
    match (intent, action.score) {
        (ActionIntent::Do, Some(score)) => format!("{tag} recorded ({score})"),
        (ActionIntent::Do, None) => format!("{tag} recorded"),
        (ActionIntent::Undo, _) => format!("{tag} taken back"),
    }
}
