//! Shared fixtures for the sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use courtside_core::{ActionId, DeviceId, MatchId, PlayerId, Side, TeamId};
use courtside_ledger::{Action, ActionKind};
use courtside_match::{Match, MatchPatch, MatchRecord, RosterEntry, TeamSheet};
use courtside_realtime::MatchSubscription;
use courtside_sync::{
    Backend, BackendResult, InMemoryBackend, OfflineQueue, RetryPolicy, ScorekeeperSession,
    SyncConfig, WireMatch,
};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Match fixture
// ============================================================================

/// A scheduled match registered with an in-memory backend.
pub struct Fixture {
    pub backend: Arc<InMemoryBackend>,
    pub match_id: MatchId,
    pub home: Vec<PlayerId>,
    pub away: Vec<PlayerId>,
    game: Match,
}

impl Fixture {
    pub fn new() -> Self {
        let mut home = TeamSheet::new(TeamId::generate(), "Harbour Lions");
        let mut away = TeamSheet::new(TeamId::generate(), "Valley Hawks");
        let home_ids = call_up(&mut home);
        let away_ids = call_up(&mut away);

        let game = Match::new(MatchId::generate(), home, away);
        let backend = Arc::new(InMemoryBackend::new());
        backend.register_match(&game);

        Self {
            backend,
            match_id: game.id,
            home: home_ids,
            away: away_ids,
            game,
        }
    }

    /// A fresh local copy of the scheduled match.
    pub fn game(&self) -> Match {
        self.game.clone()
    }

    pub fn team_id(&self, side: Side) -> TeamId {
        self.game.team(side).team_id
    }

    pub fn player(&self, side: Side, n: usize) -> PlayerId {
        match side {
            Side::Home => self.home[n],
            Side::Away => self.away[n],
        }
    }

    pub async fn open(&self, queue: OfflineQueue) -> Arc<ScorekeeperSession> {
        self.open_on(self.backend.clone(), queue).await
    }

    pub async fn open_on(
        &self,
        backend: Arc<dyn Backend>,
        queue: OfflineQueue,
    ) -> Arc<ScorekeeperSession> {
        ScorekeeperSession::open(backend, DeviceId::generate(), queue, &config(), self.game())
            .await
            .unwrap()
    }

    /// An opened and tipped-off session with an unpersisted queue.
    pub async fn started(&self) -> Arc<ScorekeeperSession> {
        let session = self.open(OfflineQueue::in_memory(5)).await;
        session.start().await.unwrap();
        session
    }

    /// Points entries on the backend, in commit order.
    pub fn committed_points(&self) -> Vec<Action> {
        self.backend
            .actions(&self.match_id)
            .into_iter()
            .filter(|a| matches!(a.kind, ActionKind::Point { .. }))
            .collect()
    }

    pub fn backend_record(&self) -> MatchRecord {
        self.backend.record(&self.match_id).unwrap()
    }
}

fn call_up(sheet: &mut TeamSheet) -> Vec<PlayerId> {
    let entries: Vec<RosterEntry> = (0..8)
        .map(|n| RosterEntry::new(PlayerId::generate(), format!("{} #{n}", sheet.name), n + 4))
        .collect();
    let ids: Vec<PlayerId> = entries.iter().map(|e| e.player_id).collect();
    sheet.call_up(entries).unwrap();
    sheet.select_starters(&ids[..5]).unwrap();
    ids
}

/// No backoff between attempts, so tests never sleep on retries.
pub fn config() -> SyncConfig {
    SyncConfig {
        retry: RetryPolicy::no_retry(),
        ..SyncConfig::default()
    }
}

// ============================================================================
// Slow backend
// ============================================================================

/// Delays every ledger and header write, to hold a call in flight.
pub struct SlowBackend {
    pub inner: Arc<InMemoryBackend>,
    pub delay: Duration,
}

#[async_trait]
impl Backend for SlowBackend {
    async fn submit_action(&self, device: &DeviceId, action: &Action) -> BackendResult<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.submit_action(device, action).await
    }

    async fn annul_action(&self, match_id: MatchId, action_id: ActionId) -> BackendResult<Action> {
        tokio::time::sleep(self.delay).await;
        self.inner.annul_action(match_id, action_id).await
    }

    async fn update_match(
        &self,
        match_id: MatchId,
        patch: &MatchPatch,
    ) -> BackendResult<MatchRecord> {
        tokio::time::sleep(self.delay).await;
        self.inner.update_match(match_id, patch).await
    }

    async fn fetch_match(&self, match_id: MatchId) -> BackendResult<WireMatch> {
        self.inner.fetch_match(match_id).await
    }

    async fn fetch_actions(&self, match_id: MatchId) -> BackendResult<Vec<Action>> {
        self.inner.fetch_actions(match_id).await
    }

    async fn subscribe(&self, match_id: MatchId) -> BackendResult<MatchSubscription> {
        self.inner.subscribe(match_id).await
    }
}
