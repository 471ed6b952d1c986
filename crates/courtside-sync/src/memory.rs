//! An in-process reference backend.
//!
//! Holds match rows and ledgers behind a lock, deduplicates submissions by
//! action id, publishes every change through an [`EventHub`] and can be
//! switched offline to exercise the queue.

use async_trait::async_trait;
use courtside_core::{ActionId, DeviceId, MatchId, Timestamp};
use courtside_ledger::Action;
use courtside_match::{Match, MatchPatch, MatchRecord};
use courtside_realtime::{EventHub, MatchSubscription};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backend::{Backend, BackendResult};
use crate::error::BackendError;
use crate::wire::{OneOrMany, WireMatch, WireTeam};

#[derive(Debug)]
struct StoredMatch {
    record: MatchRecord,
    home: WireTeam,
    away: WireTeam,
    actions: Vec<Action>,
    index: HashMap<ActionId, usize>,
    submitted_by: HashMap<ActionId, DeviceId>,
}

/// Counters for tests and the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Entries committed.
    pub committed: u64,
    /// Resubmissions refused as duplicates.
    pub duplicates: u64,
    /// Requests refused while offline.
    pub refused_offline: u64,
    /// Match header writes.
    pub header_writes: u64,
}

/// A backend kept in memory.
#[derive(Debug)]
pub struct InMemoryBackend {
    matches: RwLock<HashMap<MatchId, StoredMatch>>,
    hub: Arc<EventHub>,
    online: AtomicBool,
    lost_acks: AtomicUsize,
    stats: RwLock<BackendStats>,
}

impl InMemoryBackend {
    /// An empty, online backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            matches: RwLock::new(HashMap::new()),
            hub: Arc::new(EventHub::new()),
            online: AtomicBool::new(true),
            lost_acks: AtomicUsize::new(0),
            stats: RwLock::new(BackendStats::default()),
        }
    }

    /// Schedules a match, as the external scheduling flow would.
    pub fn register_match(&self, game: &Match) {
        let stored = StoredMatch {
            record: MatchRecord {
                id: game.id,
                state: game.state,
                quarter: game.quarter,
                ..MatchRecord::scheduled(game.id)
            },
            home: WireTeam::from_sheet(&game.home),
            away: WireTeam::from_sheet(&game.away),
            actions: Vec::new(),
            index: HashMap::new(),
            submitted_by: HashMap::new(),
        };
        self.matches.write().insert(game.id, stored);
        info!(match_id = %game.id, "Match registered");
    }

    /// The realtime hub.
    #[must_use]
    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    /// Whether requests currently go through.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Switches connectivity. Going offline drops every realtime client.
    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was && !online {
            let dropped = self.hub.disconnect_all();
            info!(dropped, "Backend offline");
        } else if !was && online {
            info!("Backend online");
        }
    }

    /// The next `n` submissions are committed but answered as if the
    /// connection dropped before the reply.
    pub fn lose_next_acks(&self, n: usize) {
        self.lost_acks.store(n, Ordering::SeqCst);
    }

    /// Request counters.
    #[must_use]
    pub fn stats(&self) -> BackendStats {
        *self.stats.read()
    }

    /// The committed ledger of a match, in commit order.
    #[must_use]
    pub fn actions(&self, match_id: &MatchId) -> Vec<Action> {
        self.matches
            .read()
            .get(match_id)
            .map(|m| m.actions.clone())
            .unwrap_or_default()
    }

    /// The stored match row.
    #[must_use]
    pub fn record(&self, match_id: &MatchId) -> Option<MatchRecord> {
        self.matches.read().get(match_id).map(|m| m.record.clone())
    }

    /// Which device submitted an entry.
    #[must_use]
    pub fn submitted_by(&self, match_id: &MatchId, action_id: &ActionId) -> Option<DeviceId> {
        self.matches
            .read()
            .get(match_id)
            .and_then(|m| m.submitted_by.get(action_id).copied())
    }

    fn ensure_online(&self) -> BackendResult<()> {
        if self.is_online() {
            return Ok(());
        }
        self.stats.write().refused_offline += 1;
        Err(BackendError::Transient("network unreachable".to_string()))
    }

    fn take_lost_ack(&self) -> bool {
        self.lost_acks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn submit_action(&self, device: &DeviceId, action: &Action) -> BackendResult<()> {
        self.ensure_online()?;
        {
            let mut matches = self.matches.write();
            let stored = matches
                .get_mut(&action.match_id)
                .ok_or(BackendError::MatchNotFound(action.match_id))?;
            if stored.index.contains_key(&action.id) {
                drop(matches);
                self.stats.write().duplicates += 1;
                debug!(action_id = %action.id, "Duplicate submission refused");
                return Err(BackendError::Duplicate(action.id));
            }
            stored.index.insert(action.id, stored.actions.len());
            stored.actions.push(action.clone());
            stored.submitted_by.insert(action.id, *device);
        }
        self.stats.write().committed += 1;
        debug!(action_id = %action.id, device_id = %device, "Action committed");
        self.hub.publish_inserted(action.clone());

        if self.take_lost_ack() {
            return Err(BackendError::Transient("connection reset before reply".to_string()));
        }
        Ok(())
    }

    async fn annul_action(&self, match_id: MatchId, action_id: ActionId) -> BackendResult<Action> {
        self.ensure_online()?;
        let (annulled, changed) = {
            let mut matches = self.matches.write();
            let stored = matches
                .get_mut(&match_id)
                .ok_or(BackendError::MatchNotFound(match_id))?;
            let &i = stored
                .index
                .get(&action_id)
                .ok_or(BackendError::ActionNotFound(action_id))?;
            let entry = &mut stored.actions[i];
            let changed = !entry.annulled;
            entry.annulled = true;
            (entry.clone(), changed)
        };
        if changed {
            debug!(action_id = %action_id, "Action annulled");
            self.hub.publish_updated(annulled.clone());
        }
        Ok(annulled)
    }

    async fn update_match(
        &self,
        match_id: MatchId,
        patch: &MatchPatch,
    ) -> BackendResult<MatchRecord> {
        self.ensure_online()?;
        let mut patch = patch.clone();
        let record = {
            let mut matches = self.matches.write();
            let stored = matches
                .get_mut(&match_id)
                .ok_or(BackendError::MatchNotFound(match_id))?;
            // Row versions strictly increase, even within one millisecond.
            let at = Timestamp::now().max(stored.record.updated_at.plus_millis(1));
            patch.updated_at = Some(at);
            stored.record.apply(&patch);
            stored.record.clone()
        };
        self.stats.write().header_writes += 1;
        debug!(match_id = %match_id, state = %record.state, quarter = record.quarter, "Match row updated");
        self.hub.publish_delta(match_id, patch);
        Ok(record)
    }

    async fn fetch_match(&self, match_id: MatchId) -> BackendResult<WireMatch> {
        self.ensure_online()?;
        let matches = self.matches.read();
        let stored = matches
            .get(&match_id)
            .ok_or(BackendError::MatchNotFound(match_id))?;
        // Joined relations come back as arrays.
        Ok(WireMatch {
            record: stored.record.clone(),
            home_team: OneOrMany::Many(vec![stored.home.clone()]),
            away_team: OneOrMany::Many(vec![stored.away.clone()]),
        })
    }

    async fn fetch_actions(&self, match_id: MatchId) -> BackendResult<Vec<Action>> {
        self.ensure_online()?;
        let matches = self.matches.read();
        let stored = matches
            .get(&match_id)
            .ok_or(BackendError::MatchNotFound(match_id))?;
        let mut actions = stored.actions.clone();
        actions.sort_by_key(|a| a.recorded_at);
        Ok(actions)
    }

    async fn subscribe(&self, match_id: MatchId) -> BackendResult<MatchSubscription> {
        self.ensure_online()?;
        if !self.matches.read().contains_key(&match_id) {
            return Err(BackendError::MatchNotFound(match_id));
        }
        self.hub
            .subscribe_match(match_id)
            .map_err(|e| BackendError::Transient(e.to_string()))
    }
}
