//! The durable offline queue.
//!
//! Every action the backend has not acknowledged waits here. An entry is
//! pending until a drain commits it (removed), fails transiently (retry
//! count bumped, back to pending) or runs out of attempts (removed and
//! counted as failed).
//!
//! On disk each device keeps two keys: `<namespace>.<device>.queue.json`,
//! an array of flat entries
//! `{ id, matchId, teamId, playerId, kind, quarter, isDecrement, timestamp, retryCount }`,
//! and `<namespace>.<device>.failed.json`, the failed total.

use courtside_core::{ActionId, DeviceId, MatchId, PlayerId, TeamId, Timestamp};
use courtside_ledger::{Action, ActionKind, ScoreSnapshot};
use courtside_rules::ActionIntent;
use parking_lot::{Mutex, RwLock};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::Result;

/// A not-yet-committed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredEntry", from = "StoredEntry")]
pub struct QueueEntry {
    /// Entry id. For [`ActionIntent::Do`] this is the action's own id, so the
    /// backend deduplicates resubmissions.
    pub id: ActionId,
    /// The action as recorded locally.
    pub action: Action,
    /// Submit (`Do`) or annul (`Undo`).
    pub intent: ActionIntent,
    /// The entry an undo annuls.
    pub target: Option<ActionId>,
    /// Failed drain attempts so far.
    pub retry_count: u32,
}

impl QueueEntry {
    /// An entry that submits `action`.
    #[must_use]
    pub fn submit(action: Action) -> Self {
        Self {
            id: action.id,
            action,
            intent: ActionIntent::Do,
            target: None,
            retry_count: 0,
        }
    }

    /// A compensating entry that annuls `action` once connectivity returns.
    #[must_use]
    pub fn annul(action: Action) -> Self {
        Self {
            id: ActionId::generate(),
            target: Some(action.id),
            action,
            intent: ActionIntent::Undo,
            retry_count: 0,
        }
    }

    /// Match the entry belongs to.
    #[must_use]
    pub fn match_id(&self) -> MatchId {
        self.action.match_id
    }
}

impl fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.intent.is_undo() { "annul" } else { "submit" };
        write!(
            f,
            "{verb} {} q{} ({}, {} retries)",
            self.action.kind.tag(),
            self.action.quarter,
            self.action.id,
            self.retry_count
        )
    }
}

/// The persisted shape of a [`QueueEntry`]: the action's fields inlined,
/// with the intent as a flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    id: ActionId,
    match_id: MatchId,
    team_id: Option<TeamId>,
    player_id: Option<PlayerId>,
    kind: ActionKind,
    quarter: u8,
    is_decrement: bool,
    timestamp: Timestamp,
    #[serde(default)]
    retry_count: u32,
    /// Undo entries only: the action to annul.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<ActionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<ScoreSnapshot>,
}

impl From<QueueEntry> for StoredEntry {
    fn from(entry: QueueEntry) -> Self {
        let action = entry.action;
        Self {
            id: entry.id,
            match_id: action.match_id,
            team_id: action.team_id,
            player_id: action.player_id,
            kind: action.kind,
            quarter: action.quarter,
            is_decrement: entry.intent.is_undo(),
            timestamp: action.recorded_at,
            retry_count: entry.retry_count,
            target: entry.target,
            score: action.score,
        }
    }
}

impl From<StoredEntry> for QueueEntry {
    fn from(stored: StoredEntry) -> Self {
        let intent = if stored.is_decrement {
            ActionIntent::Undo
        } else {
            ActionIntent::Do
        };
        let action = Action {
            id: stored.target.unwrap_or(stored.id),
            match_id: stored.match_id,
            team_id: stored.team_id,
            player_id: stored.player_id,
            quarter: stored.quarter,
            kind: stored.kind,
            recorded_at: stored.timestamp,
            annulled: stored.is_decrement,
            score: stored.score,
        };
        Self {
            id: stored.id,
            action,
            intent,
            target: stored.target,
            retry_count: stored.retry_count,
        }
    }
}

/// Everything persisted for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Pending entries in submission order.
    pub entries: Vec<QueueEntry>,
    /// Entries dropped after exhausting their attempts.
    pub failed: u32,
}

/// Where the queue is persisted.
pub trait QueueStore: Send + Sync + fmt::Debug {
    /// Reads the persisted queue; an absent store reads as empty.
    fn load(&self) -> Result<QueueSnapshot>;

    /// Replaces the persisted queue.
    fn save(&self, snapshot: &QueueSnapshot) -> Result<()>;
}

/// JSON files named `<namespace>.<device>.queue.json` and
/// `<namespace>.<device>.failed.json`.
#[derive(Debug, Clone)]
pub struct FileQueueStore {
    path: PathBuf,
    failed_path: PathBuf,
}

impl FileQueueStore {
    /// The store for one device inside `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path, namespace: &str, device: &DeviceId) -> Self {
        Self {
            path: data_dir.join(format!("{namespace}.{device}.queue.json")),
            failed_path: data_dir.join(format!("{namespace}.{device}.failed.json")),
        }
    }

    /// The file holding the pending entries.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file holding the failed total.
    #[must_use]
    pub fn failed_path(&self) -> &Path {
        &self.failed_path
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Write then rename so a crash never leaves a torn file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl QueueStore for FileQueueStore {
    fn load(&self) -> Result<QueueSnapshot> {
        Ok(QueueSnapshot {
            entries: read_json(&self.path)?,
            failed: read_json(&self.failed_path)?,
        })
    }

    fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        write_json(&self.path, snapshot.entries.as_slice())?;
        write_json(&self.failed_path, &snapshot.failed)
    }
}

/// A store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryQueueStore {
    snapshot: Mutex<QueueSnapshot>,
}

impl MemoryQueueStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> Result<QueueSnapshot> {
        Ok(self.snapshot.lock().clone())
    }

    fn save(&self, snapshot: &QueueSnapshot) -> Result<()> {
        *self.snapshot.lock() = snapshot.clone();
        Ok(())
    }
}

/// What a failed attempt did to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Back to pending with this many failed attempts.
    Retry(u32),
    /// Dropped; counted toward the failed total.
    Abandoned(QueueEntry),
}

/// The in-memory view of a [`QueueStore`]; every change is written through.
#[derive(Debug)]
pub struct OfflineQueue {
    store: Box<dyn QueueStore>,
    state: RwLock<QueueSnapshot>,
    ceiling: u32,
}

impl OfflineQueue {
    /// Opens the queue, loading whatever survived the last run.
    ///
    /// # Errors
    ///
    /// I/O or deserialization failures of the store.
    pub fn open(store: Box<dyn QueueStore>, ceiling: u32) -> Result<Self> {
        let snapshot = store.load()?;
        if !snapshot.entries.is_empty() {
            info!(pending = snapshot.entries.len(), failed = snapshot.failed, "Offline queue restored");
        }
        Ok(Self {
            store,
            state: RwLock::new(snapshot),
            ceiling: ceiling.max(1),
        })
    }

    /// An unpersisted queue.
    #[must_use]
    pub fn in_memory(ceiling: u32) -> Self {
        Self {
            store: Box::new(MemoryQueueStore::new()),
            state: RwLock::new(QueueSnapshot::default()),
            ceiling: ceiling.max(1),
        }
    }

    /// Attempts before an entry is abandoned.
    #[must_use]
    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }

    /// Entries waiting to be committed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Entries dropped after exhausting their attempts.
    #[must_use]
    pub fn failed(&self) -> u32 {
        self.state.read().failed
    }

    /// A copy of the pending entries in order.
    #[must_use]
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.state.read().entries.clone()
    }

    /// The oldest pending entry.
    #[must_use]
    pub fn front(&self) -> Option<QueueEntry> {
        self.state.read().entries.first().cloned()
    }

    /// Whether a submission of `action_id` is still waiting.
    #[must_use]
    pub fn holds_submission(&self, action_id: &ActionId) -> bool {
        self.state
            .read()
            .entries
            .iter()
            .any(|e| e.intent == ActionIntent::Do && &e.id == action_id)
    }

    /// Appends an entry.
    pub fn push(&self, entry: QueueEntry) -> Result<()> {
        self.mutate(|state| {
            debug!(entry = %entry, "Entry queued");
            state.entries.push(entry);
        })
    }

    /// Removes an entry after it committed.
    pub fn remove(&self, id: &ActionId) -> Result<Option<QueueEntry>> {
        self.mutate(|state| {
            let index = state.entries.iter().position(|e| &e.id == id)?;
            Some(state.entries.remove(index))
        })
    }

    /// Counts a failed attempt, abandoning the entry at the ceiling.
    pub fn record_failure(&self, id: &ActionId) -> Result<Option<FailureOutcome>> {
        let ceiling = self.ceiling;
        self.mutate(|state| {
            let index = state.entries.iter().position(|e| &e.id == id)?;
            let entry = &mut state.entries[index];
            entry.retry_count += 1;
            if entry.retry_count < ceiling {
                return Some(FailureOutcome::Retry(entry.retry_count));
            }
            let entry = state.entries.remove(index);
            state.failed += 1;
            warn!(entry = %entry, "Entry abandoned at retry ceiling");
            Some(FailureOutcome::Abandoned(entry))
        })
    }

    /// Drops an entry the backend refused for good; counted as failed.
    pub fn abandon(&self, id: &ActionId) -> Result<Option<QueueEntry>> {
        self.mutate(|state| {
            let index = state.entries.iter().position(|e| &e.id == id)?;
            let entry = state.entries.remove(index);
            state.failed += 1;
            warn!(entry = %entry, "Entry abandoned");
            Some(entry)
        })
    }

    /// Removes every undo whose target submission is still queued, together
    /// with that submission. Neither needs to reach the backend.
    pub fn cancel_pairs(&self) -> Result<Vec<(QueueEntry, QueueEntry)>> {
        self.mutate(|state| {
            let mut pairs = Vec::new();
            while let Some((undo_at, do_at)) = find_pair(&state.entries) {
                // The submission always precedes its undo.
                let undo = state.entries.remove(undo_at);
                let submit = state.entries.remove(do_at);
                debug!(action_id = %submit.id, "Queued submission cancelled by its undo");
                pairs.push((submit, undo));
            }
            pairs
        })
    }

    /// Counts an entry the backend refused on its first, unqueued attempt.
    pub fn record_rejected(&self, entry: &QueueEntry) -> Result<()> {
        self.mutate(|state| {
            state.failed += 1;
            warn!(entry = %entry, "Submission rejected");
        })
    }

    /// Resets the failed total once the user has seen it.
    pub fn acknowledge_failed(&self) -> Result<u32> {
        self.mutate(|state| std::mem::take(&mut state.failed))
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut QueueSnapshot) -> T) -> Result<T> {
        let mut state = self.state.write();
        let out = f(&mut state);
        self.store.save(&state)?;
        Ok(out)
    }
}

fn find_pair(entries: &[QueueEntry]) -> Option<(usize, usize)> {
    entries.iter().enumerate().find_map(|(undo_at, undo)| {
        let target = undo.target?;
        let do_at = entries[..undo_at]
            .iter()
            .position(|e| e.intent == ActionIntent::Do && e.id == target)?;
        Some((undo_at, do_at))
    })
}
