//! Merging confirmed backend state with local, unconfirmed work.
//!
//! The backend's copy is the confirmed base. Whatever the device recorded
//! but the backend has not acknowledged lives in the offline queue and, for
//! header fields, in a locally held row. Both merges here are pure.

use courtside_core::ActionId;
use courtside_ledger::Action;
use courtside_match::{MatchPatch, MatchRecord};
use courtside_rules::ActionIntent;
use std::collections::HashMap;

use crate::queue::QueueEntry;

/// What the backend has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedState {
    /// The match row.
    pub record: MatchRecord,
    /// The committed ledger.
    pub actions: Vec<Action>,
}

/// Local work the backend has not seen yet.
#[derive(Debug, Clone, Copy)]
pub struct LocalOverlay<'a> {
    /// Queued submissions and annulments, oldest first.
    pub entries: &'a [QueueEntry],
    /// The local row, when its header fields have not been pushed.
    pub header: Option<&'a MatchRecord>,
}

impl LocalOverlay<'_> {
    /// An overlay with nothing pending.
    #[must_use]
    pub fn empty() -> Self {
        LocalOverlay {
            entries: &[],
            header: None,
        }
    }
}

/// The merged view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Confirmed entries plus queued ones, with queued annulments applied.
    pub actions: Vec<Action>,
    /// The row whose header fields the local state machine should adopt.
    pub header: MatchRecord,
}

/// Lays the overlay over the confirmed base.
///
/// Queued submissions the backend already holds are not duplicated, and a
/// queued annulment flips its target whether the target is confirmed or
/// still queued. Header fields (state, quarter, final-two-minutes rule,
/// suspension reason) come from the local row when one is pending.
#[must_use]
pub fn reconcile(base: &ConfirmedState, overlay: &LocalOverlay<'_>) -> Reconciled {
    let mut actions = base.actions.clone();
    let mut index: HashMap<ActionId, usize> = actions
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id, i))
        .collect();

    for entry in overlay.entries {
        match entry.intent {
            ActionIntent::Do => {
                if !index.contains_key(&entry.action.id) {
                    index.insert(entry.action.id, actions.len());
                    actions.push(entry.action.clone());
                }
            }
            ActionIntent::Undo => {
                let target = entry.target.unwrap_or(entry.action.id);
                if let Some(&i) = index.get(&target) {
                    actions[i].annulled = true;
                }
            }
        }
    }

    let mut header = base.record.clone();
    if let Some(local) = overlay.header {
        header.state = local.state;
        header.quarter = local.quarter;
        header.final_two_minutes = local.final_two_minutes;
        header.suspension_reason = local.suspension_reason.clone();
    }

    Reconciled { actions, header }
}

/// Result of applying a pushed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// The delta was written.
    Applied,
    /// The delta predates the row and was ignored.
    Stale,
}

/// Field-level last-write-wins: every field the patch carries overwrites
/// the row, unless the row is already at least as new as the patch.
pub fn apply_delta(record: &mut MatchRecord, patch: &MatchPatch) -> DeltaOutcome {
    if patch.updated_at.is_some_and(|at| at <= record.updated_at) {
        return DeltaOutcome::Stale;
    }
    record.apply(patch);
    DeltaOutcome::Applied
}
