//! The append-only ledger.

use courtside_core::{ActionId, MatchId};
use std::collections::HashMap;
use tracing::debug;

use crate::{Action, ActionSelector, LedgerError, Result};

/// Outcome of [`Ledger::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// The entry was added.
    New,
    /// An entry with the same id already exists; nothing changed.
    Duplicate,
}

/// Outcome of [`Ledger::merge_remote`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The remote entry was not known locally and was inserted.
    Inserted,
    /// A known entry was annulled by the remote copy.
    Annulled,
    /// Nothing changed.
    Unchanged,
}

/// Append-only list of a single match's actions.
///
/// Entries are kept in insertion order; [`Ledger::ordered`] yields them by
/// recording time with insertion order breaking ties. The only mutation an
/// existing entry ever sees is its annulled flag going from `false` to
/// `true`.
#[derive(Debug, Clone)]
pub struct Ledger {
    match_id: MatchId,
    entries: Vec<Action>,
    index: HashMap<ActionId, usize>,
}

impl Ledger {
    /// Creates an empty ledger for a match.
    pub fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builds a ledger from previously fetched entries. Duplicates are dropped.
    pub fn from_actions(match_id: MatchId, actions: impl IntoIterator<Item = Action>) -> Result<Self> {
        let mut ledger = Self::new(match_id);
        for action in actions {
            ledger.append(action)?;
        }
        Ok(ledger)
    }

    /// The match this ledger belongs to.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Number of entries, annulled ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks an entry up by id.
    pub fn get(&self, id: &ActionId) -> Option<&Action> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Whether an entry with this id exists.
    pub fn contains(&self, id: &ActionId) -> bool {
        self.index.contains_key(id)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.entries.iter()
    }

    /// Entries by recording time, insertion order breaking ties.
    pub fn ordered(&self) -> Vec<&Action> {
        let mut ordered: Vec<&Action> = self.entries.iter().collect();
        // Stable sort keeps insertion order among equal timestamps.
        ordered.sort_by_key(|a| a.recorded_at);
        ordered
    }

    /// Non-annulled entries, by recording time.
    pub fn active(&self) -> impl Iterator<Item = &Action> {
        self.ordered().into_iter().filter(|a| !a.annulled)
    }

    /// Appends an entry. An id already present is ignored, never re-applied.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WrongMatch`] if the entry belongs to another match.
    pub fn append(&mut self, action: Action) -> Result<Appended> {
        if action.match_id != self.match_id {
            return Err(LedgerError::WrongMatch {
                expected: self.match_id,
                found: action.match_id,
            });
        }
        if self.index.contains_key(&action.id) {
            debug!(action_id = %action.id, "Duplicate ledger entry ignored");
            return Ok(Appended::Duplicate);
        }

        self.index.insert(action.id, self.entries.len());
        self.entries.push(action);
        Ok(Appended::New)
    }

    /// The most recent live entry the selector picks out.
    pub fn find_latest(&self, selector: &ActionSelector) -> Option<&Action> {
        self.ordered()
            .into_iter()
            .rev()
            .find(|a| selector.matches(a))
    }

    /// Flips an entry's annulled flag.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NotFound`] for an unknown id.
    /// - [`LedgerError::AlreadyAnnulled`] if it was already taken back.
    pub fn annul(&mut self, id: &ActionId) -> Result<&Action> {
        let &i = self.index.get(id).ok_or(LedgerError::NotFound(*id))?;
        let entry = &mut self.entries[i];
        if entry.annulled {
            return Err(LedgerError::AlreadyAnnulled(*id));
        }
        entry.annulled = true;
        debug!(action_id = %id, tag = %entry.kind.tag(), "Ledger entry annulled");
        Ok(&*entry)
    }

    /// Annuls the most recent live entry the selector picks out.
    ///
    /// # Errors
    ///
    /// [`LedgerError::NoMatchingEntry`] when there is nothing to undo.
    pub fn annul_latest(&mut self, selector: &ActionSelector) -> Result<Action> {
        let id = self
            .find_latest(selector)
            .map(|a| a.id)
            .ok_or_else(|| LedgerError::NoMatchingEntry(selector.to_string()))?;
        self.annul(&id).cloned()
    }

    /// Folds an authoritative copy of an entry into the local ledger.
    ///
    /// Unknown entries are inserted. A known entry adopts the remote annulled
    /// flag only in the `false -> true` direction.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WrongMatch`] if the entry belongs to another match.
    pub fn merge_remote(&mut self, remote: Action) -> Result<MergeOutcome> {
        match self.index.get(&remote.id) {
            None => {
                self.append(remote)?;
                Ok(MergeOutcome::Inserted)
            }
            Some(&i) => {
                let local = &mut self.entries[i];
                if remote.annulled && !local.annulled {
                    local.annulled = true;
                    Ok(MergeOutcome::Annulled)
                } else {
                    Ok(MergeOutcome::Unchanged)
                }
            }
        }
    }

    /// Replaces the whole ledger with a refetched copy, keeping local
    /// annulments the backend has not seen yet.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WrongMatch`] if any entry belongs to another match.
    pub fn replace_all(&mut self, actions: impl IntoIterator<Item = Action>) -> Result<()> {
        let mut fresh = Self::new(self.match_id);
        for mut action in actions {
            if self.get(&action.id).is_some_and(|local| local.annulled) {
                action.annulled = true;
            }
            fresh.append(action)?;
        }
        *self = fresh;
        Ok(())
    }
}
