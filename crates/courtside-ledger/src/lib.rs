//! The match action ledger.
//!
//! An append-only list of match events whose entries are immutable except
//! for their annulled flag. The ledger is the audit trail and the basis for
//! undo; [`derive_counters`] folds it into the same [`Counters`] the match
//! state machine maintains incrementally, so a desynchronized client can
//! always rebuild from the log.

mod action;
mod counters;
mod error;
mod ledger;

pub use action::{Action, ActionKind, ActionSelector, ActionTag, PeriodBoundary, ScoreSnapshot};
pub use counters::{derive_counters, Counters, PlayerCounters, TeamCounters};
pub use error::LedgerError;
pub use ledger::{Appended, Ledger, MergeOutcome};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
