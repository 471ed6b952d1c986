//! # Courtside Rules
//!
//! The rule engine: deterministic functions that compute foul,
//! disqualification, timeout and eligibility outcomes from current counters
//! and a requested action. Nothing here performs I/O or holds state.
//!
//! Every outcome is advisory. The match state machine decides whether a
//! verdict blocks the action (a timeout beyond the allowance) or merely
//! raises an alert (a foul that disqualifies is always recorded).
//!
//! Decrements are requested through [`ActionIntent::Undo`] rather than a
//! mode flag, and are symmetric: undoing a foul recomputes the verdict from
//! the resulting counters.
//!
//! ## Example
//!
//! ```rust
//! use courtside_rules::{apply_foul, ActionIntent, FoulCounters, FoulKind, Standing};
//!
//! let counters = FoulCounters { technical: 1, ..FoulCounters::default() };
//! let outcome = apply_foul(counters, FoulKind::Unsportsmanlike, ActionIntent::Do).unwrap();
//! assert_eq!(outcome.standing, Standing::Disqualified);
//!
//! let undone = apply_foul(outcome.counters, FoulKind::Unsportsmanlike, ActionIntent::Undo).unwrap();
//! assert_eq!(undone.standing, Standing::Eligible);
//! assert_eq!(undone.counters.technical, 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod coach;
mod error;
mod eligibility;
mod foul;
mod intent;
mod points;
mod timeout;

pub use coach::{apply_coach_foul, is_coach_disqualified, CoachFoulCounters, CoachFoulKind, CoachFoulOutcome};
pub use eligibility::{bonus_active, reinforcement_eligible, team_foul_slot, REGULAR_QUARTERS, TEAM_FOUL_BONUS_THRESHOLD};
pub use error::RuleViolation;
pub use foul::{
    apply_foul, is_disqualified, validate_free_throws, FoulCounters, FoulKind, FoulOutcome, Standing,
    MAX_FREE_THROWS, PERSONAL_FOUL_LIMIT,
};
pub use intent::ActionIntent;
pub use points::{apply_points, PointValue};
pub use timeout::{check_timeout, timeout_window, timeouts_available, TimeoutAllowance};

/// Result type for rule evaluation.
pub type Result<T> = std::result::Result<T, RuleViolation>;
