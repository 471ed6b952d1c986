//! Rule violations.

use thiserror::Error;

/// A requested action the rules refuse outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// A decrement targeted a category whose counter is already zero.
    #[error("nothing to undo: no {category} recorded")]
    NothingToUndo {
        /// Human-readable name of the counter.
        category: &'static str,
    },

    /// All timeouts for the current period are used.
    #[error("no timeouts left in quarter {quarter}: {max} allowed")]
    TimeoutLimit {
        /// The quarter the timeout was requested in.
        quarter: u8,
        /// The allowance for that quarter.
        max: u8,
    },

    /// Points must be worth 1, 2 or 3.
    #[error("invalid point value: {0}")]
    InvalidPointValue(u8),

    /// More free throws than any foul can award.
    #[error("too many free throws: {0}")]
    TooManyFreeThrows(u8),

    /// Quarters are numbered from 1.
    #[error("invalid quarter: {0}")]
    InvalidQuarter(u8),
}
