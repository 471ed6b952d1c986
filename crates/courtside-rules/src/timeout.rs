//! Timeout allowances.

use serde::{Deserialize, Serialize};

use crate::{ActionIntent, Result, RuleViolation};

/// The period within which used timeouts accumulate.
///
/// Quarters 1-2 share window 0 and quarters 3-4 share window 1. Each
/// overtime is a window of its own, so the counter resets at every overtime.
#[must_use]
pub const fn timeout_window(quarter: u8) -> u8 {
    match quarter {
        0..=2 => 0,
        3 | 4 => 1,
        q => q - 3,
    }
}

/// How many timeouts a team may take in the current quarter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutAllowance {
    /// Maximum for the window.
    pub max: u8,
    /// Already used in the window.
    pub used: u8,
    /// `max - used`, never negative.
    pub remaining: u8,
}

/// Computes the allowance for `quarter` given `used` timeouts in its window.
///
/// Quarters 1-2 allow 2. Quarters 3-4 allow 3, reduced to 2 when the final
/// two minutes rule has been activated and none have been used yet. Each
/// overtime allows 1.
#[must_use]
pub fn timeouts_available(quarter: u8, used: u8, final_two_minutes: bool) -> TimeoutAllowance {
    let max = match quarter {
        0..=2 => 2,
        3 | 4 if final_two_minutes && used == 0 => 2,
        3 | 4 => 3,
        _ => 1,
    };
    TimeoutAllowance {
        max,
        used,
        remaining: max.saturating_sub(used),
    }
}

/// Validates a timeout request and returns the new used count.
///
/// # Errors
///
/// - [`RuleViolation::TimeoutLimit`] when none remain.
/// - [`RuleViolation::NothingToUndo`] when undoing with none used.
pub fn check_timeout(quarter: u8, used: u8, final_two_minutes: bool, intent: ActionIntent) -> Result<u8> {
    if quarter == 0 {
        return Err(RuleViolation::InvalidQuarter(quarter));
    }
    match intent {
        ActionIntent::Do => {
            let allowance = timeouts_available(quarter, used, final_two_minutes);
            if allowance.remaining == 0 {
                return Err(RuleViolation::TimeoutLimit {
                    quarter,
                    max: allowance.max,
                });
            }
            Ok(used + 1)
        }
        ActionIntent::Undo => used.checked_sub(1).ok_or(RuleViolation::NothingToUndo {
            category: "timeout",
        }),
    }
}
