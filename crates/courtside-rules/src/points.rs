//! Field goals and free throws.

use serde::{Deserialize, Serialize};

use crate::{ActionIntent, Result, RuleViolation};

/// Value of a scoring action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PointValue {
    /// Free throw.
    One,
    /// Field goal.
    Two,
    /// Field goal from beyond the arc.
    Three,
}

impl PointValue {
    /// Numeric value.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            PointValue::One => 1,
            PointValue::Two => 2,
            PointValue::Three => 3,
        }
    }
}

impl TryFrom<u8> for PointValue {
    type Error = RuleViolation;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(PointValue::One),
            2 => Ok(PointValue::Two),
            3 => Ok(PointValue::Three),
            other => Err(RuleViolation::InvalidPointValue(other)),
        }
    }
}

impl From<PointValue> for u8 {
    fn from(value: PointValue) -> Self {
        match value {
            PointValue::One => 1,
            PointValue::Two => 2,
            PointValue::Three => 3,
        }
    }
}

/// Adds or removes points from a player's tally.
///
/// # Errors
///
/// [`RuleViolation::NothingToUndo`] when the player does not have `value`
/// points to take back.
pub fn apply_points(current: u32, value: PointValue, intent: ActionIntent) -> Result<u32> {
    match intent {
        ActionIntent::Do => Ok(current.saturating_add(value.points())),
        ActionIntent::Undo => current
            .checked_sub(value.points())
            .ok_or(RuleViolation::NothingToUndo { category: "points" }),
    }
}
