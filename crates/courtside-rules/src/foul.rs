//! Player foul accumulation and disqualification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ActionIntent, Result, RuleViolation};

/// Personal-category fouls (personal + technical + unsportsmanlike) after
/// which a player has fouled out.
pub const PERSONAL_FOUL_LIMIT: u8 = 5;

/// The most free throws a single foul can award.
pub const MAX_FREE_THROWS: u8 = 3;

/// Categories of player foul.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoulKind {
    /// Standard foul; also feeds the team's per-quarter count.
    Personal,
    /// Technical foul.
    Technical,
    /// Unsportsmanlike foul.
    Unsportsmanlike,
    /// Disqualifying foul; ends participation immediately.
    Disqualifying,
}

impl FoulKind {
    /// Whether this foul increments the team's per-quarter foul count.
    #[must_use]
    pub const fn counts_toward_team(self) -> bool {
        matches!(self, FoulKind::Personal)
    }

    fn category(self) -> &'static str {
        match self {
            FoulKind::Personal => "personal foul",
            FoulKind::Technical => "technical foul",
            FoulKind::Unsportsmanlike => "unsportsmanlike foul",
            FoulKind::Disqualifying => "disqualifying foul",
        }
    }
}

impl fmt::Display for FoulKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoulKind::Personal => write!(f, "P"),
            FoulKind::Technical => write!(f, "T"),
            FoulKind::Unsportsmanlike => write!(f, "U"),
            FoulKind::Disqualifying => write!(f, "D"),
        }
    }
}

/// A player's foul counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoulCounters {
    /// Personal fouls.
    pub personal: u8,
    /// Technical fouls.
    pub technical: u8,
    /// Unsportsmanlike fouls.
    pub unsportsmanlike: u8,
    /// Disqualifying fouls. Any non-zero value is a direct disqualification.
    pub disqualifying: u8,
}

impl FoulCounters {
    /// Personal + technical + unsportsmanlike.
    #[must_use]
    pub const fn total(&self) -> u8 {
        self.personal
            .saturating_add(self.technical)
            .saturating_add(self.unsportsmanlike)
    }

    /// Whether a disqualifying foul is on record.
    #[must_use]
    pub const fn has_direct_disqualification(&self) -> bool {
        self.disqualifying > 0
    }

    /// Count for a single category.
    #[must_use]
    pub const fn get(&self, kind: FoulKind) -> u8 {
        match kind {
            FoulKind::Personal => self.personal,
            FoulKind::Technical => self.technical,
            FoulKind::Unsportsmanlike => self.unsportsmanlike,
            FoulKind::Disqualifying => self.disqualifying,
        }
    }

    fn slot(&mut self, kind: FoulKind) -> &mut u8 {
        match kind {
            FoulKind::Personal => &mut self.personal,
            FoulKind::Technical => &mut self.technical,
            FoulKind::Unsportsmanlike => &mut self.unsportsmanlike,
            FoulKind::Disqualifying => &mut self.disqualifying,
        }
    }

    /// Where these counters leave the player.
    #[must_use]
    pub fn standing(&self) -> Standing {
        if is_disqualified(self) {
            Standing::Disqualified
        } else if self.total() >= PERSONAL_FOUL_LIMIT {
            Standing::FouledOut
        } else {
            Standing::Eligible
        }
    }
}

/// A player's eligibility as implied by their foul counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Standing {
    /// Free to play.
    Eligible,
    /// Reached the personal-foul limit.
    FouledOut,
    /// Disqualified by a disqualifying foul or technical/unsportsmanlike accumulation.
    Disqualified,
}

impl Standing {
    /// Whether the player may be on court.
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Standing::Eligible)
    }
}

/// Disqualification as a pure function of the counters.
///
/// True when a disqualifying foul is present, or technical >= 2, or
/// unsportsmanlike >= 2, or at least one of each.
#[must_use]
pub const fn is_disqualified(counters: &FoulCounters) -> bool {
    counters.has_direct_disqualification()
        || counters.technical >= 2
        || counters.unsportsmanlike >= 2
        || (counters.technical >= 1 && counters.unsportsmanlike >= 1)
}

/// Result of applying a foul to a player's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoulOutcome {
    /// Counters after the foul.
    pub counters: FoulCounters,
    /// Standing before the foul.
    pub previous: Standing,
    /// Standing after the foul.
    pub standing: Standing,
    /// Personal-category foul count after the foul; recorded on the ledger
    /// entry as the foul's sequence number.
    pub sequence: u8,
}

impl FoulOutcome {
    /// The foul just made the player ineligible.
    #[must_use]
    pub fn became_ineligible(&self) -> bool {
        self.previous.is_eligible() && !self.standing.is_eligible()
    }

    /// The undo just restored eligibility.
    #[must_use]
    pub fn reinstated(&self) -> bool {
        !self.previous.is_eligible() && self.standing.is_eligible()
    }

    /// Shorthand for `standing == Disqualified`.
    #[must_use]
    pub fn disqualified(&self) -> bool {
        self.standing == Standing::Disqualified
    }
}

/// Applies (or takes back) a foul and recomputes the verdict.
///
/// # Errors
///
/// [`RuleViolation::NothingToUndo`] when undoing a category with no fouls.
pub fn apply_foul(current: FoulCounters, kind: FoulKind, intent: ActionIntent) -> Result<FoulOutcome> {
    let previous = current.standing();
    let mut counters = current;
    let slot = counters.slot(kind);

    match intent {
        ActionIntent::Do => *slot = slot.saturating_add(1),
        ActionIntent::Undo => {
            if *slot == 0 {
                return Err(RuleViolation::NothingToUndo {
                    category: kind.category(),
                });
            }
            *slot -= 1;
        }
    }

    Ok(FoulOutcome {
        counters,
        previous,
        standing: counters.standing(),
        sequence: counters.total(),
    })
}

/// Free throws awarded with a foul must be between 0 and 3.
///
/// # Errors
///
/// [`RuleViolation::TooManyFreeThrows`] above [`MAX_FREE_THROWS`].
pub fn validate_free_throws(free_throws: u8) -> Result<u8> {
    if free_throws > MAX_FREE_THROWS {
        return Err(RuleViolation::TooManyFreeThrows(free_throws));
    }
    Ok(free_throws)
}
