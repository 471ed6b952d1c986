//! Coach foul accumulation.

use serde::{Deserialize, Serialize};

use crate::{ActionIntent, Result, RuleViolation};

/// Fouls charged to a head coach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoachFoulKind {
    /// Technical foul for the coach's own conduct ("C").
    Technical,
    /// Technical foul charged for bench conduct ("B").
    Bench,
    /// Direct expulsion.
    Expulsion,
}

impl CoachFoulKind {
    fn category(self) -> &'static str {
        match self {
            CoachFoulKind::Technical => "coach technical foul",
            CoachFoulKind::Bench => "bench technical foul",
            CoachFoulKind::Expulsion => "coach expulsion",
        }
    }
}

/// A coach's foul counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoachFoulCounters {
    /// Technical fouls to the coach.
    pub technical: u8,
    /// Technical fouls to the bench.
    pub bench: u8,
    /// Direct expulsions.
    pub expulsions: u8,
}

impl CoachFoulCounters {
    fn slot(&mut self, kind: CoachFoulKind) -> &mut u8 {
        match kind {
            CoachFoulKind::Technical => &mut self.technical,
            CoachFoulKind::Bench => &mut self.bench,
            CoachFoulKind::Expulsion => &mut self.expulsions,
        }
    }

    /// Shorthand for [`is_coach_disqualified`].
    #[must_use]
    pub const fn disqualified(&self) -> bool {
        is_coach_disqualified(self)
    }
}

/// Two coach technicals, three technicals in total, or an expulsion.
#[must_use]
pub const fn is_coach_disqualified(counters: &CoachFoulCounters) -> bool {
    counters.expulsions > 0
        || counters.technical >= 2
        || counters.technical.saturating_add(counters.bench) >= 3
}

/// Result of applying a coach foul.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoachFoulOutcome {
    /// Counters after the foul.
    pub counters: CoachFoulCounters,
    /// Verdict before the foul.
    pub was_disqualified: bool,
    /// Verdict after the foul.
    pub disqualified: bool,
}

impl CoachFoulOutcome {
    /// The foul just disqualified the coach.
    #[must_use]
    pub const fn newly_disqualified(&self) -> bool {
        !self.was_disqualified && self.disqualified
    }
}

/// Applies (or takes back) a coach foul.
///
/// # Errors
///
/// [`RuleViolation::NothingToUndo`] when undoing a category with no fouls.
pub fn apply_coach_foul(
    current: CoachFoulCounters,
    kind: CoachFoulKind,
    intent: ActionIntent,
) -> Result<CoachFoulOutcome> {
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

    Ok(CoachFoulOutcome {
        counters,
        was_disqualified: current.disqualified(),
        disqualified: counters.disqualified(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn second_coach_technical_disqualifies() {
        let first = apply_coach_foul(
            CoachFoulCounters::default(),
            CoachFoulKind::Technical,
            ActionIntent::Do,
        )
        .unwrap();
        assert!(!first.disqualified);

        let second = apply_coach_foul(first.counters, CoachFoulKind::Technical, ActionIntent::Do).unwrap();
        assert!(second.newly_disqualified());
    }

    #[test]
    fn three_mixed_technicals_disqualify() {
        let counters = CoachFoulCounters {
            technical: 1,
            bench: 1,
            expulsions: 0,
        };
        let outcome = apply_coach_foul(counters, CoachFoulKind::Bench, ActionIntent::Do).unwrap();
        assert!(outcome.disqualified);

        let undone = apply_coach_foul(outcome.counters, CoachFoulKind::Bench, ActionIntent::Undo).unwrap();
        assert!(!undone.disqualified);
    }

    #[test]
    fn three_bench_technicals_disqualify() {
        let counters = CoachFoulCounters {
            technical: 0,
            bench: 3,
            expulsions: 0,
        };
        assert!(is_coach_disqualified(&counters));
    }

    #[test]
    fn expulsion_disqualifies() {
        let outcome = apply_coach_foul(
            CoachFoulCounters::default(),
            CoachFoulKind::Expulsion,
            ActionIntent::Do,
        )
        .unwrap();
        assert!(outcome.disqualified);
    }

    #[test]
    fn undo_without_foul_is_rejected() {
        let err = apply_coach_foul(
            CoachFoulCounters::default(),
            CoachFoulKind::Bench,
            ActionIntent::Undo,
        )
        .unwrap_err();
        assert!(matches!(err, RuleViolation::NothingToUndo { .. }));
    }

    proptest! {
        /// Property: the coach verdict is exactly the formula, and undo inverts do.
        #[test]
        fn prop_coach_formula_and_inverse(t in 0u8..4, b in 0u8..4, e in 0u8..2) {
            let start = CoachFoulCounters { technical: t, bench: b, expulsions: e };
            prop_assert_eq!(start.disqualified(), e > 0 || t >= 2 || t + b >= 3);

            for kind in [CoachFoulKind::Technical, CoachFoulKind::Bench, CoachFoulKind::Expulsion] {
                let done = apply_coach_foul(start, kind, ActionIntent::Do).unwrap();
                let undone = apply_coach_foul(done.counters, kind, ActionIntent::Undo).unwrap();
                prop_assert_eq!(undone.counters, start);
            }
        }
    }
}
