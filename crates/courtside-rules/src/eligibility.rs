//! Team-foul bonus and reinforcement eligibility.

/// Regular quarters before overtime.
pub const REGULAR_QUARTERS: u8 = 4;

/// Team personal fouls in a quarter at which the bonus is reached.
pub const TEAM_FOUL_BONUS_THRESHOLD: u8 = 4;

/// Index into the per-quarter team-foul array. Overtime fouls count toward
/// the fourth quarter.
#[must_use]
pub fn team_foul_slot(quarter: u8) -> usize {
    usize::from(quarter.clamp(1, REGULAR_QUARTERS) - 1)
}

/// Whether a team with `team_fouls` this quarter is in the bonus.
#[must_use]
pub const fn bonus_active(team_fouls: u8) -> bool {
    team_fouls >= TEAM_FOUL_BONUS_THRESHOLD
}

/// Whether a capped guest player may take the floor this quarter.
///
/// A player already counted in the current quarter may always return;
/// otherwise the number of quarters played so far must be below the cap.
/// Players without a cap are always eligible.
#[must_use]
pub fn reinforcement_eligible(quarters_played: u8, counted_this_quarter: bool, cap: Option<u8>) -> bool {
    match cap {
        None => true,
        Some(cap) => counted_this_quarter || quarters_played < cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bonus_starts_at_fourth_foul() {
        assert!(!bonus_active(3));
        assert!(bonus_active(4));
        assert!(bonus_active(7));
    }

    #[test]
    fn overtime_shares_fourth_quarter_slot() {
        assert_eq!(team_foul_slot(1), 0);
        assert_eq!(team_foul_slot(4), 3);
        assert_eq!(team_foul_slot(5), 3);
        assert_eq!(team_foul_slot(9), 3);
    }

    #[test]
    fn reinforcement_cap() {
        assert!(reinforcement_eligible(1, false, Some(2)));
        assert!(!reinforcement_eligible(2, false, Some(2)));
        assert!(reinforcement_eligible(2, true, Some(2)));
        assert!(reinforcement_eligible(10, false, None));
    }
}
