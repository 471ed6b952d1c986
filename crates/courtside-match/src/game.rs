//! The match aggregate: header fields plus both team sheets.

use courtside_core::{MatchId, Side, TeamId, Timestamp};
use courtside_ledger::Counters;
use courtside_rules::timeout_window;
use serde::{Deserialize, Serialize};

use crate::{MatchRecord, MatchState, TeamSheet};

/// A match and its two team sheets. Scores and fouls live in the engine's
/// counters; this type holds everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Match id.
    pub id: MatchId,
    /// Lifecycle state.
    pub state: MatchState,
    /// Current quarter; 5+ is overtime.
    pub quarter: u8,
    /// Final-two-minutes timeout rule active for the current window.
    pub final_two_minutes: bool,
    /// Quarter whose start cleared an active final-two-minutes rule, so
    /// reverting that quarter can restore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_two_minutes_cleared_at: Option<u8>,
    /// Why the match is suspended.
    pub suspension_reason: Option<String>,
    /// Home team.
    pub home: TeamSheet,
    /// Away team.
    pub away: TeamSheet,
    /// Last local mutation.
    pub updated_at: Timestamp,
}

impl Match {
    /// A scheduled match in quarter 1.
    #[must_use]
    pub fn new(id: MatchId, home: TeamSheet, away: TeamSheet) -> Self {
        Self {
            id,
            state: MatchState::Scheduled,
            quarter: 1,
            final_two_minutes: false,
            final_two_minutes_cleared_at: None,
            suspension_reason: None,
            home,
            away,
            updated_at: Timestamp::now(),
        }
    }

    /// One side's sheet.
    #[must_use]
    pub fn team(&self, side: Side) -> &TeamSheet {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub(crate) fn team_mut(&mut self, side: Side) -> &mut TeamSheet {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// Which side a team plays on.
    #[must_use]
    pub fn side_of(&self, team_id: &TeamId) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|&side| &self.team(side).team_id == team_id)
    }

    /// The row to publish, with totals taken from `counters`.
    #[must_use]
    pub fn record(&self, counters: &Counters) -> MatchRecord {
        let home = counters.team(&self.home.team_id);
        let away = counters.team(&self.away.team_id);
        let window = timeout_window(self.quarter);
        MatchRecord {
            id: self.id,
            state: self.state,
            quarter: self.quarter,
            score_home: home.score,
            score_away: away.score,
            team_fouls_home: home.team_fouls,
            team_fouls_away: away.team_fouls,
            timeouts_home: home.timeouts_in(window),
            timeouts_away: away.timeouts_in(window),
            final_two_minutes: self.final_two_minutes,
            suspension_reason: self.suspension_reason.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Adopts the header fields of an authoritative row.
    pub fn adopt(&mut self, record: &MatchRecord) {
        self.state = record.state;
        self.quarter = record.quarter;
        self.final_two_minutes = record.final_two_minutes;
        self.suspension_reason = record.suspension_reason.clone();
        self.updated_at = record.updated_at;
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}
