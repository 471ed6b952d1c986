//! The match row as the backend stores it, and partial updates to it.

use courtside_core::{MatchId, Side, Timestamp};
use serde::{Deserialize, Serialize};

use crate::MatchState;

/// Denormalized match header: everything a spectator needs besides the
/// ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Match id.
    pub id: MatchId,
    /// Lifecycle state.
    pub state: MatchState,
    /// Current quarter; 5+ is overtime.
    pub quarter: u8,
    /// Home score.
    pub score_home: u32,
    /// Away score.
    pub score_away: u32,
    /// Home team fouls per regular quarter.
    pub team_fouls_home: [u8; 4],
    /// Away team fouls per regular quarter.
    pub team_fouls_away: [u8; 4],
    /// Home timeouts used in the current window.
    pub timeouts_home: u8,
    /// Away timeouts used in the current window.
    pub timeouts_away: u8,
    /// Whether the final-two-minutes timeout rule is active.
    #[serde(default)]
    pub final_two_minutes: bool,
    /// Why the match is suspended.
    #[serde(default)]
    pub suspension_reason: Option<String>,
    /// When the row was last written.
    pub updated_at: Timestamp,
}

impl MatchRecord {
    /// A fresh scheduled row.
    #[must_use]
    pub fn scheduled(id: MatchId) -> Self {
        Self {
            id,
            state: MatchState::Scheduled,
            quarter: 1,
            score_home: 0,
            score_away: 0,
            team_fouls_home: [0; 4],
            team_fouls_away: [0; 4],
            timeouts_home: 0,
            timeouts_away: 0,
            final_two_minutes: false,
            suspension_reason: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Score for one side.
    #[must_use]
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.score_home,
            Side::Away => self.score_away,
        }
    }

    /// The fields of `newer` that differ from `self`.
    #[must_use]
    pub fn diff(&self, newer: &MatchRecord) -> MatchPatch {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        // The reason travels with the state so that clearing it survives
        // serialization.
        let reason_changed = self.suspension_reason != newer.suspension_reason;
        let state = (self.state != newer.state || reason_changed).then_some(newer.state);
        MatchPatch {
            state,
            quarter: changed(&self.quarter, &newer.quarter),
            score_home: changed(&self.score_home, &newer.score_home),
            score_away: changed(&self.score_away, &newer.score_away),
            team_fouls_home: changed(&self.team_fouls_home, &newer.team_fouls_home),
            team_fouls_away: changed(&self.team_fouls_away, &newer.team_fouls_away),
            timeouts_home: changed(&self.timeouts_home, &newer.timeouts_home),
            timeouts_away: changed(&self.timeouts_away, &newer.timeouts_away),
            final_two_minutes: changed(&self.final_two_minutes, &newer.final_two_minutes),
            suspension_reason: state.and_then(|_| newer.suspension_reason.clone()),
            updated_at: Some(newer.updated_at),
        }
    }

    /// Overwrites every field the patch carries.
    pub fn apply(&mut self, patch: &MatchPatch) {
        if let Some(state) = patch.state {
            self.state = state;
            self.suspension_reason = patch.suspension_reason.clone();
        } else if let Some(reason) = &patch.suspension_reason {
            self.suspension_reason = Some(reason.clone());
        }
        if let Some(quarter) = patch.quarter {
            self.quarter = quarter;
        }
        if let Some(score) = patch.score_home {
            self.score_home = score;
        }
        if let Some(score) = patch.score_away {
            self.score_away = score;
        }
        if let Some(fouls) = patch.team_fouls_home {
            self.team_fouls_home = fouls;
        }
        if let Some(fouls) = patch.team_fouls_away {
            self.team_fouls_away = fouls;
        }
        if let Some(used) = patch.timeouts_home {
            self.timeouts_home = used;
        }
        if let Some(used) = patch.timeouts_away {
            self.timeouts_away = used;
        }
        if let Some(active) = patch.final_two_minutes {
            self.final_two_minutes = active;
        }
        if let Some(at) = patch.updated_at {
            self.updated_at = at;
        }
    }
}

/// A partial update to a [`MatchRecord`]. Absent fields are left alone.
///
/// `suspension_reason` is applied together with `state`: a patch that
/// carries a state also sets the reason, clearing it when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPatch {
    /// New lifecycle state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<MatchState>,
    /// New quarter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u8>,
    /// New home score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_home: Option<u32>,
    /// New away score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_away: Option<u32>,
    /// New home team fouls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_fouls_home: Option<[u8; 4]>,
    /// New away team fouls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_fouls_away: Option<[u8; 4]>,
    /// New home timeouts used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts_home: Option<u8>,
    /// New away timeouts used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts_away: Option<u8>,
    /// New final-two-minutes flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_two_minutes: Option<bool>,
    /// Suspension reason; see the type docs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspension_reason: Option<String>,
    /// Write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

impl MatchPatch {
    /// A patch that rewrites every field.
    #[must_use]
    pub fn full(record: &MatchRecord) -> Self {
        Self {
            state: Some(record.state),
            quarter: Some(record.quarter),
            score_home: Some(record.score_home),
            score_away: Some(record.score_away),
            team_fouls_home: Some(record.team_fouls_home),
            team_fouls_away: Some(record.team_fouls_away),
            timeouts_home: Some(record.timeouts_home),
            timeouts_away: Some(record.timeouts_away),
            final_two_minutes: Some(record.final_two_minutes),
            suspension_reason: record.suspension_reason.clone(),
            updated_at: Some(record.updated_at),
        }
    }

    /// Whether the patch changes anything besides the write time.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self
            == Self {
                updated_at: self.updated_at,
                ..Self::default()
            }
    }
}
