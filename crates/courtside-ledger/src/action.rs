//! Ledger entry types.

use courtside_core::{ActionId, MatchId, PlayerId, TeamId, Timestamp};
use courtside_rules::{CoachFoulKind, FoulKind, PointValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which end of a period a boundary entry marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodBoundary {
    /// Period started.
    Start,
    /// Period ended.
    End,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Points scored by a player.
    Point {
        /// Points awarded.
        value: PointValue,
    },
    /// A player foul.
    Foul {
        /// Category of the foul.
        kind: FoulKind,
        /// Free throws awarded.
        free_throws: u8,
        /// The player's personal-category foul count after this foul.
        sequence: u8,
    },
    /// A foul charged to the head coach or bench.
    CoachFoul {
        /// Category of the foul.
        kind: CoachFoulKind,
    },
    /// A team timeout.
    Timeout,
    /// A substitution.
    Substitution {
        /// Player coming on.
        entering: PlayerId,
        /// Player going off.
        leaving: PlayerId,
    },
    /// Start or end of a quarter.
    PeriodBoundary {
        /// Start or end.
        boundary: PeriodBoundary,
    },
}

impl ActionKind {
    /// The part of the kind that undo matches on.
    #[must_use]
    pub fn tag(&self) -> ActionTag {
        match *self {
            ActionKind::Point { value } => ActionTag::Point(value),
            ActionKind::Foul { kind, .. } => ActionTag::Foul(kind),
            ActionKind::CoachFoul { kind } => ActionTag::CoachFoul(kind),
            ActionKind::Timeout => ActionTag::Timeout,
            ActionKind::Substitution { .. } => ActionTag::Substitution,
            ActionKind::PeriodBoundary { boundary } => ActionTag::PeriodBoundary(boundary),
        }
    }
}

/// An [`ActionKind`] stripped of per-instance details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    /// Points of a given value.
    Point(PointValue),
    /// A player foul of a given category.
    Foul(FoulKind),
    /// A coach foul of a given category.
    CoachFoul(CoachFoulKind),
    /// A timeout.
    Timeout,
    /// A substitution.
    Substitution,
    /// A period boundary.
    PeriodBoundary(PeriodBoundary),
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionTag::Point(v) => write!(f, "point_{}", v.points()),
            ActionTag::Foul(kind) => write!(f, "foul_{kind}"),
            ActionTag::CoachFoul(kind) => write!(f, "coach_foul_{kind:?}"),
            ActionTag::Timeout => write!(f, "timeout"),
            ActionTag::Substitution => write!(f, "substitution"),
            ActionTag::PeriodBoundary(b) => write!(f, "period_{b:?}"),
        }
    }
}

/// Score at the moment an action was recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    /// Home score.
    pub home: u32,
    /// Away score.
    pub away: u32,
}

impl fmt::Display for ScoreSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Client-generated id; the backend deduplicates on it.
    pub id: ActionId,
    /// Match the action belongs to.
    pub match_id: MatchId,
    /// Team the action is attributed to. `None` for match-level entries.
    pub team_id: Option<TeamId>,
    /// Player the action is attributed to. `None` for team and coach entries.
    pub player_id: Option<PlayerId>,
    /// Quarter in which the action happened (5+ is overtime).
    pub quarter: u8,
    /// What happened.
    pub kind: ActionKind,
    /// Device clock at recording time.
    pub recorded_at: Timestamp,
    /// Whether the entry has been taken back.
    #[serde(default)]
    pub annulled: bool,
    /// Score after the action, for audit and display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSnapshot>,
}

impl Action {
    /// Creates a match-level action stamped with the current time and a fresh id.
    #[must_use]
    pub fn new(match_id: MatchId, quarter: u8, kind: ActionKind) -> Self {
        Self {
            id: ActionId::generate(),
            match_id,
            team_id: None,
            player_id: None,
            quarter,
            kind,
            recorded_at: Timestamp::now(),
            annulled: false,
            score: None,
        }
    }

    /// Attributes the action to a team.
    #[must_use]
    pub fn for_team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    /// Attributes the action to a player.
    #[must_use]
    pub fn by_player(mut self, player_id: PlayerId) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// Overrides the recording time.
    #[must_use]
    pub fn at(mut self, recorded_at: Timestamp) -> Self {
        self.recorded_at = recorded_at;
        self
    }

    /// Attaches a score snapshot.
    #[must_use]
    pub fn with_score(mut self, score: ScoreSnapshot) -> Self {
        self.score = Some(score);
        self
    }

    /// Selector matching this action's team, player and kind.
    #[must_use]
    pub fn selector(&self) -> ActionSelector {
        ActionSelector {
            team_id: self.team_id,
            player_id: self.player_id,
            tag: self.kind.tag(),
        }
    }
}

/// Identifies "the most recent entry like this" for undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionSelector {
    /// Team the entry must be attributed to.
    pub team_id: Option<TeamId>,
    /// Player the entry must be attributed to.
    pub player_id: Option<PlayerId>,
    /// Kind the entry must have.
    pub tag: ActionTag,
}

impl ActionSelector {
    /// Whether `action` is a live entry this selector picks out.
    #[must_use]
    pub fn matches(&self, action: &Action) -> bool {
        !action.annulled
            && action.team_id == self.team_id
            && action.player_id == self.player_id
            && action.kind.tag() == self.tag
    }
}

impl fmt::Display for ActionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(team) = self.team_id {
            write!(f, " team={team}")?;
        }
        if let Some(player) = self.player_id {
            write!(f, " player={player}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_with_type_tag() {
        let kind = ActionKind::Foul {
            kind: FoulKind::Technical,
            free_throws: 1,
            sequence: 2,
        };
        let json = serde_json::to_value(kind).unwrap();
        assert_eq!(json["type"], "foul");
        assert_eq!(json["kind"], "technical");
        assert_eq!(json["free_throws"], 1);
    }

    #[test]
    fn selector_ignores_annulled_entries() {
        let team = TeamId::generate();
        let player = PlayerId::generate();
        let mut action = Action::new(
            MatchId::generate(),
            1,
            ActionKind::Point {
                value: PointValue::Two,
            },
        )
        .for_team(team)
        .by_player(player);

        let selector = action.selector();
        assert!(selector.matches(&action));

        action.annulled = true;
        assert!(!selector.matches(&action));
    }

    #[test]
    fn selector_distinguishes_point_values() {
        let action = Action::new(
            MatchId::generate(),
            1,
            ActionKind::Point {
                value: PointValue::Three,
            },
        );
        let selector = ActionSelector {
            team_id: None,
            player_id: None,
            tag: ActionTag::Point(PointValue::Two),
        };
        assert!(!selector.matches(&action));
    }

    #[test]
    fn action_roundtrips_through_json() {
        let action = Action::new(MatchId::generate(), 2, ActionKind::Timeout)
            .for_team(TeamId::generate())
            .with_score(ScoreSnapshot { home: 10, away: 8 });
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
