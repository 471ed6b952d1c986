//! Backend payload shapes and their normalization.
//!
//! Relation fields come back from the backend either as a single object or
//! as a one-element array depending on how the query was joined. They are
//! normalized here, right after fetch, into [`FetchedMatch`]; nothing past
//! this module sees the ambiguity.

use courtside_core::{MatchId, TeamId};
use courtside_match::{MatchRecord, RosterEntry, TeamSheet};
use serde::{Deserialize, Serialize};

use crate::{Result, SyncError};

/// A relation that may arrive as an object or as an array of objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single embedded object.
    One(T),
    /// An array of objects.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Collapses a to-one relation, rejecting empty and ambiguous arrays.
    ///
    /// # Errors
    ///
    /// [`SyncError::Malformed`] naming `field`.
    pub fn into_single(self, field: &str) -> Result<T> {
        match self {
            OneOrMany::One(value) => Ok(value),
            OneOrMany::Many(values) => {
                let count = values.len();
                let mut values = values.into_iter();
                match (values.next(), count) {
                    (Some(value), 1) => Ok(value),
                    _ => Err(SyncError::Malformed(format!(
                        "{field}: expected one related row, got {count}"
                    ))),
                }
            }
        }
    }

    /// Flattens a to-many relation.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

/// A team row with its called-up players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTeam {
    /// Team id.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Head coach.
    #[serde(default)]
    pub coach: Option<String>,
    /// Called-up players.
    #[serde(default)]
    pub players: Option<OneOrMany<RosterEntry>>,
}

impl WireTeam {
    /// The wire form of a team sheet.
    #[must_use]
    pub fn from_sheet(sheet: &TeamSheet) -> Self {
        let players = sheet
            .players
            .iter()
            .map(|p| RosterEntry {
                player_id: p.player_id,
                name: p.name.clone(),
                jersey: p.jersey,
                reinforcement_cap: p.reinforcement_cap,
            })
            .collect();
        Self {
            id: sheet.team_id,
            name: sheet.name.clone(),
            coach: sheet.coach.clone(),
            players: Some(OneOrMany::Many(players)),
        }
    }
}

/// A match row as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMatch {
    /// The match row.
    #[serde(flatten)]
    pub record: MatchRecord,
    /// Home team relation.
    pub home_team: OneOrMany<WireTeam>,
    /// Away team relation.
    pub away_team: OneOrMany<WireTeam>,
}

/// A fetched match after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMatch {
    /// The authoritative row.
    pub record: MatchRecord,
    /// Home team sheet, players called up.
    pub home: TeamSheet,
    /// Away team sheet, players called up.
    pub away: TeamSheet,
}

impl FetchedMatch {
    /// Match id.
    #[must_use]
    pub fn id(&self) -> MatchId {
        self.record.id
    }
}

/// Normalizes a fetched match.
///
/// # Errors
///
/// [`SyncError::Malformed`] for missing or ambiguous relations and for
/// rosters the team sheet refuses.
pub fn normalize(wire: WireMatch) -> Result<FetchedMatch> {
    let home = team_sheet(wire.home_team.into_single("home_team")?)?;
    let away = team_sheet(wire.away_team.into_single("away_team")?)?;
    if home.team_id == away.team_id {
        return Err(SyncError::Malformed(format!(
            "match {} has the same team on both sides",
            wire.record.id
        )));
    }
    Ok(FetchedMatch {
        record: wire.record,
        home,
        away,
    })
}

fn team_sheet(team: WireTeam) -> Result<TeamSheet> {
    let mut sheet = TeamSheet::new(team.id, team.name);
    sheet.coach = team.coach;
    let players = team.players.map(OneOrMany::into_vec).unwrap_or_default();
    if !players.is_empty() {
        sheet
            .call_up(players)
            .map_err(|e| SyncError::Malformed(format!("roster of {}: {e}", sheet.name)))?;
    }
    Ok(sheet)
}
