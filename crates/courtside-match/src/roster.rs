//! Team sheets: called-up players, jerseys, starters and the on-court set.

use courtside_core::{PlayerId, TeamId};
use courtside_rules::reinforcement_eligible;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::{MatchError, Result};

/// Most players a team may call up for a match.
pub const MAX_CALL_UP: usize = 12;

/// Players on court per team.
pub const ON_COURT: usize = 5;

/// Highest jersey number allowed.
pub const MAX_JERSEY: u8 = 99;

/// A player as listed when calling up the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Jersey number, 0-99.
    pub jersey: u8,
    /// Quarters a guest player may play, if capped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinforcement_cap: Option<u8>,
}

impl RosterEntry {
    /// Creates an uncapped entry.
    pub fn new(player_id: PlayerId, name: impl Into<String>, jersey: u8) -> Self {
        Self {
            player_id,
            name: name.into(),
            jersey,
            reinforcement_cap: None,
        }
    }

    /// Caps the number of quarters the player may play.
    #[must_use]
    pub fn reinforcement(mut self, cap: u8) -> Self {
        self.reinforcement_cap = Some(cap);
        self
    }
}

/// A called-up player's line on the team sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerLine {
    /// Player id.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Jersey number.
    pub jersey: u8,
    /// Selected for the opening five.
    pub starter: bool,
    /// Has been on court at any point.
    pub participated: bool,
    /// Quarters a guest player may play, if capped.
    pub reinforcement_cap: Option<u8>,
    /// Quarters in which the player has been on court.
    pub quarters: BTreeSet<u8>,
}

impl PlayerLine {
    fn from_entry(entry: RosterEntry) -> Self {
        Self {
            player_id: entry.player_id,
            name: entry.name,
            jersey: entry.jersey,
            starter: false,
            participated: false,
            reinforcement_cap: entry.reinforcement_cap,
            quarters: BTreeSet::new(),
        }
    }

    /// Number of distinct quarters played.
    #[must_use]
    pub fn quarters_played(&self) -> u8 {
        u8::try_from(self.quarters.len()).unwrap_or(u8::MAX)
    }

    /// Whether the reinforcement cap lets the player on court in `quarter`.
    #[must_use]
    pub fn may_play_in(&self, quarter: u8) -> bool {
        reinforcement_eligible(
            self.quarters_played(),
            self.quarters.contains(&quarter),
            self.reinforcement_cap,
        )
    }

    pub(crate) fn count_quarter(&mut self, quarter: u8) {
        self.quarters.insert(quarter);
        self.participated = true;
    }

    pub(crate) fn uncount_quarter(&mut self, quarter: u8) {
        self.quarters.remove(&quarter);
        self.participated = !self.quarters.is_empty();
    }
}

/// One team's side of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSheet {
    /// Team id.
    pub team_id: TeamId,
    /// Display name.
    pub name: String,
    /// Head coach name.
    #[serde(default)]
    pub coach: Option<String>,
    /// Called-up players in roster order.
    pub players: Vec<PlayerLine>,
    /// Players currently on court.
    pub on_court: BTreeSet<PlayerId>,
    /// Players who were on court when the current quarter started.
    pub opening_lineup: BTreeSet<PlayerId>,
}

impl TeamSheet {
    /// Creates an empty sheet.
    pub fn new(team_id: TeamId, name: impl Into<String>) -> Self {
        Self {
            team_id,
            name: name.into(),
            coach: None,
            players: Vec::new(),
            on_court: BTreeSet::new(),
            opening_lineup: BTreeSet::new(),
        }
    }

    /// Names the head coach.
    #[must_use]
    pub fn with_coach(mut self, coach: impl Into<String>) -> Self {
        self.coach = Some(coach.into());
        self
    }

    /// Looks a player up.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerLine> {
        self.players.iter().find(|p| &p.player_id == id)
    }

    /// Looks a player up, failing if not called up.
    pub fn require(&self, id: &PlayerId) -> Result<&PlayerLine> {
        self.player(id).ok_or(MatchError::UnknownPlayer(*id))
    }

    pub(crate) fn require_mut(&mut self, id: &PlayerId) -> Result<&mut PlayerLine> {
        self.players
            .iter_mut()
            .find(|p| &p.player_id == id)
            .ok_or(MatchError::UnknownPlayer(*id))
    }

    /// The player wearing `jersey`.
    pub fn by_jersey(&self, jersey: u8) -> Option<&PlayerLine> {
        self.players.iter().find(|p| p.jersey == jersey)
    }

    /// Selected starters.
    pub fn starters(&self) -> impl Iterator<Item = &PlayerLine> {
        self.players.iter().filter(|p| p.starter)
    }

    /// Whether the player is on court.
    #[must_use]
    pub fn is_on_court(&self, id: &PlayerId) -> bool {
        self.on_court.contains(id)
    }

    /// Replaces the called-up roster. Clears any starter selection.
    ///
    /// # Errors
    ///
    /// [`MatchError::Validation`] unless there are 1 to 12 players with
    /// distinct ids and distinct jersey numbers in 0-99.
    pub fn call_up(&mut self, entries: Vec<RosterEntry>) -> Result<()> {
        if entries.is_empty() || entries.len() > MAX_CALL_UP {
            return Err(MatchError::validation(format!(
                "a team calls up 1 to {MAX_CALL_UP} players, got {}",
                entries.len()
            )));
        }

        let mut ids = HashSet::new();
        let mut jerseys = HashSet::new();
        for entry in &entries {
            if entry.jersey > MAX_JERSEY {
                return Err(MatchError::validation(format!(
                    "jersey {} is out of range",
                    entry.jersey
                )));
            }
            if !ids.insert(entry.player_id) {
                return Err(MatchError::validation(format!(
                    "player {} listed twice",
                    entry.player_id
                )));
            }
            if !jerseys.insert(entry.jersey) {
                return Err(MatchError::validation(format!(
                    "jersey {} is already taken",
                    entry.jersey
                )));
            }
        }

        self.players = entries.into_iter().map(PlayerLine::from_entry).collect();
        self.on_court.clear();
        self.opening_lineup.clear();
        Ok(())
    }

    /// Changes a player's jersey number.
    ///
    /// # Errors
    ///
    /// [`MatchError::Validation`] if the number is out of range or worn by
    /// a teammate.
    pub fn set_jersey(&mut self, player_id: &PlayerId, jersey: u8) -> Result<()> {
        if jersey > MAX_JERSEY {
            return Err(MatchError::validation(format!("jersey {jersey} is out of range")));
        }
        if self
            .by_jersey(jersey)
            .is_some_and(|p| &p.player_id != player_id)
        {
            return Err(MatchError::validation(format!("jersey {jersey} is already taken")));
        }
        self.require_mut(player_id)?.jersey = jersey;
        Ok(())
    }

    /// Marks exactly five called-up players as starters.
    ///
    /// # Errors
    ///
    /// [`MatchError::Validation`] unless the selection is five distinct
    /// called-up players.
    pub fn select_starters(&mut self, starters: &[PlayerId]) -> Result<()> {
        let selected: BTreeSet<PlayerId> = starters.iter().copied().collect();
        if selected.len() != ON_COURT || starters.len() != ON_COURT {
            return Err(MatchError::validation(format!(
                "exactly {ON_COURT} distinct starters are required, got {}",
                starters.len()
            )));
        }
        for id in &selected {
            if !self.require(id)?.may_play_in(1) {
                return Err(MatchError::validation(format!(
                    "player {id} has no reinforcement quarters to start with"
                )));
            }
        }
        for player in &mut self.players {
            player.starter = selected.contains(&player.player_id);
        }
        Ok(())
    }

    /// The first on-court player whose reinforcement cap rules out `quarter`.
    pub fn over_cap_on_court(&self, quarter: u8) -> Option<&PlayerLine> {
        self.players
            .iter()
            .find(|p| self.on_court.contains(&p.player_id) && !p.may_play_in(quarter))
    }

    /// Puts the starters on court for the first quarter.
    pub(crate) fn tip_off(&mut self) {
        self.on_court = self.starters().map(|p| p.player_id).collect();
        self.open_quarter(1);
    }

    /// Records the current on-court set as the opening lineup of `quarter`.
    pub(crate) fn open_quarter(&mut self, quarter: u8) {
        self.opening_lineup = self.on_court.clone();
        for player in &mut self.players {
            if self.on_court.contains(&player.player_id) {
                player.count_quarter(quarter);
            }
        }
    }
}
