//! Aggregate counters derived from ledger entries.

use courtside_core::{PlayerId, TeamId};
use courtside_rules::{
    apply_coach_foul, apply_foul, apply_points, team_foul_slot, timeout_window, ActionIntent,
    CoachFoulCounters, FoulCounters, FoulKind,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::{Action, ActionKind, Ledger};

/// Per-player tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCounters {
    /// Points scored.
    pub points: u32,
    /// Fouls by category.
    pub fouls: FoulCounters,
}

/// Per-team tallies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCounters {
    /// Points scored.
    pub score: u32,
    /// Personal fouls per regular quarter; overtime accrues to the last slot.
    pub team_fouls: [u8; 4],
    /// Timeouts used, keyed by timeout window.
    pub timeouts: BTreeMap<u8, u8>,
    /// Head coach fouls.
    pub coach: CoachFoulCounters,
}

impl TeamCounters {
    /// Timeouts used in a window.
    #[must_use]
    pub fn timeouts_in(&self, window: u8) -> u8 {
        self.timeouts.get(&window).copied().unwrap_or(0)
    }

    /// Team fouls charged in `quarter`.
    #[must_use]
    pub fn fouls_in(&self, quarter: u8) -> u8 {
        self.team_fouls[team_foul_slot(quarter)]
    }
}

/// Score, foul and timeout tallies for every team and player in a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Tallies by team.
    pub teams: BTreeMap<TeamId, TeamCounters>,
    /// Tallies by player.
    pub players: BTreeMap<PlayerId, PlayerCounters>,
}

impl Counters {
    /// Team tallies, zero if the team has no entries yet.
    #[must_use]
    pub fn team(&self, id: &TeamId) -> TeamCounters {
        self.teams.get(id).cloned().unwrap_or_default()
    }

    /// Player tallies, zero if the player has no entries yet.
    #[must_use]
    pub fn player(&self, id: &PlayerId) -> PlayerCounters {
        self.players.get(id).copied().unwrap_or_default()
    }

    /// Folds a live entry into the tallies. Annulled entries are ignored.
    pub fn apply(&mut self, action: &Action) {
        if !action.annulled {
            self.step(action, ActionIntent::Do);
        }
    }

    /// Takes an entry's effect back out of the tallies.
    ///
    /// Counters never go below zero: a retraction that finds nothing to
    /// remove leaves that counter untouched.
    pub fn retract(&mut self, action: &Action) {
        self.step(action, ActionIntent::Undo);
        self.prune();
    }

    /// Drops tallies that have returned to zero so a retracted history
    /// compares equal to one that never happened.
    fn prune(&mut self) {
        for team in self.teams.values_mut() {
            team.timeouts.retain(|_, used| *used > 0);
        }
        self.teams.retain(|_, team| *team != TeamCounters::default());
        self.players.retain(|_, player| *player != PlayerCounters::default());
    }

    fn step(&mut self, action: &Action, intent: ActionIntent) {
        match action.kind {
            ActionKind::Point { value } => {
                if let Some(team_id) = action.team_id {
                    let team = self.teams.entry(team_id).or_default();
                    team.score = apply_points(team.score, value, intent).unwrap_or(team.score);
                }
                if let Some(player_id) = action.player_id {
                    let player = self.players.entry(player_id).or_default();
                    player.points = apply_points(player.points, value, intent).unwrap_or(player.points);
                }
            }
            ActionKind::Foul { kind, .. } => {
                if let Some(player_id) = action.player_id {
                    let player = self.players.entry(player_id).or_default();
                    match apply_foul(player.fouls, kind, intent) {
                        Ok(outcome) => player.fouls = outcome.counters,
                        Err(e) => warn!(action_id = %action.id, error = %e, "Foul counter unchanged"),
                    }
                }
                if kind == FoulKind::Personal {
                    if let Some(team_id) = action.team_id {
                        let slot = &mut self.teams.entry(team_id).or_default().team_fouls
                            [team_foul_slot(action.quarter)];
                        *slot = match intent {
                            ActionIntent::Do => slot.saturating_add(1),
                            ActionIntent::Undo => slot.saturating_sub(1),
                        };
                    }
                }
            }
            ActionKind::CoachFoul { kind } => {
                if let Some(team_id) = action.team_id {
                    let team = self.teams.entry(team_id).or_default();
                    match apply_coach_foul(team.coach, kind, intent) {
                        Ok(outcome) => team.coach = outcome.counters,
                        Err(e) => warn!(action_id = %action.id, error = %e, "Coach foul counter unchanged"),
                    }
                }
            }
            ActionKind::Timeout => {
                if let Some(team_id) = action.team_id {
                    let team = self.teams.entry(team_id).or_default();
                    let used = team.timeouts.entry(timeout_window(action.quarter)).or_insert(0);
                    *used = match intent {
                        ActionIntent::Do => used.saturating_add(1),
                        ActionIntent::Undo => used.saturating_sub(1),
                    };
                }
            }
            ActionKind::Substitution { .. } | ActionKind::PeriodBoundary { .. } => {}
        }
    }
}

/// Rebuilds every tally by folding the live entries of a ledger in order.
#[must_use]
pub fn derive_counters(ledger: &Ledger) -> Counters {
    ledger.active().fold(Counters::default(), |mut counters, action| {
        counters.apply(action);
        counters
    })
}
