//! The match state machine.

use courtside_core::{PlayerId, Side, TeamId};
use courtside_ledger::{
    derive_counters, Action, ActionKind, ActionSelector, ActionTag, Counters, Ledger, LedgerError,
    MergeOutcome, PeriodBoundary, ScoreSnapshot,
};
use courtside_rules::{
    apply_coach_foul, apply_foul, bonus_active, check_timeout, timeout_window, timeouts_available,
    validate_free_throws, ActionIntent, CoachFoulKind, FoulKind, PointValue, Standing,
    TimeoutAllowance, REGULAR_QUARTERS, TEAM_FOUL_BONUS_THRESHOLD,
};
use tracing::{debug, info};

use crate::{Alert, Match, MatchError, MatchRecord, MatchState, Result, RosterEntry, ON_COURT};

/// What an accepted request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Whether entries were added or annulled.
    pub intent: ActionIntent,
    /// Entries appended (for [`ActionIntent::Do`]) or annulled (for
    /// [`ActionIntent::Undo`]), in order.
    pub actions: Vec<Action>,
    /// Notices for the scorekeeper.
    pub alerts: Vec<Alert>,
}

impl Applied {
    fn done(action: Action) -> Self {
        Self {
            intent: ActionIntent::Do,
            actions: vec![action],
            alerts: Vec::new(),
        }
    }

    fn undone(action: Action) -> Self {
        Self {
            intent: ActionIntent::Undo,
            actions: vec![action],
            alerts: Vec::new(),
        }
    }

    fn header_only(intent: ActionIntent) -> Self {
        Self {
            intent,
            actions: Vec::new(),
            alerts: Vec::new(),
        }
    }

    fn with_alerts(mut self, alerts: Vec<Alert>) -> Self {
        self.alerts = alerts;
        self
    }
}

/// Owns a match, its ledger and the counters derived from it.
///
/// Every request is validated in full before anything is mutated. Counters
/// are maintained incrementally; [`MatchEngine::rebuild_counters`] re-derives
/// them from the ledger.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    game: Match,
    ledger: Ledger,
    counters: Counters,
}

impl MatchEngine {
    /// Wraps a match with an empty ledger.
    #[must_use]
    pub fn new(game: Match) -> Self {
        let ledger = Ledger::new(game.id);
        Self {
            game,
            ledger,
            counters: Counters::default(),
        }
    }

    /// Rebuilds an engine from a stored match and its ledger.
    ///
    /// # Errors
    ///
    /// [`LedgerError::WrongMatch`] if the ledger belongs to another match.
    pub fn restore(game: Match, ledger: Ledger) -> Result<Self> {
        if ledger.match_id() != game.id {
            return Err(LedgerError::WrongMatch {
                expected: game.id,
                found: ledger.match_id(),
            }
            .into());
        }
        let counters = derive_counters(&ledger);
        Ok(Self {
            game,
            ledger,
            counters,
        })
    }

    /// The match.
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// The ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The counters.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Lifecycle state.
    pub fn state(&self) -> MatchState {
        self.game.state
    }

    /// Current quarter.
    pub fn quarter(&self) -> u8 {
        self.game.quarter
    }

    /// A side's score.
    pub fn score(&self, side: Side) -> u32 {
        self.counters.team(&self.team_id(side)).score
    }

    /// Both scores.
    pub fn score_snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            home: self.score(Side::Home),
            away: self.score(Side::Away),
        }
    }

    /// A side's team fouls in the current quarter.
    pub fn team_fouls(&self, side: Side) -> u8 {
        self.counters.team(&self.team_id(side)).fouls_in(self.game.quarter)
    }

    /// Whether a side is in the bonus this quarter.
    pub fn in_bonus(&self, side: Side) -> bool {
        bonus_active(self.team_fouls(side))
    }

    /// Timeouts a side has used in the current window.
    pub fn timeouts_used(&self, side: Side) -> u8 {
        self.counters
            .team(&self.team_id(side))
            .timeouts_in(timeout_window(self.game.quarter))
    }

    /// A side's timeout allowance right now.
    pub fn timeout_allowance(&self, side: Side) -> TimeoutAllowance {
        timeouts_available(
            self.game.quarter,
            self.timeouts_used(side),
            self.game.final_two_minutes,
        )
    }

    /// Where a player stands given their fouls.
    pub fn standing(&self, player_id: &PlayerId) -> Standing {
        self.counters.player(player_id).fouls.standing()
    }

    /// Whether a side's head coach is disqualified.
    pub fn coach_disqualified(&self, side: Side) -> bool {
        self.counters.team(&self.team_id(side)).coach.disqualified()
    }

    /// The row to publish.
    pub fn record(&self) -> MatchRecord {
        self.game.record(&self.counters)
    }

    fn team_id(&self, side: Side) -> TeamId {
        self.game.team(side).team_id
    }

    fn require_state(&self, action: &'static str, expected: MatchState) -> Result<()> {
        if self.game.state != expected {
            return Err(MatchError::illegal(
                action,
                format!("match is {}", self.game.state),
            ));
        }
        Ok(())
    }

    fn require_live(&self, action: &'static str) -> Result<()> {
        self.require_state(action, MatchState::InProgress)
    }

    // ==================== Roster ====================

    /// Calls up a team's roster. Only while scheduled.
    pub fn call_up(&mut self, side: Side, entries: Vec<RosterEntry>) -> Result<()> {
        self.require_state("call up players", MatchState::Scheduled)?;
        self.game.team_mut(side).call_up(entries)?;
        self.game.touch();
        Ok(())
    }

    /// Changes a jersey number. Only while scheduled.
    pub fn set_jersey(&mut self, side: Side, player_id: &PlayerId, jersey: u8) -> Result<()> {
        self.require_state("change a jersey number", MatchState::Scheduled)?;
        self.game.team_mut(side).set_jersey(player_id, jersey)?;
        self.game.touch();
        Ok(())
    }

    /// Selects a team's five starters. Only while scheduled.
    pub fn select_starters(&mut self, side: Side, starters: &[PlayerId]) -> Result<()> {
        self.require_state("select starters", MatchState::Scheduled)?;
        self.game.team_mut(side).select_starters(starters)?;
        self.game.touch();
        Ok(())
    }

    // ==================== Lifecycle ====================

    /// Tips off: `Scheduled -> InProgress`.
    ///
    /// Requires exactly five starters per team. Appends the opening period
    /// boundary.
    pub fn start(&mut self) -> Result<Applied> {
        self.require_state("start", MatchState::Scheduled)?;
        for side in Side::BOTH {
            let starters = self.game.team(side).starters().count();
            if starters != ON_COURT {
                return Err(MatchError::illegal(
                    "start",
                    format!("{side} has {starters} starters selected, 5 are required"),
                ));
            }
        }

        self.game.state = MatchState::InProgress;
        self.game.quarter = 1;
        for side in Side::BOTH {
            self.game.team_mut(side).tip_off();
        }
        let boundary = self.boundary(PeriodBoundary::Start);
        self.append(boundary.clone())?;
        info!(match_id = %self.game.id, "Match started");
        Ok(Applied::done(boundary))
    }

    /// `InProgress -> Suspended`. The reason must not be blank.
    pub fn suspend(&mut self, reason: &str) -> Result<Applied> {
        self.require_live("suspend")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(MatchError::validation("a suspension needs a reason"));
        }
        self.game.state = MatchState::Suspended;
        self.game.suspension_reason = Some(reason.to_string());
        self.game.touch();
        info!(match_id = %self.game.id, reason, "Match suspended");
        Ok(Applied::header_only(ActionIntent::Do))
    }

    /// `Suspended -> InProgress`, clearing the reason.
    pub fn resume(&mut self) -> Result<Applied> {
        self.require_state("resume", MatchState::Suspended)?;
        self.game.state = MatchState::InProgress;
        self.game.suspension_reason = None;
        self.game.touch();
        info!(match_id = %self.game.id, "Match resumed");
        Ok(Applied::header_only(ActionIntent::Do))
    }

    /// `InProgress -> Finished`. Refused while the scores are level.
    pub fn finish(&mut self) -> Result<Applied> {
        self.require_live("finish")?;
        let score = self.score_snapshot();
        if score.home == score.away {
            return Err(MatchError::illegal(
                "finish",
                format!("scores are level at {score}, play overtime"),
            ));
        }

        let boundary = self.boundary(PeriodBoundary::End).with_score(score);
        self.append(boundary.clone())?;
        self.game.state = MatchState::Finished;
        info!(match_id = %self.game.id, %score, "Match finished");
        Ok(Applied::done(boundary))
    }

    /// Moves to the next quarter, or back to the previous one on undo.
    ///
    /// Advancing appends the period end (with the score) and the next
    /// period start, and clears the final-two-minutes rule when the timeout
    /// window changes. Overtime is only played from a tie. A guest on court
    /// whose reinforcement cap rules out the next quarter blocks the advance
    /// until substituted. Reverting writes nothing to the ledger and restores
    /// a final-two-minutes rule the reverted quarter cleared.
    pub fn advance_quarter(&mut self, intent: ActionIntent) -> Result<Applied> {
        self.require_live("change quarter")?;
        match intent {
            ActionIntent::Do => self.next_quarter(),
            ActionIntent::Undo => self.previous_quarter(),
        }
    }

    fn next_quarter(&mut self) -> Result<Applied> {
        let from = self.game.quarter;
        let score = self.score_snapshot();
        if from >= REGULAR_QUARTERS && score.home != score.away {
            return Err(MatchError::illegal(
                "start overtime",
                format!("scores are not level at {score}"),
            ));
        }
        let to = from
            .checked_add(1)
            .ok_or_else(|| MatchError::validation("too many periods"))?;
        for side in Side::BOTH {
            if let Some(guest) = self.game.team(side).over_cap_on_court(to) {
                return Err(MatchError::illegal(
                    "change quarter",
                    format!(
                        "#{} ({side}) has used up their reinforcement quarters, substitute them first",
                        guest.jersey
                    ),
                ));
            }
        }

        let end = self.boundary(PeriodBoundary::End).with_score(score);
        self.append(end.clone())?;

        self.game.quarter = to;
        if timeout_window(from) != timeout_window(to) && self.game.final_two_minutes {
            self.game.final_two_minutes = false;
            self.game.final_two_minutes_cleared_at = Some(to);
        }
        for side in Side::BOTH {
            self.game.team_mut(side).open_quarter(to);
        }
        let start = self.boundary(PeriodBoundary::Start);
        self.append(start.clone())?;

        info!(match_id = %self.game.id, quarter = to, %score, "Quarter advanced");
        Ok(Applied {
            intent: ActionIntent::Do,
            actions: vec![end, start],
            alerts: Vec::new(),
        })
    }

    fn previous_quarter(&mut self) -> Result<Applied> {
        let from = self.game.quarter;
        if from <= 1 {
            return Err(MatchError::validation("already in the first quarter"));
        }
        let to = from - 1;
        self.game.quarter = to;
        if self.game.final_two_minutes_cleared_at == Some(from) {
            self.game.final_two_minutes = true;
            self.game.final_two_minutes_cleared_at = None;
        }
        for side in Side::BOTH {
            let team = self.game.team_mut(side);
            for player in &mut team.players {
                player.uncount_quarter(from);
                if team.on_court.contains(&player.player_id) {
                    player.count_quarter(to);
                }
            }
        }
        self.game.touch();
        info!(match_id = %self.game.id, quarter = to, "Quarter reverted");
        Ok(Applied::header_only(ActionIntent::Undo))
    }

    /// Activates the reduced allowance for the rest of the current half.
    pub fn activate_final_two_minutes(&mut self) -> Result<()> {
        self.require_live("activate the final two minutes")?;
        if timeout_window(self.game.quarter) != timeout_window(REGULAR_QUARTERS) {
            return Err(MatchError::illegal(
                "activate the final two minutes",
                format!("quarter {} is not in the second half", self.game.quarter),
            ));
        }
        self.game.final_two_minutes = true;
        self.game.touch();
        debug!(match_id = %self.game.id, "Final two minutes rule active");
        Ok(())
    }

    // ==================== Scoring actions ====================

    /// Records (or takes back) points for a player.
    pub fn record_point(
        &mut self,
        side: Side,
        player_id: &PlayerId,
        value: PointValue,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.require_live("record points")?;
        self.game.team(side).require(player_id)?;
        let team_id = self.team_id(side);

        match intent {
            ActionIntent::Do => {
                let action = self
                    .action(ActionKind::Point { value })
                    .for_team(team_id)
                    .by_player(*player_id);
                Ok(Applied::done(self.commit(action)?))
            }
            ActionIntent::Undo => self.undo_latest(ActionSelector {
                team_id: Some(team_id),
                player_id: Some(*player_id),
                tag: ActionTag::Point(value),
            }),
        }
    }

    /// Records (or takes back) a player foul.
    ///
    /// A foul that makes the player ineligible is always recorded and
    /// raises an alert.
    pub fn record_foul(
        &mut self,
        side: Side,
        player_id: &PlayerId,
        kind: FoulKind,
        free_throws: u8,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.require_live("record a foul")?;
        let jersey = self.game.team(side).require(player_id)?.jersey;
        let team_id = self.team_id(side);

        if intent.is_undo() {
            return self.undo_latest(ActionSelector {
                team_id: Some(team_id),
                player_id: Some(*player_id),
                tag: ActionTag::Foul(kind),
            });
        }

        let free_throws = validate_free_throws(free_throws)?;
        let outcome = apply_foul(self.counters.player(player_id).fouls, kind, intent)?;
        let action = self
            .action(ActionKind::Foul {
                kind,
                free_throws,
                sequence: outcome.sequence,
            })
            .for_team(team_id)
            .by_player(*player_id);
        let action = self.commit(action)?;

        let mut alerts = Vec::new();
        if outcome.standing != outcome.previous {
            match outcome.standing {
                Standing::Disqualified => alerts.push(Alert::PlayerDisqualified {
                    side,
                    player_id: *player_id,
                    jersey,
                }),
                Standing::FouledOut => alerts.push(Alert::PlayerFouledOut {
                    side,
                    player_id: *player_id,
                    jersey,
                }),
                Standing::Eligible => {}
            }
        }
        if kind.counts_toward_team()
            && self.team_fouls(side) == TEAM_FOUL_BONUS_THRESHOLD
        {
            alerts.push(Alert::TeamInBonus {
                side,
                quarter: self.game.quarter,
            });
        }
        for alert in &alerts {
            info!(match_id = %self.game.id, %alert, "Alert raised");
        }

        Ok(Applied::done(action).with_alerts(alerts))
    }

    /// Records (or takes back) a coach or bench foul.
    pub fn record_coach_foul(
        &mut self,
        side: Side,
        kind: CoachFoulKind,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.require_live("record a coach foul")?;
        let team_id = self.team_id(side);

        if intent.is_undo() {
            return self.undo_latest(ActionSelector {
                team_id: Some(team_id),
                player_id: None,
                tag: ActionTag::CoachFoul(kind),
            });
        }

        let outcome = apply_coach_foul(self.counters.team(&team_id).coach, kind, intent)?;
        let action = self.action(ActionKind::CoachFoul { kind }).for_team(team_id);
        let action = self.commit(action)?;

        let alerts = if outcome.newly_disqualified() {
            info!(match_id = %self.game.id, %side, "Coach disqualified");
            vec![Alert::CoachDisqualified { side }]
        } else {
            Vec::new()
        };
        Ok(Applied::done(action).with_alerts(alerts))
    }

    /// Calls (or takes back) a timeout. Refused once the allowance is spent.
    pub fn call_timeout(&mut self, side: Side, intent: ActionIntent) -> Result<Applied> {
        self.require_live("call a timeout")?;
        let team_id = self.team_id(side);

        if intent.is_undo() {
            return self.undo_latest(ActionSelector {
                team_id: Some(team_id),
                player_id: None,
                tag: ActionTag::Timeout,
            });
        }

        check_timeout(
            self.game.quarter,
            self.timeouts_used(side),
            self.game.final_two_minutes,
            intent,
        )?;
        let action = self.action(ActionKind::Timeout).for_team(team_id);
        Ok(Applied::done(self.commit(action)?))
    }

    /// Swaps a player on court for one on the bench, or swaps the latest
    /// such substitution back.
    pub fn substitute(
        &mut self,
        side: Side,
        entering: &PlayerId,
        leaving: &PlayerId,
        intent: ActionIntent,
    ) -> Result<Applied> {
        self.require_live("substitute")?;
        let team = self.game.team(side);
        team.require(entering)?;
        team.require(leaving)?;
        if entering == leaving {
            return Err(MatchError::validation("a player cannot replace themselves"));
        }

        match intent {
            ActionIntent::Do => self.substitute_in(side, *entering, *leaving),
            ActionIntent::Undo => self.substitute_back(side, *entering, *leaving),
        }
    }

    fn substitute_in(&mut self, side: Side, entering: PlayerId, leaving: PlayerId) -> Result<Applied> {
        let quarter = self.game.quarter;
        let team = self.game.team(side);
        if !team.is_on_court(&leaving) {
            return Err(MatchError::illegal("substitute", "leaving player is not on court"));
        }
        if team.is_on_court(&entering) {
            return Err(MatchError::illegal("substitute", "entering player is already on court"));
        }
        match self.standing(&entering) {
            Standing::Eligible => {}
            Standing::FouledOut => {
                return Err(MatchError::illegal("substitute", "entering player has fouled out"))
            }
            Standing::Disqualified => {
                return Err(MatchError::illegal("substitute", "entering player is disqualified"))
            }
        }
        if !team.require(&entering)?.may_play_in(quarter) {
            return Err(MatchError::illegal(
                "substitute",
                "entering player has used up their reinforcement quarters",
            ));
        }

        let team_id = team.team_id;
        let action = self
            .action(ActionKind::Substitution { entering, leaving })
            .for_team(team_id)
            .by_player(entering);
        let action = self.commit(action)?;

        let team = self.game.team_mut(side);
        team.on_court.remove(&leaving);
        team.on_court.insert(entering);
        team.require_mut(&entering)?.count_quarter(quarter);
        debug!(match_id = %self.game.id, %side, %entering, %leaving, "Substitution");
        Ok(Applied::done(action))
    }

    fn substitute_back(&mut self, side: Side, entering: PlayerId, leaving: PlayerId) -> Result<Applied> {
        let team = self.game.team(side);
        let selector = ActionSelector {
            team_id: Some(team.team_id),
            player_id: Some(entering),
            tag: ActionTag::Substitution,
        };
        let latest = self
            .ledger
            .find_latest(&selector)
            .ok_or_else(|| MatchError::validation(format!("no substitution to undo: {selector}")))?;
        let ActionKind::Substitution {
            leaving: recorded_leaving,
            ..
        } = latest.kind
        else {
            return Err(MatchError::validation("ledger entry is not a substitution"));
        };
        if recorded_leaving != leaving {
            return Err(MatchError::validation(
                "the latest substitution for this player replaced someone else",
            ));
        }
        if !team.is_on_court(&entering) || team.is_on_court(&leaving) {
            return Err(MatchError::illegal(
                "undo substitution",
                "the lineup has changed since",
            ));
        }
        let quarter = latest.quarter;
        let id = latest.id;

        let annulled = self.ledger.annul(&id)?.clone();
        self.counters.retract(&annulled);

        // Keep the quarter counted if the player opened it or came on again.
        let still_counted = self.game.team(side).opening_lineup.contains(&entering)
            || self.ledger.find_latest(&selector).is_some_and(|a| a.quarter == quarter);
        let current = self.game.quarter;
        let team = self.game.team_mut(side);
        team.on_court.remove(&entering);
        team.on_court.insert(leaving);
        if !still_counted && quarter == current {
            team.require_mut(&entering)?.uncount_quarter(quarter);
        }
        self.game.touch();
        debug!(match_id = %self.game.id, %side, %entering, %leaving, "Substitution undone");
        Ok(Applied::undone(annulled))
    }

    // ==================== Ledger plumbing ====================

    fn action(&self, kind: ActionKind) -> Action {
        Action::new(self.game.id, self.game.quarter, kind)
    }

    fn boundary(&self, boundary: PeriodBoundary) -> Action {
        self.action(ActionKind::PeriodBoundary { boundary })
    }

    fn append(&mut self, action: Action) -> Result<()> {
        self.ledger.append(action)?;
        self.game.touch();
        Ok(())
    }

    /// Applies an entry to the counters, stamps the resulting score and
    /// appends it.
    fn commit(&mut self, action: Action) -> Result<Action> {
        self.counters.apply(&action);
        let action = action.with_score(self.score_snapshot());
        if let Err(e) = self.append(action.clone()) {
            self.counters.retract(&action);
            return Err(e);
        }
        debug!(
            match_id = %self.game.id,
            action_id = %action.id,
            tag = %action.kind.tag(),
            "Action recorded"
        );
        Ok(action)
    }

    fn undo_latest(&mut self, selector: ActionSelector) -> Result<Applied> {
        let annulled = self.ledger.annul_latest(&selector).map_err(|e| match e {
            LedgerError::NoMatchingEntry(what) => {
                MatchError::validation(format!("nothing to undo: {what}"))
            }
            other => other.into(),
        })?;
        self.counters.retract(&annulled);
        self.game.touch();
        debug!(match_id = %self.game.id, action_id = %annulled.id, "Action undone");
        Ok(Applied::undone(annulled))
    }

    // ==================== Reconciliation ====================

    /// Folds an authoritative ledger row into the local state.
    pub fn merge_remote(&mut self, action: Action) -> Result<MergeOutcome> {
        let outcome = self.ledger.merge_remote(action.clone())?;
        match outcome {
            MergeOutcome::Inserted => self.counters.apply(&action),
            MergeOutcome::Annulled => self.counters.retract(&action),
            MergeOutcome::Unchanged => {}
        }
        Ok(outcome)
    }

    /// Replaces the ledger with a refetched copy and re-derives counters.
    pub fn replace_ledger(&mut self, actions: Vec<Action>) -> Result<()> {
        self.ledger.replace_all(actions)?;
        self.rebuild_counters();
        Ok(())
    }

    /// Adopts the header fields of an authoritative row.
    pub fn adopt_record(&mut self, record: &MatchRecord) {
        self.game.adopt(record);
    }

    /// Re-derives every counter from the ledger.
    pub fn rebuild_counters(&mut self) {
        let rebuilt = derive_counters(&self.ledger);
        if rebuilt != self.counters {
            info!(match_id = %self.game.id, "Counters rebuilt from ledger");
        }
        self.counters = rebuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TeamSheet;
    use courtside_core::MatchId;
    use pretty_assertions::assert_eq;

    struct Fixture {
        engine: MatchEngine,
        home: Vec<PlayerId>,
        away: Vec<PlayerId>,
    }

    fn fixture() -> Fixture {
        let mut engine = MatchEngine::new(Match::new(
            MatchId::generate(),
            TeamSheet::new(TeamId::generate(), "Home"),
            TeamSheet::new(TeamId::generate(), "Away"),
        ));
        let mut ids = Vec::new();
        for side in Side::BOTH {
            let roster: Vec<RosterEntry> = (0..8)
                .map(|i| RosterEntry::new(PlayerId::generate(), format!("{side} {i}"), i))
                .collect();
            let players: Vec<PlayerId> = roster.iter().map(|r| r.player_id).collect();
            engine.call_up(side, roster).unwrap();
            engine.select_starters(side, &players[..5]).unwrap();
            ids.push(players);
        }
        let away = ids.pop().unwrap();
        let home = ids.pop().unwrap();
        Fixture { engine, home, away }
    }

    fn started() -> Fixture {
        let mut f = fixture();
        f.engine.start().unwrap();
        f
    }

    #[test]
    fn start_requires_five_starters() {
        let mut engine = MatchEngine::new(Match::new(
            MatchId::generate(),
            TeamSheet::new(TeamId::generate(), "Home"),
            TeamSheet::new(TeamId::generate(), "Away"),
        ));
        let err = engine.start().unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { action: "start", .. }));
        assert_eq!(engine.state(), MatchState::Scheduled);
    }

    #[test]
    fn start_opens_first_quarter() {
        let f = started();
        assert_eq!(f.engine.state(), MatchState::InProgress);
        assert_eq!(f.engine.ledger().len(), 1);
        let starter = f.engine.game().home.player(&f.home[0]).unwrap();
        assert!(starter.participated);
        assert!(f.engine.game().home.is_on_court(&f.home[0]));
        assert!(!f.engine.game().home.is_on_court(&f.home[5]));
    }

    #[test]
    fn actions_require_live_match() {
        let mut f = fixture();
        let err = f
            .engine
            .record_point(Side::Home, &f.home[0], PointValue::Two, ActionIntent::Do)
            .unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { .. }));
    }

    #[test]
    fn jersey_changes_only_before_tip_off() {
        let mut f = fixture();
        f.engine.set_jersey(Side::Home, &f.home[0], 42).unwrap();
        f.engine.start().unwrap();
        assert!(f.engine.set_jersey(Side::Home, &f.home[0], 43).is_err());
        assert_eq!(f.engine.game().home.player(&f.home[0]).unwrap().jersey, 42);
    }

    #[test]
    fn point_and_undo() {
        let mut f = started();
        let p = f.home[0];
        let applied = f
            .engine
            .record_point(Side::Home, &p, PointValue::Three, ActionIntent::Do)
            .unwrap();
        assert_eq!(applied.actions[0].score, Some(ScoreSnapshot { home: 3, away: 0 }));
        assert_eq!(f.engine.score(Side::Home), 3);

        let undone = f
            .engine
            .record_point(Side::Home, &p, PointValue::Three, ActionIntent::Undo)
            .unwrap();
        assert_eq!(undone.intent, ActionIntent::Undo);
        assert!(undone.actions[0].annulled);
        assert_eq!(f.engine.score(Side::Home), 0);
    }

    #[test]
    fn undo_without_matching_entry_is_validation_error() {
        let mut f = started();
        let err = f
            .engine
            .record_point(Side::Home, &f.home[0], PointValue::Two, ActionIntent::Undo)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.engine.ledger().len(), 1);
    }

    #[test]
    fn technical_then_unsportsmanlike_disqualifies_and_undo_reinstates() {
        let mut f = started();
        let p = f.home[1];
        f.engine
            .record_foul(Side::Home, &p, FoulKind::Technical, 1, ActionIntent::Do)
            .unwrap();
        let applied = f
            .engine
            .record_foul(Side::Home, &p, FoulKind::Unsportsmanlike, 2, ActionIntent::Do)
            .unwrap();
        assert!(matches!(applied.alerts[0], Alert::PlayerDisqualified { .. }));
        assert_eq!(f.engine.standing(&p), Standing::Disqualified);

        f.engine
            .record_foul(Side::Home, &p, FoulKind::Unsportsmanlike, 0, ActionIntent::Undo)
            .unwrap();
        assert_eq!(f.engine.standing(&p), Standing::Eligible);
        assert_eq!(f.engine.counters().player(&p).fouls.technical, 1);
    }

    #[test]
    fn too_many_free_throws_rejected_before_mutation() {
        let mut f = started();
        let err = f
            .engine
            .record_foul(Side::Away, &f.away[0], FoulKind::Personal, 4, ActionIntent::Do)
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(f.engine.team_fouls(Side::Away), 0);
    }

    #[test]
    fn bonus_alert_on_fourth_team_foul_only() {
        let mut f = started();
        for i in 0..3 {
            let applied = f
                .engine
                .record_foul(Side::Away, &f.away[i], FoulKind::Personal, 0, ActionIntent::Do)
                .unwrap();
            assert!(applied.alerts.is_empty());
            assert!(!f.engine.in_bonus(Side::Away));
        }
        let applied = f
            .engine
            .record_foul(Side::Away, &f.away[3], FoulKind::Personal, 2, ActionIntent::Do)
            .unwrap();
        assert_eq!(
            applied.alerts,
            vec![Alert::TeamInBonus {
                side: Side::Away,
                quarter: 1
            }]
        );
        assert!(f.engine.in_bonus(Side::Away));
    }

    #[test]
    fn technical_fouls_do_not_feed_team_fouls() {
        let mut f = started();
        f.engine
            .record_foul(Side::Home, &f.home[0], FoulKind::Technical, 1, ActionIntent::Do)
            .unwrap();
        assert_eq!(f.engine.team_fouls(Side::Home), 0);
    }

    #[test]
    fn fifth_foul_fouls_out_and_blocks_reentry() {
        let mut f = started();
        let p = f.home[0];
        for _ in 0..4 {
            f.engine
                .record_foul(Side::Home, &p, FoulKind::Personal, 0, ActionIntent::Do)
                .unwrap();
        }
        let applied = f
            .engine
            .record_foul(Side::Home, &p, FoulKind::Personal, 0, ActionIntent::Do)
            .unwrap();
        assert!(applied
            .alerts
            .iter()
            .any(|a| matches!(a, Alert::PlayerFouledOut { .. })));

        f.engine
            .substitute(Side::Home, &f.home[5], &p, ActionIntent::Do)
            .unwrap();
        let err = f
            .engine
            .substitute(Side::Home, &p, &f.home[1], ActionIntent::Do)
            .unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { .. }));
    }

    #[test]
    fn coach_disqualified_on_second_technical() {
        let mut f = started();
        let first = f
            .engine
            .record_coach_foul(Side::Home, CoachFoulKind::Technical, ActionIntent::Do)
            .unwrap();
        assert!(first.alerts.is_empty());
        let second = f
            .engine
            .record_coach_foul(Side::Home, CoachFoulKind::Technical, ActionIntent::Do)
            .unwrap();
        assert_eq!(second.alerts, vec![Alert::CoachDisqualified { side: Side::Home }]);
        assert!(f.engine.coach_disqualified(Side::Home));

        f.engine
            .record_coach_foul(Side::Home, CoachFoulKind::Technical, ActionIntent::Undo)
            .unwrap();
        assert!(!f.engine.coach_disqualified(Side::Home));
    }

    #[test]
    fn timeouts_limited_and_reset_at_half() {
        let mut f = started();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        f.engine.call_timeout(Side::Home, ActionIntent::Do).unwrap();
        f.engine.call_timeout(Side::Away, ActionIntent::Do).unwrap();
        f.engine.call_timeout(Side::Home, ActionIntent::Do).unwrap();
        let err = f.engine.call_timeout(Side::Home, ActionIntent::Do).unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { .. }));

        f.engine.call_timeout(Side::Home, ActionIntent::Undo).unwrap();
        assert_eq!(f.engine.timeouts_used(Side::Home), 1);

        // Quarter 2 -> 3 resets both sides regardless of prior count.
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        assert_eq!(f.engine.timeouts_used(Side::Home), 0);
        assert_eq!(f.engine.timeouts_used(Side::Away), 0);
        assert_eq!(f.engine.timeout_allowance(Side::Home).max, 3);

        // Reverting does not reset; it shows the window's real count.
        f.engine.advance_quarter(ActionIntent::Undo).unwrap();
        assert_eq!(f.engine.quarter(), 2);
        assert_eq!(f.engine.timeouts_used(Side::Home), 1);
    }

    #[test]
    fn quarter_change_appends_end_then_start() {
        let mut f = started();
        f.engine
            .record_point(Side::Home, &f.home[0], PointValue::Two, ActionIntent::Do)
            .unwrap();
        let applied = f.engine.advance_quarter(ActionIntent::Do).unwrap();

        assert_eq!(applied.actions.len(), 2);
        assert_eq!(
            applied.actions[0].kind,
            ActionKind::PeriodBoundary {
                boundary: PeriodBoundary::End
            }
        );
        assert_eq!(applied.actions[0].quarter, 1);
        assert_eq!(applied.actions[0].score, Some(ScoreSnapshot { home: 2, away: 0 }));
        assert_eq!(applied.actions[1].quarter, 2);

        let before = f.engine.ledger().len();
        let reverted = f.engine.advance_quarter(ActionIntent::Undo).unwrap();
        assert!(reverted.actions.is_empty());
        assert_eq!(f.engine.ledger().len(), before);
    }

    #[test]
    fn final_two_minutes_caps_second_half() {
        let mut f = started();
        assert!(f.engine.activate_final_two_minutes().is_err());
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        f.engine.activate_final_two_minutes().unwrap();
        assert_eq!(f.engine.timeout_allowance(Side::Home).max, 2);
        assert!(f.engine.record().final_two_minutes);
    }

    #[test]
    fn overtime_only_from_a_tie_with_one_timeout() {
        let mut f = started();
        for _ in 0..3 {
            f.engine.advance_quarter(ActionIntent::Do).unwrap();
        }
        f.engine
            .record_point(Side::Home, &f.home[0], PointValue::One, ActionIntent::Do)
            .unwrap();
        assert!(f.engine.advance_quarter(ActionIntent::Do).is_err());

        f.engine
            .record_point(Side::Away, &f.away[0], PointValue::One, ActionIntent::Do)
            .unwrap();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        assert_eq!(f.engine.quarter(), 5);
        f.engine.call_timeout(Side::Away, ActionIntent::Do).unwrap();
        assert!(f.engine.call_timeout(Side::Away, ActionIntent::Do).is_err());
    }

    #[test]
    fn finish_refused_on_tie() {
        let mut f = started();
        let err = f.engine.finish().unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { action: "finish", .. }));

        f.engine
            .record_point(Side::Away, &f.away[2], PointValue::Two, ActionIntent::Do)
            .unwrap();
        f.engine.finish().unwrap();
        assert_eq!(f.engine.state(), MatchState::Finished);
    }

    #[test]
    fn suspend_needs_reason_and_resume_clears_it() {
        let mut f = started();
        assert!(f.engine.suspend("   ").unwrap_err().is_validation());
        f.engine.suspend("floor is wet").unwrap();
        assert_eq!(f.engine.record().suspension_reason.as_deref(), Some("floor is wet"));
        assert!(f
            .engine
            .record_point(Side::Home, &f.home[0], PointValue::Two, ActionIntent::Do)
            .is_err());

        f.engine.resume().unwrap();
        assert_eq!(f.engine.state(), MatchState::InProgress);
        assert_eq!(f.engine.record().suspension_reason, None);
    }

    #[test]
    fn substitution_and_undo_swap_back() {
        let mut f = started();
        let (bench, starter) = (f.home[6], f.home[0]);
        f.engine
            .substitute(Side::Home, &bench, &starter, ActionIntent::Do)
            .unwrap();
        assert!(f.engine.game().home.is_on_court(&bench));
        assert!(f.engine.game().home.player(&bench).unwrap().participated);

        f.engine
            .substitute(Side::Home, &bench, &starter, ActionIntent::Undo)
            .unwrap();
        let home = &f.engine.game().home;
        assert!(home.is_on_court(&starter));
        assert!(!home.is_on_court(&bench));
        assert!(!home.player(&bench).unwrap().participated);
    }

    #[test]
    fn reinforcement_cap_blocks_entry() {
        let mut engine = MatchEngine::new(Match::new(
            MatchId::generate(),
            TeamSheet::new(TeamId::generate(), "Home"),
            TeamSheet::new(TeamId::generate(), "Away"),
        ));
        let mut home: Vec<RosterEntry> = (0..6)
            .map(|i| RosterEntry::new(PlayerId::generate(), format!("H{i}"), i))
            .collect();
        home[5] = home[5].clone().reinforcement(1);
        let guest = home[5].player_id;
        let starters: Vec<PlayerId> = home[..5].iter().map(|r| r.player_id).collect();
        engine.call_up(Side::Home, home).unwrap();
        engine.select_starters(Side::Home, &starters).unwrap();

        let away: Vec<RosterEntry> = (0..5)
            .map(|i| RosterEntry::new(PlayerId::generate(), format!("A{i}"), i))
            .collect();
        let away_ids: Vec<PlayerId> = away.iter().map(|r| r.player_id).collect();
        engine.call_up(Side::Away, away).unwrap();
        engine.select_starters(Side::Away, &away_ids).unwrap();
        engine.start().unwrap();

        engine
            .substitute(Side::Home, &guest, &starters[0], ActionIntent::Do)
            .unwrap();
        engine
            .substitute(Side::Home, &starters[0], &guest, ActionIntent::Do)
            .unwrap();
        engine.advance_quarter(ActionIntent::Do).unwrap();
        let err = engine
            .substitute(Side::Home, &guest, &starters[1], ActionIntent::Do)
            .unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { .. }));
    }

    #[test]
    fn capped_guest_on_court_blocks_quarter_change() {
        let mut f = fixture();
        let mut home: Vec<RosterEntry> = (0..6)
            .map(|i| RosterEntry::new(PlayerId::generate(), format!("H{i}"), i))
            .collect();
        home[5] = home[5].clone().reinforcement(1);
        let guest = home[5].player_id;
        let ids: Vec<PlayerId> = home.iter().map(|r| r.player_id).collect();
        f.engine.call_up(Side::Home, home).unwrap();
        f.engine.select_starters(Side::Home, &ids[..5]).unwrap();
        f.engine.start().unwrap();

        f.engine
            .substitute(Side::Home, &guest, &ids[0], ActionIntent::Do)
            .unwrap();
        let before = f.engine.ledger().len();
        let err = f.engine.advance_quarter(ActionIntent::Do).unwrap_err();
        assert!(matches!(err, MatchError::IllegalTransition { action: "change quarter", .. }));
        assert_eq!(f.engine.quarter(), 1);
        assert_eq!(f.engine.ledger().len(), before);
        assert_eq!(f.engine.game().home.player(&guest).unwrap().quarters_played(), 1);

        f.engine
            .substitute(Side::Home, &ids[0], &guest, ActionIntent::Do)
            .unwrap();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        assert_eq!(f.engine.quarter(), 2);
        assert_eq!(f.engine.game().home.player(&guest).unwrap().quarters_played(), 1);
    }

    #[test]
    fn reverting_overtime_restores_final_two_minutes() {
        let mut f = started();
        for _ in 0..3 {
            f.engine.advance_quarter(ActionIntent::Do).unwrap();
        }
        f.engine.activate_final_two_minutes().unwrap();
        f.engine.advance_quarter(ActionIntent::Do).unwrap();
        assert!(!f.engine.record().final_two_minutes);
        f.engine.advance_quarter(ActionIntent::Do).unwrap();

        f.engine.advance_quarter(ActionIntent::Undo).unwrap();
        assert_eq!(f.engine.quarter(), 5);
        assert!(!f.engine.record().final_two_minutes);
        f.engine.advance_quarter(ActionIntent::Undo).unwrap();
        assert_eq!(f.engine.quarter(), 4);
        assert!(f.engine.record().final_two_minutes);
        assert_eq!(f.engine.timeout_allowance(Side::Away).max, 2);
    }

    #[test]
    fn rebuild_counters_matches_incremental() {
        let mut f = started();
        f.engine
            .record_point(Side::Home, &f.home[0], PointValue::Two, ActionIntent::Do)
            .unwrap();
        f.engine
            .record_foul(Side::Away, &f.away[1], FoulKind::Personal, 2, ActionIntent::Do)
            .unwrap();
        f.engine
            .record_point(Side::Away, &f.away[1], PointValue::One, ActionIntent::Do)
            .unwrap();
        f.engine
            .record_point(Side::Away, &f.away[1], PointValue::One, ActionIntent::Undo)
            .unwrap();

        let before = f.engine.counters().clone();
        f.engine.rebuild_counters();
        assert_eq!(f.engine.counters(), &before);
    }

    #[test]
    fn merge_remote_updates_counters() {
        let mut f = started();
        let team_id = f.engine.game().away.team_id;
        let mut remote = Action::new(
            f.engine.game().id,
            1,
            ActionKind::Point {
                value: PointValue::Three,
            },
        )
        .for_team(team_id)
        .by_player(f.away[0]);

        assert_eq!(f.engine.merge_remote(remote.clone()).unwrap(), MergeOutcome::Inserted);
        assert_eq!(f.engine.score(Side::Away), 3);

        remote.annulled = true;
        assert_eq!(f.engine.merge_remote(remote).unwrap(), MergeOutcome::Annulled);
        assert_eq!(f.engine.score(Side::Away), 0);
    }
}
