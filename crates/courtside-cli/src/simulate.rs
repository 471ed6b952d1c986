//! A scripted match against the in-memory backend.
//!
//! The script is driven by a seeded RNG, so a seed reproduces the same
//! sequence of scoring-table decisions. Connectivity can be dropped for a
//! range of actions to watch the offline queue fill and drain.

use anyhow::Result;
use courtside_core::{DeviceId, MatchId, PlayerId, Side, TeamId};
use courtside_match::{Alert, Match, MatchEngine, MatchRecord, RosterEntry, TeamSheet};
use courtside_rules::{ActionIntent, FoulKind, PointValue, Standing, REGULAR_QUARTERS};
use courtside_sync::{
    BackendStats, DrainReport, InMemoryBackend, OfflineQueue, ScorekeeperSession,
    SpectatorSession, SyncConfig, SyncError, SyncStatus,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info};

/// Manual syncs are attempted this often while the network is down.
const OFFLINE_SYNC_EVERY: u32 = 15;

const HOME_PLAYERS: [&str; 10] = [
    "Ana Ruiz", "Bea Costa", "Carla Mendes", "Dora Lima", "Eva Prado",
    "Fia Souza", "Gil Rocha", "Hana Alves", "Ines Duarte", "Jade Pires",
];
const AWAY_PLAYERS: [&str; 10] = [
    "Kai Moreno", "Lia Santos", "Mia Torres", "Nina Vidal", "Olga Reis",
    "Paz Nunes", "Rita Cruz", "Sara Lopes", "Tina Faria", "Uma Gomes",
];

/// What to play.
#[derive(Debug, Clone)]
pub struct Script {
    /// Scoring-table actions before the final buzzer.
    pub actions: u32,
    /// Action number at which the network drops.
    pub offline_from: Option<u32>,
    /// Action number at which the network returns.
    pub offline_until: Option<u32>,
    /// RNG seed.
    pub seed: u64,
}

/// Everything the simulation produced.
#[derive(Debug)]
pub struct Outcome {
    pub engine: MatchEngine,
    pub record: MatchRecord,
    pub backend_record: Option<MatchRecord>,
    pub spectator_score: (u32, u32),
    pub status: SyncStatus,
    pub backend: BackendStats,
    pub drains: Vec<DrainReport>,
    pub alerts: Vec<Alert>,
    pub recorded: u32,
    pub refused: u32,
}

#[derive(Debug, Default)]
struct Tally {
    drains: Vec<DrainReport>,
    alerts: Vec<Alert>,
    recorded: u32,
    refused: u32,
}

/// Plays the script and prints the box score, queue status and final row.
pub async fn run(config: &SyncConfig, script: &Script) -> Result<()> {
    println!("Simulating {} actions (seed {})", script.actions, script.seed);
    let outcome = play(config, script).await?;
    print_outcome(&outcome)
}

/// Plays the script.
pub async fn play(config: &SyncConfig, script: &Script) -> Result<Outcome> {
    info!(seed = script.seed, actions = script.actions, "Simulation started");
    let mut rng = StdRng::seed_from_u64(script.seed);

    let game = Match::new(
        MatchId::generate(),
        team("Harbour Lions", "Coach Marta", &HOME_PLAYERS)?,
        team("Valley Hawks", "Coach Pedro", &AWAY_PLAYERS)?,
    );
    let match_id = game.id;
    let backend = Arc::new(InMemoryBackend::new());
    backend.register_match(&game);

    let session = ScorekeeperSession::open(
        backend.clone(),
        DeviceId::generate(),
        OfflineQueue::in_memory(config.retry_ceiling),
        config,
        game,
    )
    .await?;
    let spectator = SpectatorSession::open(backend.clone(), match_id, config.retry.clone()).await?;
    session.start().await?;

    let per_quarter = (script.actions / u32::from(REGULAR_QUARTERS)).max(1);
    let mut tally = Tally::default();

    for step in 1..=script.actions {
        if script.offline_from == Some(step) {
            backend.set_online(false);
            println!("[{step:>3}] network down");
        }
        if script.offline_until == Some(step) && !backend.is_online() {
            backend.set_online(true);
            println!("[{step:>3}] network back");
            reconnect(&session, &mut tally).await?;
        }
        if !backend.is_online() && step % OFFLINE_SYNC_EVERY == 0 {
            tally.drains.push(session.sync_now().await?);
        }

        play_one(&session, &mut rng, &mut tally).await?;

        if step % per_quarter == 0 && session.record().quarter < REGULAR_QUARTERS {
            next_quarter(&session).await?;
            debug!(quarter = session.record().quarter, "Quarter changed");
        }
        session.pump_realtime()?;
        spectator.pump()?;
    }

    if !backend.is_online() {
        backend.set_online(true);
        println!("[end] network back");
        reconnect(&session, &mut tally).await?;
    }
    final_buzzer(&session, &mut rng).await?;

    spectator.on_foreground().await?;
    spectator.pump()?;

    let outcome = Outcome {
        engine: session.engine(),
        record: session.record(),
        backend_record: backend.record(&match_id),
        spectator_score: (spectator.score(Side::Home), spectator.score(Side::Away)),
        status: session.status(),
        backend: backend.stats(),
        drains: tally.drains,
        alerts: tally.alerts,
        recorded: tally.recorded,
        refused: tally.refused,
    };
    session.teardown();
    spectator.teardown();
    info!(match_id = %match_id, "Simulation finished");
    Ok(outcome)
}

fn team(name: &str, coach: &str, players: &[&str]) -> Result<TeamSheet> {
    let mut sheet = TeamSheet::new(TeamId::generate(), name).with_coach(coach);
    let mut entries: Vec<RosterEntry> = Vec::with_capacity(players.len());
    for (jersey, player) in (4u8..).zip(players) {
        entries.push(RosterEntry::new(PlayerId::generate(), *player, jersey));
    }
    // The last player is a guest limited to two quarters.
    if let Some(guest) = entries.pop() {
        entries.push(guest.reinforcement(2));
    }
    let starters: Vec<PlayerId> = entries.iter().take(5).map(|e| e.player_id).collect();
    sheet.call_up(entries)?;
    sheet.select_starters(&starters)?;
    Ok(sheet)
}

async fn play_one(session: &ScorekeeperSession, rng: &mut StdRng, tally: &mut Tally) -> Result<()> {
    let side = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
    let (on_court, bench) = session.with_engine(|engine| {
        let team = engine.game().team(side);
        let bench: Vec<PlayerId> = team
            .players
            .iter()
            .filter(|p| !team.is_on_court(&p.player_id))
            .filter(|p| engine.standing(&p.player_id).is_eligible())
            .map(|p| p.player_id)
            .collect();
        (team.on_court.iter().copied().collect::<Vec<_>>(), bench)
    });
    let Some(&player) = on_court.choose(rng) else {
        return Ok(());
    };

    let result = match rng.gen_range(0..100) {
        0..=57 => {
            let value = match rng.gen_range(0..10) {
                0..=2 => PointValue::One,
                3..=7 => PointValue::Two,
                _ => PointValue::Three,
            };
            session.record_point(side, &player, value, ActionIntent::Do).await
        }
        // A correction of a mis-tapped basket.
        58..=62 => {
            session
                .record_point(side, &player, PointValue::Two, ActionIntent::Undo)
                .await
        }
        63..=84 => {
            let (kind, free_throws) = match rng.gen_range(0..100) {
                0..=84 => (FoulKind::Personal, rng.gen_range(0..=2)),
                85..=92 => (FoulKind::Technical, 1),
                93..=97 => (FoulKind::Unsportsmanlike, 2),
                _ => (FoulKind::Disqualifying, 2),
            };
            session
                .record_foul(side, &player, kind, free_throws, ActionIntent::Do)
                .await
        }
        85..=91 => session.call_timeout(side, ActionIntent::Do).await,
        _ => match bench.choose(rng) {
            Some(entering) => {
                session
                    .substitute(side, entering, &player, ActionIntent::Do)
                    .await
            }
            None => return Ok(()),
        },
    };

    match result {
        Ok(applied) => {
            tally.recorded += 1;
            for alert in applied.alerts {
                println!("      {alert}");
                tally.alerts.push(alert);
            }
            Ok(())
        }
        Err(SyncError::Match(e)) => {
            debug!(error = %e, "Refused by the rules");
            tally.refused += 1;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn reconnect(session: &ScorekeeperSession, tally: &mut Tally) -> Result<()> {
    match session.on_connectivity_restored().await {
        Ok(report) => {
            println!(
                "      drained: {} committed, {} duplicates, {} abandoned",
                report.committed, report.duplicates, report.abandoned
            );
            tally.drains.push(report);
            Ok(())
        }
        Err(SyncError::DrainInProgress) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Takes guests who may not play the next quarter off court, then moves on.
async fn next_quarter(session: &ScorekeeperSession) -> Result<()> {
    let next = session.record().quarter.saturating_add(1);
    for side in Side::BOTH {
        let swap = session.with_engine(|engine| {
            let team = engine.game().team(side);
            let leaving = team.over_cap_on_court(next)?.player_id;
            let entering = team
                .players
                .iter()
                .filter(|p| !team.is_on_court(&p.player_id))
                .filter(|p| engine.standing(&p.player_id).is_eligible())
                .find(|p| p.may_play_in(engine.quarter()) && p.may_play_in(next))?
                .player_id;
            Some((entering, leaving))
        });
        if let Some((entering, leaving)) = swap {
            session
                .substitute(side, &entering, &leaving, ActionIntent::Do)
                .await?;
        }
    }
    session.advance_quarter(ActionIntent::Do).await?;
    Ok(())
}

/// Plays out the fourth quarter and overtime until the scores differ, then
/// ends the match.
async fn final_buzzer(session: &ScorekeeperSession, rng: &mut StdRng) -> Result<()> {
    while session.record().quarter < REGULAR_QUARTERS {
        next_quarter(session).await?;
    }
    while session.score(Side::Home) == session.score(Side::Away) {
        next_quarter(session).await?;
        let side = if rng.gen_bool(0.5) { Side::Home } else { Side::Away };
        let shooter = session.with_engine(|engine| {
            engine.game().team(side).on_court.iter().next().copied()
        });
        if let Some(shooter) = shooter {
            session
                .record_point(side, &shooter, PointValue::Two, ActionIntent::Do)
                .await?;
        }
    }
    session.finish().await?;
    Ok(())
}

fn print_outcome(outcome: &Outcome) -> Result<()> {
    print!("{}", box_score(&outcome.engine));

    let status = &outcome.status;
    println!("Sync");
    println!("====");
    println!("Pending:  {}", status.pending);
    println!("Failed:   {}", status.failed);
    println!("Online:   {}", status.online);
    let (committed, duplicates, abandoned, cancelled) =
        outcome.drains.iter().fold((0, 0, 0, 0), |acc, r| {
            (
                acc.0 + r.committed,
                acc.1 + r.duplicates,
                acc.2 + r.abandoned,
                acc.3 + r.cancelled,
            )
        });
    println!(
        "Drains:   {} ({committed} committed, {duplicates} duplicates, {abandoned} abandoned, {cancelled} cancelled)",
        outcome.drains.len()
    );
    println!(
        "Backend:  {} committed, {} refused offline, {} header writes",
        outcome.backend.committed, outcome.backend.refused_offline, outcome.backend.header_writes
    );
    println!(
        "Actions:  {} recorded, {} refused by the rules, {} alerts",
        outcome.recorded,
        outcome.refused,
        outcome.alerts.len()
    );
    let (home, away) = outcome.spectator_score;
    let agrees = home == outcome.record.score_home && away == outcome.record.score_away;
    println!(
        "Spectator: {home}-{away} ({})",
        if agrees { "in sync" } else { "diverged" }
    );
    println!();

    println!("Final record");
    println!("============");
    println!("{}", serde_json::to_string_pretty(&outcome.record)?);
    Ok(())
}

fn box_score(engine: &MatchEngine) -> String {
    let mut out = String::new();
    for side in Side::BOTH {
        let team = engine.game().team(side);
        let counters = engine.counters().team(&team.team_id);
        out.push_str(&format!("{} {}\n", team.name, engine.score(side)));
        out.push_str(&format!("  {:>3}  {:<14} {:>4} {:>6}\n", "#", "Player", "PTS", "FOULS"));
        for player in &team.players {
            let line = engine.counters().player(&player.player_id);
            let note = match engine.standing(&player.player_id) {
                Standing::Eligible => "",
                Standing::FouledOut => "  fouled out",
                Standing::Disqualified => "  disqualified",
            };
            out.push_str(&format!(
                "  {:>3}  {:<14} {:>4} {:>6}{note}\n",
                player.jersey,
                player.name,
                line.points,
                line.fouls.total()
            ));
        }
        out.push_str(&format!(
            "  team fouls by quarter: {:?}, timeouts this window: {}\n\n",
            counters.team_fouls,
            engine.timeouts_used(side)
        ));
    }
    out
}
