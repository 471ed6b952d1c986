//! Offline queue and drain behaviour of scorekeeper sessions.
//!
//! Covers:
//! - Actions recorded offline commit exactly once, in order, with their ids
//! - Lost acknowledgements are recognized as duplicates on replay
//! - Entries are abandoned at the retry ceiling and the loss is surfaced
//! - A queued undo cancels its queued submission
//! - Drains never overlap and torn-down sessions stay untouched
//! - The queue survives a restart

mod common;

use common::{config, Fixture, SlowBackend};
use courtside_core::{ActionId, Side};
use courtside_ledger::{Action, ActionKind};
use courtside_match::MatchState;
use courtside_rules::{ActionIntent, FoulKind, PointValue};
use courtside_sync::{
    load_or_create_device_id, DrainTrigger, FileQueueStore, OfflineQueue,
    ScorekeeperSession, SessionEvent, SyncError,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Replay
// ============================================================================

#[tokio::test]
async fn test_offline_points_commit_once_in_order() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let shooter = fx.player(Side::Home, 0);

    fx.backend.set_online(false);
    for _ in 0..3 {
        session
            .record_point(Side::Home, &shooter, PointValue::Two, ActionIntent::Do)
            .await
            .unwrap();
    }

    // Local state moves on while the backend sees nothing.
    assert_eq!(session.score(Side::Home), 6);
    assert_eq!(session.queue().pending(), 3);
    assert!(!session.status().online);
    assert!(fx.committed_points().is_empty());

    let queued: Vec<ActionId> = session.queue().entries().iter().map(|e| e.id).collect();

    fx.backend.set_online(true);
    let report = session.sync_now().await.unwrap();

    assert_eq!(report.trigger, DrainTrigger::Manual);
    assert_eq!(report.committed, 3);
    assert_eq!(report.duplicates, 0);
    assert!(report.refetched);

    let committed: Vec<ActionId> = fx.committed_points().iter().map(|a| a.id).collect();
    assert_eq!(committed, queued);
    assert_eq!(fx.backend_record().score_home, 6);
    assert_eq!(session.score(Side::Home), 6);

    let status = session.status();
    assert_eq!(status.pending, 0);
    assert!(status.online);
    assert!(!status.draining);
}

#[tokio::test]
async fn test_device_id_travels_with_submissions() {
    let fx = Fixture::new();
    let session = fx.started().await;

    let applied = session
        .record_point(Side::Away, &fx.player(Side::Away, 1), PointValue::Three, ActionIntent::Do)
        .await
        .unwrap();

    assert_eq!(
        fx.backend.submitted_by(&fx.match_id, &applied.actions[0].id),
        Some(session.device())
    );
}

#[tokio::test]
async fn test_new_actions_queue_behind_pending_ones() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let shooter = fx.player(Side::Home, 0);

    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &shooter, PointValue::One, ActionIntent::Do)
        .await
        .unwrap();
    fx.backend.set_online(true);

    // Reachable again, but the queue is not drained yet: keep the order.
    session
        .record_point(Side::Home, &shooter, PointValue::Two, ActionIntent::Do)
        .await
        .unwrap();
    assert_eq!(session.queue().pending(), 2);
    assert!(fx.committed_points().is_empty());

    session.sync_now().await.unwrap();
    let values: Vec<ActionKind> = fx.committed_points().into_iter().map(|a| a.kind).collect();
    assert_eq!(
        values,
        vec![
            ActionKind::Point { value: PointValue::One },
            ActionKind::Point { value: PointValue::Two },
        ]
    );
}

#[tokio::test]
async fn test_lost_ack_is_a_duplicate_on_replay() {
    let fx = Fixture::new();
    let session = fx.started().await;

    fx.backend.lose_next_acks(1);
    session
        .record_point(Side::Home, &fx.player(Side::Home, 2), PointValue::Three, ActionIntent::Do)
        .await
        .unwrap();

    // Committed, but the reply never arrived.
    assert_eq!(fx.committed_points().len(), 1);
    assert_eq!(session.queue().pending(), 1);

    let report = session.sync_now().await.unwrap();
    assert_eq!(report.committed, 0);
    assert_eq!(report.duplicates, 1);
    assert_eq!(fx.committed_points().len(), 1);
    assert_eq!(fx.backend.stats().duplicates, 1);
    assert_eq!(session.score(Side::Home), 3);
    assert_eq!(fx.backend_record().score_home, 3);
}

// ============================================================================
// Abandonment
// ============================================================================

#[tokio::test]
async fn test_entry_abandoned_at_retry_ceiling() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let mut events = session.subscribe_events();

    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::Two, ActionIntent::Do)
        .await
        .unwrap();

    for attempt in 1..5 {
        let report = session.sync_now().await.unwrap();
        assert_eq!(report.retried, 1);
        assert_eq!(session.queue().front().unwrap().retry_count, attempt);
    }

    let report = session.sync_now().await.unwrap();
    assert_eq!(report.abandoned, 1);
    assert!(session.queue().is_empty());
    assert_eq!(session.status().failed, 1);

    let mut abandoned = 0;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Abandoned { entry, reason } = event {
            assert!(matches!(entry.action.kind, ActionKind::Point { .. }));
            assert!(reason.contains("unreachable"));
            abandoned += 1;
        }
    }
    assert_eq!(abandoned, 1);

    // The dropped point disappears once the match is refetched.
    assert_eq!(session.score(Side::Home), 2);
    fx.backend.set_online(true);
    let report = session.sync_now().await.unwrap();
    assert!(report.refetched);
    assert_eq!(session.score(Side::Home), 0);
    assert_eq!(fx.backend_record().score_home, 0);

    assert_eq!(session.acknowledge_failed().unwrap(), 1);
    assert_eq!(session.status().failed, 0);
}

#[tokio::test]
async fn test_drain_stops_at_first_transient_failure() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let shooter = fx.player(Side::Away, 0);

    fx.backend.set_online(false);
    for _ in 0..3 {
        session
            .record_point(Side::Away, &shooter, PointValue::One, ActionIntent::Do)
            .await
            .unwrap();
    }

    let report = session.sync_now().await.unwrap();
    assert_eq!(report.retried, 1);
    assert!(!report.refetched);

    let retries: Vec<u32> = session.queue().entries().iter().map(|e| e.retry_count).collect();
    assert_eq!(retries, vec![1, 0, 0]);
}

#[tokio::test]
async fn test_rejected_undo_is_counted_as_failed() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let mut events = session.subscribe_events();

    // An undo of an entry the backend never received is refused for good.
    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::Two, ActionIntent::Do)
        .await
        .unwrap();
    for _ in 0..5 {
        session.sync_now().await.unwrap();
    }
    fx.backend.set_online(true);
    session.acknowledge_failed().unwrap();

    // Abandoned but still in the local ledger until the next refetch.
    session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::Two, ActionIntent::Undo)
        .await
        .unwrap();

    assert_eq!(session.status().failed, 1);
    let rejected = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|e| matches!(e, SessionEvent::Abandoned { .. }))
        .count();
    assert_eq!(rejected, 2);
}

// ============================================================================
// Undo while offline
// ============================================================================

#[tokio::test]
async fn test_undo_cancels_queued_submission() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let shooter = fx.player(Side::Home, 3);

    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &shooter, PointValue::Three, ActionIntent::Do)
        .await
        .unwrap();
    session
        .record_point(Side::Home, &shooter, PointValue::Three, ActionIntent::Undo)
        .await
        .unwrap();
    assert_eq!(session.queue().pending(), 2);
    assert_eq!(session.score(Side::Home), 0);

    fx.backend.set_online(true);
    let report = session.sync_now().await.unwrap();
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.committed, 0);
    assert!(fx.committed_points().is_empty());
    assert_eq!(session.score(Side::Home), 0);
}

#[tokio::test]
async fn test_undo_of_committed_action_annuls_on_replay() {
    let fx = Fixture::new();
    let session = fx.started().await;
    let fouler = fx.player(Side::Away, 4);

    session
        .record_foul(Side::Away, &fouler, FoulKind::Personal, 2, ActionIntent::Do)
        .await
        .unwrap();
    fx.backend.set_online(false);
    session
        .record_foul(Side::Away, &fouler, FoulKind::Personal, 0, ActionIntent::Undo)
        .await
        .unwrap();
    assert_eq!(session.with_engine(|e| e.team_fouls(Side::Away)), 0);

    fx.backend.set_online(true);
    let report = session.sync_now().await.unwrap();
    assert_eq!(report.committed, 1);

    let fouls: Vec<Action> = fx
        .backend
        .actions(&fx.match_id)
        .into_iter()
        .filter(|a| matches!(a.kind, ActionKind::Foul { .. }))
        .collect();
    assert_eq!(fouls.len(), 1);
    assert!(fouls[0].annulled);
    assert_eq!(fx.backend_record().team_fouls_away[0], 0);
}

// ============================================================================
// Header
// ============================================================================

#[tokio::test]
async fn test_quarter_change_resets_timeouts() {
    let fx = Fixture::new();
    let session = fx.started().await;

    session.advance_quarter(ActionIntent::Do).await.unwrap();
    session.call_timeout(Side::Home, ActionIntent::Do).await.unwrap();
    session.call_timeout(Side::Away, ActionIntent::Do).await.unwrap();

    let row = fx.backend_record();
    assert_eq!(row.quarter, 2);
    assert_eq!((row.timeouts_home, row.timeouts_away), (1, 1));

    session.advance_quarter(ActionIntent::Do).await.unwrap();

    let local = session.record();
    assert_eq!(local.quarter, 3);
    assert_eq!((local.timeouts_home, local.timeouts_away), (0, 0));

    let row = fx.backend_record();
    assert_eq!(row.quarter, 3);
    assert_eq!((row.timeouts_home, row.timeouts_away), (0, 0));
}

#[tokio::test]
async fn test_header_changes_wait_for_queue() {
    let fx = Fixture::new();
    let session = fx.started().await;

    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::Two, ActionIntent::Do)
        .await
        .unwrap();
    session.suspend("Floor is wet").await.unwrap();
    fx.backend.set_online(true);

    // A refetch before the drain keeps the unpushed suspension.
    session.refetch().await.unwrap();
    assert_eq!(session.record().state, MatchState::Suspended);
    assert_eq!(session.score(Side::Home), 2);
    assert_eq!(fx.backend_record().state, MatchState::InProgress);

    session.sync_now().await.unwrap();
    let row = fx.backend_record();
    assert_eq!(row.state, MatchState::Suspended);
    assert_eq!(row.suspension_reason.as_deref(), Some("Floor is wet"));
    assert_eq!(row.score_home, 2);
}

// ============================================================================
// Concurrency and lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_drains_never_overlap() {
    let fx = Fixture::new();
    let slow = Arc::new(SlowBackend {
        inner: fx.backend.clone(),
        delay: Duration::from_millis(100),
    });
    let session = fx.open_on(slow, OfflineQueue::in_memory(5)).await;
    session.start().await.unwrap();

    fx.backend.set_online(false);
    session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::Two, ActionIntent::Do)
        .await
        .unwrap();
    fx.backend.set_online(true);

    let (first, second) = tokio::join!(session.sync_now(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.sync_now().await
    });

    assert_eq!(first.unwrap().committed, 1);
    assert!(matches!(second, Err(SyncError::DrainInProgress)));
    assert_eq!(fx.committed_points().len(), 1);

    // Finished runs release the guard.
    assert!(session.sync_now().await.is_ok());
}

#[tokio::test]
async fn test_torn_down_session_refuses_work() {
    let fx = Fixture::new();
    let session = fx.started().await;
    session.teardown();

    assert!(!session.is_alive());
    assert!(!session.channel_open());
    let err = session
        .record_point(Side::Home, &fx.player(Side::Home, 0), PointValue::One, ActionIntent::Do)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::TornDown));
    assert!(matches!(session.sync_now().await, Err(SyncError::TornDown)));
    assert!(matches!(session.pump_realtime(), Err(SyncError::TornDown)));
}

#[tokio::test(start_paused = true)]
async fn test_teardown_mid_flight_still_persists_queue() {
    let fx = Fixture::new();
    let slow = Arc::new(SlowBackend {
        inner: fx.backend.clone(),
        delay: Duration::from_millis(100),
    });
    let session = fx.open_on(slow, OfflineQueue::in_memory(5)).await;
    session.start().await.unwrap();
    fx.backend.set_online(false);

    let player = fx.player(Side::Home, 0);
    let (result, ()) = tokio::join!(
        session.record_point(Side::Home, &player, PointValue::Two, ActionIntent::Do),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.teardown();
        }
    );

    assert!(matches!(result, Err(SyncError::TornDown)));
    assert_eq!(session.queue().pending(), 1);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let fx = Fixture::new();
    let device = load_or_create_device_id(dir.path()).unwrap();
    let open_queue = || {
        let store = FileQueueStore::new(dir.path(), "test", &device);
        OfflineQueue::open(Box::new(store), 5).unwrap()
    };

    {
        let session = ScorekeeperSession::open(
            fx.backend.clone(),
            device,
            open_queue(),
            &config(),
            fx.game(),
        )
        .await
        .unwrap();
        session.start().await.unwrap();

        fx.backend.set_online(false);
        for n in 0..2 {
            session
                .record_point(Side::Away, &fx.player(Side::Away, n), PointValue::Two, ActionIntent::Do)
                .await
                .unwrap();
        }
        session.teardown();
    }
    fx.backend.set_online(true);

    let same_device = load_or_create_device_id(dir.path()).unwrap();
    assert_eq!(same_device, device);

    let session = ScorekeeperSession::open(
        fx.backend.clone(),
        same_device,
        open_queue(),
        &config(),
        fx.game(),
    )
    .await
    .unwrap();

    // The queued points are visible before they are replayed.
    assert_eq!(session.queue().pending(), 2);
    assert_eq!(session.record().state, MatchState::InProgress);
    assert_eq!(session.score(Side::Away), 4);

    let report = session.sync_now().await.unwrap();
    assert_eq!(report.committed, 2);
    assert_eq!(fx.backend_record().score_away, 4);
    for action in fx.committed_points() {
        assert_eq!(fx.backend.submitted_by(&fx.match_id, &action.id), Some(device));
    }
}

#[tokio::test]
async fn test_session_opens_offline_on_queued_work() {
    let dir = tempfile::tempdir().unwrap();
    let fx = Fixture::new();
    let device = load_or_create_device_id(dir.path()).unwrap();
    let store = || Box::new(FileQueueStore::new(dir.path(), "test", &device));

    {
        let queue = OfflineQueue::open(store(), 5).unwrap();
        let session = ScorekeeperSession::open(fx.backend.clone(), device, queue, &config(), fx.game())
            .await
            .unwrap();
        session.start().await.unwrap();
        fx.backend.set_online(false);
        session
            .record_point(Side::Home, &fx.player(Side::Home, 1), PointValue::Three, ActionIntent::Do)
            .await
            .unwrap();
    }

    // Still offline at restart: the session comes up on the local copy.
    let queue = OfflineQueue::open(store(), 5).unwrap();
    let session = ScorekeeperSession::open(fx.backend.clone(), device, queue, &config(), fx.game())
        .await
        .unwrap();
    assert!(!session.status().online);
    assert_eq!(session.queue().pending(), 1);
    assert_eq!(session.score(Side::Home), 3);

    fx.backend.set_online(true);
    let report = session.on_connectivity_restored().await.unwrap();
    assert_eq!(report.trigger, DrainTrigger::ConnectivityRestored);
    assert_eq!(report.committed, 1);
    assert!(session.channel_open());
    assert_eq!(fx.backend_record().score_home, 3);
}
