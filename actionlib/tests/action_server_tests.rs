/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Server-side goal handling over an in-process broker.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use actionlib::prelude::*;
use actionlib_test::prelude::*;
use parking_lot::Mutex;

use crate::setup::*;

mod setup;

#[actionlib_test]
async fn accepted_goal_succeeds_and_the_tick_reports_it() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_succeeds").await?;
    let listener = RecordingServerListener::accepting();
    harness.server.add_listener(listener.clone());

    let last_seen = Arc::new(Mutex::new(None::<u8>));
    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 5 }, None)
        .await?;
    let goal_id = future.goal_id().clone();
    {
        let last_seen = last_seen.clone();
        let goal_id = goal_id.clone();
        harness
            .client
            .add_status_listener(Arc::new(move |status: &GoalStatusArray| {
                if let Some(entry) = status.find(&goal_id) {
                    *last_seen.lock() = Some(entry.status);
                }
            }));
    }

    assert!(harness.server_reaches(&goal_id.id, GoalStatus::Active).await);
    assert_eq!(listener.goals.lock().as_slice(), [goal_id.id.clone()]);

    assert_eq!(harness.server.set_succeed(&goal_id.id)?, GoalStatus::Succeeded);
    let snapshot = harness.server.status_snapshot();
    let entry = snapshot.find(&goal_id).expect("the goal is in the snapshot");
    assert_eq!(entry.status, GoalStatus::Succeeded.code());
    assert_eq!(entry.status, 3);

    assert!(
        eventually(WAIT, || *last_seen.lock() == Some(GoalStatus::Succeeded.code())).await,
        "a heartbeat after set_succeed reports SUCCEEDED"
    );

    harness.shutdown().await
}

#[actionlib_test]
async fn rejected_goal_ends_with_a_rejected_result() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_rejects").await?;
    harness.server.add_listener(RecordingServerListener::rejecting());

    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 2 }, Some("too-big"))
        .await?;
    assert!(harness.server_reaches("too-big", GoalStatus::Rejected).await);

    let result = harness
        .server
        .result_for("too-big", FibonacciResult::default())?;
    harness.server.send_result(result).await?;

    let received = future.get_timeout(WAIT).await?;
    assert_eq!(received.status.goal_status(), Some(GoalStatus::Rejected));
    assert_eq!(future.current_state(), ClientState::Done);
    assert!(future.is_done());

    harness.shutdown().await
}

#[actionlib_test]
async fn duplicate_goal_ids_keep_the_first_registration() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_duplicates").await?;
    let listener = RecordingServerListener::accepting();
    harness.server.add_listener(listener.clone());

    let first = harness
        .client
        .send_goal(FibonacciGoal { order: 3 }, Some("dup"))
        .await?;
    assert!(harness.server_reaches("dup", GoalStatus::Active).await);
    harness.server.set_succeed("dup")?;

    let second = harness
        .client
        .send_goal(FibonacciGoal { order: 9 }, Some("dup"))
        .await?;
    // Goals are delivered in order, so once "marker" is in the registry the duplicate was seen.
    let _marker = harness
        .client
        .send_goal(FibonacciGoal { order: 1 }, Some("marker"))
        .await?;
    assert!(harness.server_reaches("marker", GoalStatus::Active).await);

    assert_eq!(harness.server.goal_count(), 2);
    assert_eq!(listener.goal_count(), 2);
    assert_eq!(harness.server.goal_state("dup"), Some(GoalStatus::Succeeded));
    let kept = harness.server.goal_of("dup").expect("dup is tracked");
    assert_eq!(kept.goal, FibonacciGoal { order: 3 });

    drop((first, second));
    harness.shutdown().await
}

#[actionlib_test]
async fn unknown_goal_ids_are_reported() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_unknown").await?;
    let server = &harness.server;

    assert_eq!(server.goal_state("nobody"), None);
    assert!(server.goal_of("nobody").is_none());
    assert_eq!(
        server.set_succeed("nobody"),
        Err(ActionlibError::GoalNotTracked("nobody".to_string()))
    );
    assert!(matches!(
        server.set_abort("nobody"),
        Err(ActionlibError::GoalNotTracked(_))
    ));
    assert!(matches!(
        server.set_preempt("nobody"),
        Err(ActionlibError::GoalNotTracked(_))
    ));
    assert!(matches!(
        server.transition_goal("nobody", ServerEvent::Accept),
        Err(ActionlibError::GoalNotTracked(_))
    ));
    assert!(matches!(
        server.feedback_for("nobody", FibonacciFeedback::default()),
        Err(ActionlibError::GoalNotTracked(_))
    ));
    assert!(server.remove_goal("nobody").is_none());

    harness.shutdown().await
}

#[actionlib_test]
async fn cancel_reaches_listeners_and_preempt_finishes_the_goal() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_preempts").await?;
    let listener = RecordingServerListener::accepting();
    harness.server.add_listener(listener.clone());

    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 30 }, None)
        .await?;
    let goal_id = future.goal_id().id.clone();
    assert!(harness.server_reaches(&goal_id, GoalStatus::Active).await);

    assert!(future.cancel().await);
    assert!(eventually(WAIT, || listener.cancel_count() == 1).await);
    assert_eq!(listener.cancels.lock().as_slice(), [goal_id.clone()]);

    assert_eq!(harness.server.set_preempt(&goal_id)?, GoalStatus::Preempted);
    let partial = FibonacciResult {
        sequence: fibonacci(4),
    };
    let result = harness.server.result_for(&goal_id, partial.clone())?;
    harness.server.send_result(result).await?;

    let received = future.get_timeout(WAIT).await?;
    assert_eq!(received.status.goal_status(), Some(GoalStatus::Preempted));
    assert_eq!(received.result, partial);
    assert_eq!(future.current_state(), ClientState::Done);

    harness.shutdown().await
}

#[actionlib_test]
async fn a_pending_goal_can_be_recalled() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_recalls").await?;

    // No listener: the goal stays PENDING
    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 4 }, Some("recall-me"))
        .await?;
    assert!(harness.server_reaches("recall-me", GoalStatus::Pending).await);

    assert_eq!(
        harness
            .server
            .transition_goal("recall-me", ServerEvent::CancelRequest)?,
        GoalStatus::Recalling
    );
    assert_eq!(
        harness.server.transition_goal("recall-me", ServerEvent::Cancel)?,
        GoalStatus::Recalled
    );
    let result = harness
        .server
        .result_for("recall-me", FibonacciResult::default())?;
    harness.server.send_result(result).await?;

    let received = future.get_timeout(WAIT).await?;
    assert_eq!(received.status.goal_status(), Some(GoalStatus::Recalled));

    harness.shutdown().await
}

#[actionlib_test]
async fn status_snapshot_is_ordered_by_goal_stamp() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_snapshot").await?;
    let late = GoalId::new("a-late".to_string(), UNIX_EPOCH + Duration::from_secs(20));
    let early = GoalId::new("z-early".to_string(), UNIX_EPOCH + Duration::from_secs(10));

    harness
        .client
        .send_goal_wire(ActionGoal::with_id(FibonacciGoal { order: 1 }, late))
        .await?;
    harness
        .client
        .send_goal_wire(ActionGoal::with_id(FibonacciGoal { order: 2 }, early))
        .await?;
    assert!(eventually(WAIT, || harness.server.goal_count() == 2).await);

    let ids: Vec<String> = harness
        .server
        .status_snapshot()
        .status_list
        .into_iter()
        .map(|entry| entry.goal_id.id)
        .collect();
    assert_eq!(ids, vec!["z-early".to_string(), "a-late".to_string()]);

    harness.shutdown().await
}

#[actionlib_test]
async fn terminal_goals_are_pruned_when_configured() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = fast_config("server_prunes");
    config.behavior.prune_terminal_goals = true;
    let harness = Harness::start_with("server_prunes", config).await?;
    harness.server.add_listener(RecordingServerListener::accepting());

    let _future = harness
        .client
        .send_goal(FibonacciGoal { order: 6 }, Some("short-lived"))
        .await?;
    assert!(harness.server_reaches("short-lived", GoalStatus::Active).await);
    harness.server.set_abort("short-lived")?;

    assert!(eventually(WAIT, || harness.server.goal_count() == 0).await);

    harness.shutdown().await
}

#[actionlib_test]
async fn explicit_pruning_and_removal() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_removes").await?;
    harness.server.add_listener(RecordingServerListener::accepting());

    for id in ["keep", "finish", "forget"] {
        harness
            .client
            .send_goal(FibonacciGoal { order: 3 }, Some(id))
            .await?
            .detach();
    }
    assert!(eventually(WAIT, || harness.server.goal_count() == 3).await);
    assert!(harness.server_reaches("forget", GoalStatus::Active).await);

    harness.server.set_succeed("finish")?;
    assert_eq!(harness.server.prune_terminal_goals(), 1);
    assert_eq!(harness.server.goal_state("finish"), None);

    let forgotten = harness.server.remove_goal("forget").expect("forget is tracked");
    assert_eq!(forgotten.goal_id.id, "forget");
    assert_eq!(harness.server.goal_count(), 1);
    assert_eq!(harness.server.goal_state("keep"), Some(GoalStatus::Active));

    harness.shutdown().await
}

#[actionlib_test]
async fn detached_listeners_no_longer_decide() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_detaches").await?;
    let listener = RecordingServerListener::accepting();
    let id = harness.server.add_listener(listener.clone());
    harness.server.add_listener(RecordingServerListener::rejecting());

    assert!(harness.server.remove_listener(id));
    assert!(!harness.server.remove_listener(id));
    assert_eq!(harness.server.detach_all_listeners().len(), 1);

    let _future = harness
        .client
        .send_goal(FibonacciGoal { order: 3 }, Some("unheard"))
        .await?;
    assert!(harness.server_reaches("unheard", GoalStatus::Pending).await);
    assert_eq!(listener.goal_count(), 0);

    harness.shutdown().await
}

#[actionlib_test]
async fn the_first_listener_decision_wins() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("server_two_listeners").await?;
    let rejecting = RecordingServerListener::rejecting();
    let accepting = RecordingServerListener::accepting();
    harness.server.add_listener(rejecting.clone());
    harness.server.add_listener(accepting.clone());

    let _future = harness
        .client
        .send_goal(FibonacciGoal { order: 3 }, Some("contested"))
        .await?;
    assert!(harness.server_reaches("contested", GoalStatus::Rejected).await);
    assert!(eventually(WAIT, || accepting.goal_count() == 1).await);
    assert_eq!(rejecting.goal_count(), 1);
    assert_eq!(harness.server.goal_state("contested"), Some(GoalStatus::Rejected));

    harness.shutdown().await
}

#[actionlib_test]
async fn topics_are_registered_and_released() -> anyhow::Result<()> {
    initialize_tracing();
    let harness = Harness::start("fibonacci").await?;
    let server = &harness.server;

    assert_eq!(
        server.published_topics(),
        ["fibonacci/status", "fibonacci/feedback", "fibonacci/result"]
    );
    assert_eq!(server.subscribed_topics(), ["fibonacci/goal", "fibonacci/cancel"]);
    for topic in server.published_topics() {
        assert_eq!(harness.broker.publisher_count(topic), 1);
        assert_eq!(harness.broker.subscriber_count(topic), 1);
    }
    for topic in server.subscribed_topics() {
        assert_eq!(harness.broker.subscriber_count(topic), 1);
        assert_eq!(harness.broker.publisher_count(topic), 1);
    }

    harness.shutdown().await?;
    assert!(!server.is_connected());
    assert_eq!(harness.broker.publisher_count("fibonacci/status"), 0);
    assert_eq!(harness.broker.subscriber_count("fibonacci/goal"), 0);
    assert_eq!(
        server.send_status_tick().await,
        Err(ActionlibError::NotConnected)
    );
    // Idempotent
    server.shutdown().await?;
    Ok(())
}

#[actionlib_test]
async fn an_unreachable_heartbeat_delay_still_shuts_down() -> anyhow::Result<()> {
    initialize_tracing();
    let mut config = fast_config("server_far_heartbeat");
    config.timeouts.status_tick_delay_ms = u64::MAX;
    let harness = Harness::start_with("server_far_heartbeat", config).await?;
    harness.server.add_listener(RecordingServerListener::accepting());

    let future = harness
        .client
        .send_goal(FibonacciGoal { order: 1 }, Some("far"))
        .await?;
    assert!(harness.server_reaches("far", GoalStatus::Active).await);
    harness.server.send_status_tick().await?;
    assert!(eventually(WAIT, || future.current_state() == ClientState::Active).await);

    tokio::time::timeout(WAIT, harness.shutdown()).await??;
    assert!(!harness.server.is_connected());
    Ok(())
}
