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

//! A Fibonacci action served and consumed in one process.
//!
//! The server accepts every goal, streams the sequence as feedback and finishes with the
//! whole sequence as its result. The client sends one goal to completion and cancels a
//! second one midway.
//!
//! ```sh
//! RUST_LOG=info cargo run --example fibonacci
//! ```

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use actionlib::prelude::*;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[action_payload]
struct FibonacciGoal {
    order: u32,
}

#[action_payload]
struct FibonacciFeedback {
    sequence: Vec<u64>,
}

#[action_payload]
struct FibonacciResult {
    sequence: Vec<u64>,
}

type FibonacciServer = ActionServer<FibonacciGoal, FibonacciFeedback, FibonacciResult>;
type FibonacciClient = ActionClient<FibonacciGoal, FibonacciFeedback, FibonacciResult>;

/// Accepts goals and hands them to the executor task.
struct Scheduler {
    queue: mpsc::UnboundedSender<ActionGoal<FibonacciGoal>>,
    cancelled: Arc<Mutex<HashSet<String>>>,
}

impl ActionServerListener<FibonacciGoal> for Scheduler {
    fn cancel_received(&self, goal_id: &GoalId) {
        self.cancelled.lock().insert(goal_id.id.clone());
    }

    fn accept_goal(&self, goal: &ActionGoal<FibonacciGoal>) -> bool {
        self.queue.send(goal.clone()).is_ok()
    }
}

async fn execute(
    server: Arc<FibonacciServer>,
    mut queue: mpsc::UnboundedReceiver<ActionGoal<FibonacciGoal>>,
    cancelled: Arc<Mutex<HashSet<String>>>,
) -> anyhow::Result<()> {
    while let Some(goal) = queue.recv().await {
        let id = goal.goal_id.id.clone();
        let mut sequence = vec![0_u64, 1];
        let mut preempted = false;
        for _ in 1..goal.goal.order {
            let cancel_requested = cancelled.lock().remove(&id);
            if cancel_requested {
                preempted = true;
                break;
            }
            let next = sequence[sequence.len() - 1] + sequence[sequence.len() - 2];
            sequence.push(next);
            let feedback = server.feedback_for(
                &id,
                FibonacciFeedback {
                    sequence: sequence.clone(),
                },
            )?;
            server.send_feedback(feedback).await?;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if preempted {
            server.set_preempt(&id)?;
        } else {
            server.set_succeed(&id)?;
        }
        let result = server.result_for(&id, FibonacciResult { sequence })?;
        server.send_result(result).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing(&CONFIG);

    let transport: SharedTransport = Arc::new(LocalBroker::new());
    let server = FibonacciServer::connect(transport.clone(), "fibonacci").await?;
    let (queue, jobs) = mpsc::unbounded_channel();
    let cancelled = Arc::new(Mutex::new(HashSet::new()));
    server.add_listener(Arc::new(Scheduler {
        queue,
        cancelled: cancelled.clone(),
    }));
    let executor = tokio::spawn(execute(server.clone(), jobs, cancelled));

    let client = FibonacciClient::connect(transport, "fibonacci").await?;
    if !client
        .wait_for_action_server_to_start(Duration::from_secs(5))
        .await
    {
        anyhow::bail!("fibonacci server did not start");
    }
    client.add_feedback_listener(Arc::new(|feedback: &ActionFeedback<FibonacciFeedback>| {
        info!(goal = %feedback.status.goal_id, sequence = ?feedback.feedback.sequence, "Feedback");
    }));

    let future = client.send_goal(FibonacciGoal { order: 10 }, None).await?;
    let result = future.get().await?;
    info!(
        status = GoalStatus::name_of(result.status.status),
        sequence = ?result.result.sequence,
        "First goal finished"
    );

    let future = client.send_goal(FibonacciGoal { order: 50 }, None).await?;
    tokio::time::sleep(Duration::from_millis(350)).await;
    future.cancel().await;
    match future.get_timeout(Duration::from_secs(10)).await {
        Ok(result) => info!(
            status = GoalStatus::name_of(result.status.status),
            sequence = ?result.result.sequence,
            "Second goal finished"
        ),
        Err(e) => warn!(error = %e, "Second goal did not finish"),
    }

    client.shutdown().await?;
    server.shutdown().await?;
    executor.abort();
    Ok(())
}
