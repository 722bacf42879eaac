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
#![allow(unused)]

use std::sync::Arc;
use std::time::Duration;

use actionlib::prelude::*;
use parking_lot::Mutex;

use super::payloads::{FibonacciFeedback, FibonacciGoal, FibonacciResult};

pub type FibonacciClient = ActionClient<FibonacciGoal, FibonacciFeedback, FibonacciResult>;
pub type FibonacciServer = ActionServer<FibonacciGoal, FibonacciFeedback, FibonacciResult>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Configuration with a fast heartbeat so status ticks arrive within a test's lifetime.
pub fn fast_config(node_name: &str) -> ActionlibConfig {
    let mut config = ActionlibConfig::default();
    config.timeouts.status_tick_delay_ms = 10;
    config.timeouts.status_tick_period_ms = 10;
    config.timeouts.topic_shutdown_grace_ms = 500;
    config.timeouts.server_wait_poll_ms = 5;
    config.defaults.node_name = node_name.to_string();
    config
}

/// A broker with one Fibonacci server and one client on `action_name`.
pub struct Harness {
    pub broker: LocalBroker,
    pub server: Arc<FibonacciServer>,
    pub client: Arc<FibonacciClient>,
}

impl Harness {
    pub async fn start(action_name: &str) -> anyhow::Result<Self> {
        Self::start_with(action_name, fast_config(action_name)).await
    }

    pub async fn start_with(action_name: &str, config: ActionlibConfig) -> anyhow::Result<Self> {
        let broker = LocalBroker::with_config(&config);
        let transport: SharedTransport = Arc::new(broker.clone());
        let server =
            FibonacciServer::connect_with_config(transport.clone(), action_name, &config).await?;
        let client = FibonacciClient::connect_with_config(transport, action_name, &config).await?;
        Ok(Self {
            broker,
            server,
            client,
        })
    }

    /// Waits until the server tracks `goal_id` in `status`.
    pub async fn server_reaches(&self, goal_id: &str, status: GoalStatus) -> bool {
        super::eventually(WAIT, || self.server.goal_state(goal_id) == Some(status)).await
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.client.shutdown().await?;
        self.server.shutdown().await?;
        Ok(())
    }
}

/// Server listener that answers every goal the same way and records what it saw.
#[derive(Debug)]
pub struct RecordingServerListener {
    accept: bool,
    pub goals: Mutex<Vec<String>>,
    pub cancels: Mutex<Vec<String>>,
}

impl RecordingServerListener {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::answering(true))
    }

    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self::answering(false))
    }

    fn answering(accept: bool) -> Self {
        Self {
            accept,
            goals: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
        }
    }

    pub fn goal_count(&self) -> usize {
        self.goals.lock().len()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancels.lock().len()
    }
}

impl ActionServerListener<FibonacciGoal> for RecordingServerListener {
    fn goal_received(&self, goal: &ActionGoal<FibonacciGoal>) {
        self.goals.lock().push(goal.goal_id.id.clone());
    }

    fn cancel_received(&self, goal_id: &GoalId) {
        self.cancels.lock().push(goal_id.id.clone());
    }

    fn accept_goal(&self, _goal: &ActionGoal<FibonacciGoal>) -> bool {
        self.accept
    }
}
