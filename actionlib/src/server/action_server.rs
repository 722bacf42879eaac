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

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::common::{
    ActionTopics, ActionlibConfig, ListenerId, ServerListeners, SharedTransport, CONFIG,
};
use crate::message::{
    ActionFeedback, ActionGoal, ActionResult, ActionlibError, GoalId, GoalStatus,
    GoalStatusArray, GoalStatusMessage, Header,
};
use crate::server::{ServerEvent, ServerStateMachine};
use crate::traits::{
    expect_message, ActionMessage, ActionPayload, ActionServerListener, MessageHandler,
    TopicHandle,
};

/// A goal tracked by the server together with its state machine.
#[derive(Debug)]
pub struct ServerGoal<G> {
    goal: ActionGoal<G>,
    state_machine: ServerStateMachine,
}

impl<G> ServerGoal<G> {
    fn new(goal: ActionGoal<G>, strict: bool) -> Self {
        Self {
            goal,
            state_machine: ServerStateMachine::new(strict),
        }
    }

    pub fn goal(&self) -> &ActionGoal<G> {
        &self.goal
    }

    pub fn state(&self) -> GoalStatus {
        self.state_machine.state()
    }

    fn status_message(&self) -> GoalStatusMessage {
        GoalStatusMessage::new(self.goal.goal_id.clone(), self.state())
    }
}

#[derive(Debug)]
struct Heartbeat {
    cancellation_token: CancellationToken,
    task: JoinHandle<()>,
}

/// The server side of one action.
///
/// Subscribes to the action's `goal` and `cancel` topics and publishes `status`,
/// `feedback` and `result`. Every received goal is registered at `PENDING` under its id,
/// announced to the attached [`ActionServerListener`]s and accepted or rejected on their
/// answer. Application code then drives the goal with [`set_succeed`](Self::set_succeed),
/// [`set_abort`](Self::set_abort), [`set_preempt`](Self::set_preempt) or
/// [`transition_goal`](Self::transition_goal).
///
/// A heartbeat task publishes a snapshot of all tracked goals every
/// `timeouts.status_tick_period_ms`, starting after `timeouts.status_tick_delay_ms`.
#[derive(Debug)]
pub struct ActionServer<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    topics: ActionTopics,
    transport: SharedTransport,
    goals: DashMap<String, Arc<ServerGoal<G>>>,
    listeners: ServerListeners<G>,
    handles: Mutex<Vec<TopicHandle>>,
    heartbeat: Mutex<Option<Heartbeat>>,
    status_seq: AtomicU32,
    connected: AtomicBool,
    strict_transitions: bool,
    prune_terminal_goals: bool,
    shutdown_grace: Duration,
    _payloads: std::marker::PhantomData<fn() -> (F, R)>,
}

assert_impl_all!(ActionServer<(), (), ()>: Send, Sync);

impl<G, F, R> ActionServer<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    /// Starts a server for `action_name` using the global configuration.
    pub async fn connect(
        transport: SharedTransport,
        action_name: &str,
    ) -> Result<Arc<Self>, ActionlibError> {
        Self::connect_with_config(transport, action_name, &CONFIG).await
    }

    /// Starts a server for `action_name`: advertises its topics, subscribes to the client
    /// topics and starts the status heartbeat.
    #[instrument(skip(transport, config))]
    pub async fn connect_with_config(
        transport: SharedTransport,
        action_name: &str,
        config: &ActionlibConfig,
    ) -> Result<Arc<Self>, ActionlibError> {
        let server = Arc::new(Self {
            topics: ActionTopics::new(action_name),
            transport,
            goals: DashMap::new(),
            listeners: ServerListeners::new(),
            handles: Mutex::new(Vec::new()),
            heartbeat: Mutex::new(None),
            status_seq: AtomicU32::new(0),
            connected: AtomicBool::new(true),
            strict_transitions: config.behavior.strict_server_transitions,
            prune_terminal_goals: config.behavior.prune_terminal_goals,
            shutdown_grace: config.topic_shutdown_grace(),
            _payloads: std::marker::PhantomData,
        });

        let topics = &server.topics;
        let mut handles = Vec::with_capacity(5);
        for topic in topics.published_by_server() {
            handles.push(server.transport.advertise(topic).await?);
        }
        handles.push(
            server
                .transport
                .subscribe(&topics.goal, Self::handler(&server, Self::on_goal))
                .await?,
        );
        handles.push(
            server
                .transport
                .subscribe(&topics.cancel, Self::handler(&server, Self::on_cancel))
                .await?,
        );
        server.handles.lock().extend(handles);

        let heartbeat = Self::start_heartbeat(
            Arc::downgrade(&server),
            config.status_tick_delay(),
            config.status_tick_period(),
        );
        *server.heartbeat.lock() = Some(heartbeat);

        info!(action = %server.topics.action_name, "Action server started");
        Ok(server)
    }

    fn handler(server: &Arc<Self>, dispatch: fn(&Self, Arc<dyn ActionMessage>)) -> MessageHandler {
        let server = Arc::downgrade(server);
        Arc::new(move |message: Arc<dyn ActionMessage>| {
            if let Some(server) = server.upgrade() {
                dispatch(&server, message);
            }
        })
    }

    fn start_heartbeat(server: Weak<Self>, delay: Duration, period: Duration) -> Heartbeat {
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();
        let task = tokio::spawn(async move {
            let Some(start) = tokio::time::Instant::now().checked_add(delay) else {
                warn!(?delay, "Status tick delay out of range, heartbeat disabled");
                token.cancelled().await;
                return;
            };
            let mut ticks = tokio::time::interval_at(start, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticks.tick() => {
                        let Some(strong) = server.upgrade() else { break };
                        if let Err(e) = strong.send_status_tick().await {
                            warn!(error = %e, "Status tick failed");
                        }
                    }
                }
            }
            trace!("Status heartbeat stopped");
        });
        Heartbeat {
            cancellation_token,
            task,
        }
    }

    pub fn topics(&self) -> &ActionTopics {
        &self.topics
    }

    /// Topics this server publishes: status, feedback and result.
    pub fn published_topics(&self) -> [&str; 3] {
        self.topics.published_by_server()
    }

    /// Topics this server subscribes to: goal and cancel.
    pub fn subscribed_topics(&self) -> [&str; 2] {
        self.topics.subscribed_by_server()
    }

    pub fn add_listener(&self, listener: Arc<dyn ActionServerListener<G>>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// Removes every listener and returns them.
    pub fn detach_all_listeners(&self) -> Vec<Arc<dyn ActionServerListener<G>>> {
        self.listeners.clear()
    }

    fn on_goal(&self, message: Arc<dyn ActionMessage>) {
        let action_goal = match expect_message::<ActionGoal<G>>(&message, &self.topics.goal) {
            Ok(action_goal) => action_goal,
            Err(e) => {
                error!(error = %e, "Dropping message");
                return;
            }
        };
        let goal_id = action_goal.goal_id.id.clone();

        let server_goal = match self.goals.entry(goal_id.clone()) {
            Entry::Occupied(_) => {
                debug!(goal_id = %goal_id, "Goal already tracked, ignoring duplicate");
                return;
            }
            Entry::Vacant(vacant) => {
                let server_goal = Arc::new(ServerGoal::new(action_goal, self.strict_transitions));
                vacant.insert(server_goal.clone());
                server_goal
            }
        };
        debug!(goal_id = %goal_id, "Goal received");

        self.listeners.for_each(|listener| {
            listener.goal_received(server_goal.goal());
            let event = if listener.accept_goal(server_goal.goal()) {
                ServerEvent::Accept
            } else {
                ServerEvent::Reject
            };
            if let Err(e) = server_goal.state_machine.transition(event) {
                error!(goal_id = %goal_id, error = %e, "Listener decision could not be applied");
            }
        });
    }

    fn on_cancel(&self, message: Arc<dyn ActionMessage>) {
        let goal_id = match expect_message::<GoalId>(&message, &self.topics.cancel) {
            Ok(goal_id) => goal_id,
            Err(e) => {
                error!(error = %e, "Dropping message");
                return;
            }
        };
        debug!(goal_id = %goal_id, "Cancel received");
        self.listeners
            .for_each(|listener| listener.cancel_received(&goal_id));
    }

    fn goal(&self, goal_id: &str) -> Result<Arc<ServerGoal<G>>, ActionlibError> {
        self.goals
            .get(goal_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ActionlibError::GoalNotTracked(goal_id.to_string()))
    }

    /// Current status of `goal_id`, or `None` if it is not tracked.
    pub fn goal_state(&self, goal_id: &str) -> Option<GoalStatus> {
        self.goals.get(goal_id).map(|entry| entry.state())
    }

    /// The goal registered under `goal_id`.
    pub fn goal_of(&self, goal_id: &str) -> Option<ActionGoal<G>> {
        self.goals.get(goal_id).map(|entry| entry.goal().clone())
    }

    /// Number of goals in the registry.
    pub fn goal_count(&self) -> usize {
        self.goals.len()
    }

    /// Applies `event` to the goal registered under `goal_id`.
    pub fn transition_goal(
        &self,
        goal_id: &str,
        event: ServerEvent,
    ) -> Result<GoalStatus, ActionlibError> {
        self.goal(goal_id)?.state_machine.transition(event)
    }

    pub fn set_succeed(&self, goal_id: &str) -> Result<GoalStatus, ActionlibError> {
        self.transition_goal(goal_id, ServerEvent::Succeed)
    }

    pub fn set_abort(&self, goal_id: &str) -> Result<GoalStatus, ActionlibError> {
        self.transition_goal(goal_id, ServerEvent::Abort)
    }

    /// Drives `CANCEL_REQUEST` followed by `CANCEL`.
    pub fn set_preempt(&self, goal_id: &str) -> Result<GoalStatus, ActionlibError> {
        let goal = self.goal(goal_id)?;
        goal.state_machine.transition(ServerEvent::CancelRequest)?;
        goal.state_machine.transition(ServerEvent::Cancel)
    }

    /// A status entry for `goal_id` carrying its current status.
    pub fn goal_status_message(&self, goal_id: &str) -> Result<GoalStatusMessage, ActionlibError> {
        Ok(self.goal(goal_id)?.status_message())
    }

    /// A feedback message for `goal_id` carrying its current status.
    pub fn feedback_for(&self, goal_id: &str, feedback: F) -> Result<ActionFeedback<F>, ActionlibError> {
        let status = self.goal_status_message(goal_id)?;
        Ok(ActionFeedback {
            header: Header::stamped(0, self.transport.now()),
            status,
            feedback,
        })
    }

    /// A result message for `goal_id` carrying its current status.
    pub fn result_for(&self, goal_id: &str, result: R) -> Result<ActionResult<R>, ActionlibError> {
        let status = self.goal_status_message(goal_id)?;
        Ok(ActionResult {
            header: Header::stamped(0, self.transport.now()),
            status,
            result,
        })
    }

    /// Stops tracking `goal_id`, returning its goal.
    pub fn remove_goal(&self, goal_id: &str) -> Option<ActionGoal<G>> {
        self.goals
            .remove(goal_id)
            .map(|(_, server_goal)| server_goal.goal().clone())
    }

    /// Drops every goal in a terminal status and returns how many were removed.
    pub fn prune_terminal_goals(&self) -> usize {
        let before = self.goals.len();
        self.goals.retain(|_, server_goal| !server_goal.state().is_terminal());
        let removed = before.saturating_sub(self.goals.len());
        if removed > 0 {
            debug!(removed, "Pruned terminal goals");
        }
        removed
    }

    /// One entry per tracked goal, ordered by goal stamp and id.
    pub fn status_snapshot(&self) -> GoalStatusArray {
        let mut status_list: Vec<GoalStatusMessage> = self
            .goals
            .iter()
            .map(|entry| entry.value().status_message())
            .collect();
        status_list.sort_by(|a, b| {
            (a.goal_id.stamp, &a.goal_id.id).cmp(&(b.goal_id.stamp, &b.goal_id.id))
        });
        GoalStatusArray {
            header: Header::stamped(
                self.status_seq.fetch_add(1, Ordering::Relaxed),
                self.transport.now(),
            ),
            status_list,
        }
    }

    /// Publishes a snapshot of every tracked goal on the status topic.
    pub async fn send_status_tick(&self) -> Result<(), ActionlibError> {
        let snapshot = self.status_snapshot();
        trace!(entries = snapshot.status_list.len(), "Status tick");
        self.send_status(snapshot).await?;
        if self.prune_terminal_goals {
            self.prune_terminal_goals();
        }
        Ok(())
    }

    pub async fn send_status(&self, status: GoalStatusArray) -> Result<(), ActionlibError> {
        self.ensure_connected()?;
        self.transport
            .publish(&self.topics.status, Arc::new(status))
            .await
    }

    pub async fn send_feedback(&self, feedback: ActionFeedback<F>) -> Result<(), ActionlibError> {
        self.ensure_connected()?;
        self.transport
            .publish(&self.topics.feedback, Arc::new(feedback))
            .await
    }

    pub async fn send_result(&self, result: ActionResult<R>) -> Result<(), ActionlibError> {
        self.ensure_connected()?;
        debug!(
            goal_id = %result.status.goal_id,
            status = GoalStatus::name_of(result.status.status),
            "Publishing result"
        );
        self.transport
            .publish(&self.topics.result, Arc::new(result))
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn ensure_connected(&self) -> Result<(), ActionlibError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActionlibError::NotConnected)
        }
    }

    /// Stops the heartbeat, detaches all listeners and releases the server's topics.
    #[instrument(skip(self), fields(action = %self.topics.action_name))]
    pub async fn shutdown(&self) -> Result<(), ActionlibError> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        let heartbeat = self.heartbeat.lock().take();
        if let Some(heartbeat) = heartbeat {
            heartbeat.cancellation_token.cancel();
            let abort = heartbeat.task.abort_handle();
            if tokio::time::timeout(self.shutdown_grace, heartbeat.task).await.is_err() {
                warn!("Status heartbeat did not stop within the grace period, aborting");
                abort.abort();
            }
        }
        self.listeners.clear();

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in &handles {
            self.transport.shutdown(handle, self.shutdown_grace).await?;
        }
        info!("Action server shut down");
        Ok(())
    }
}

impl<G, F, R> Drop for ActionServer<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn drop(&mut self) {
        if let Some(heartbeat) = self.heartbeat.get_mut().take() {
            heartbeat.cancellation_token.cancel();
        }
        let handles = std::mem::take(self.handles.get_mut());
        if handles.is_empty() {
            return;
        }
        let transport = self.transport.clone();
        let grace = self.shutdown_grace;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    for handle in &handles {
                        if let Err(e) = transport.shutdown(handle, grace).await {
                            warn!(%handle, error = %e, "Failed to release topic");
                        }
                    }
                });
            }
            Err(_) => warn!(
                count = handles.len(),
                "Action server dropped outside a runtime, topics left registered"
            ),
        }
    }
}
