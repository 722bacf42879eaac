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
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use static_assertions::assert_impl_all;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::client::{ActionFuture, ClientGoalManager, ClientState};
use crate::common::{
    ActionTopics, ActionlibConfig, FeedbackListeners, GoalIdGenerator, ListenerId,
    ResultListeners, SharedTransport, StatusListeners, CONFIG,
};
use crate::message::{
    ActionFeedback, ActionGoal, ActionResult, ActionlibError, GoalId, GoalStatusArray, Header,
};
use crate::traits::{
    expect_message, ActionMessage, ActionPayload, FeedbackListener, HasGoalId, MessageHandler,
    ResultListener, StatusListener, TopicHandle,
};

/// Ids returned by [`ActionClient::add_listeners`], one per listener kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerIds {
    pub status: ListenerId,
    pub feedback: ListenerId,
    pub result: ListenerId,
}

/// The client side of one action.
///
/// An `ActionClient` publishes on the action's `goal` and `cancel` topics and subscribes to
/// `status`, `feedback` and `result`. It tracks the most recently sent goal in a
/// [`ClientGoalManager`], reconciling the server's reports against it, and fans every
/// delivered message out to the registered listeners, whether or not it concerns the
/// tracked goal.
///
/// Clients are created connected and shared behind an [`Arc`]; every
/// [`ActionFuture`] keeps its client alive. Call [`shutdown`](Self::shutdown) to release
/// the topic registrations within the configured grace period. Dropping the last handle
/// without shutting down releases them on a background task.
///
/// # Type Parameters
///
/// * `G`: the application goal payload.
/// * `F`: the application feedback payload.
/// * `R`: the application result payload.
#[derive(Debug)]
pub struct ActionClient<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    topics: ActionTopics,
    transport: SharedTransport,
    goal_id_generator: GoalIdGenerator,
    goal_manager: RwLock<ClientGoalManager<G>>,
    status_listeners: StatusListeners,
    feedback_listeners: FeedbackListeners<F>,
    result_listeners: ResultListeners<R>,
    handles: Mutex<Vec<TopicHandle>>,
    goal_seq: AtomicU32,
    connected: AtomicBool,
    shutdown_grace: Duration,
    server_wait_poll: Duration,
}

assert_impl_all!(ActionClient<(), (), ()>: Send, Sync);

impl<G, F, R> ActionClient<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    /// Connects a client for `action_name` using the global configuration.
    pub async fn connect(
        transport: SharedTransport,
        action_name: &str,
    ) -> Result<Arc<Self>, ActionlibError> {
        Self::connect_with_config(transport, action_name, &CONFIG).await
    }

    /// Connects a client for `action_name`.
    ///
    /// Goal ids are generated with `defaults.node_name` as their prefix and a counter shared
    /// by every client in the process.
    pub async fn connect_with_config(
        transport: SharedTransport,
        action_name: &str,
        config: &ActionlibConfig,
    ) -> Result<Arc<Self>, ActionlibError> {
        let generator = GoalIdGenerator::new(config.defaults.node_name.clone(), transport.clone());
        Self::connect_with_generator(transport, action_name, generator, config).await
    }

    /// Connects a client that draws goal ids from `goal_id_generator`.
    #[instrument(skip(transport, goal_id_generator, config))]
    pub async fn connect_with_generator(
        transport: SharedTransport,
        action_name: &str,
        goal_id_generator: GoalIdGenerator,
        config: &ActionlibConfig,
    ) -> Result<Arc<Self>, ActionlibError> {
        let client = Arc::new(Self {
            topics: ActionTopics::new(action_name),
            transport,
            goal_id_generator,
            goal_manager: RwLock::new(ClientGoalManager::new()),
            status_listeners: StatusListeners::new(),
            feedback_listeners: FeedbackListeners::new(),
            result_listeners: ResultListeners::new(),
            handles: Mutex::new(Vec::new()),
            goal_seq: AtomicU32::new(0),
            connected: AtomicBool::new(true),
            shutdown_grace: config.topic_shutdown_grace(),
            server_wait_poll: config.server_wait_poll(),
        });

        let topics = &client.topics;
        let mut handles = Vec::with_capacity(5);
        handles.push(client.transport.advertise(&topics.goal).await?);
        handles.push(client.transport.advertise(&topics.cancel).await?);
        handles.push(
            client
                .transport
                .subscribe(&topics.result, Self::handler(&client, Self::on_result))
                .await?,
        );
        handles.push(
            client
                .transport
                .subscribe(&topics.feedback, Self::handler(&client, Self::on_feedback))
                .await?,
        );
        handles.push(
            client
                .transport
                .subscribe(&topics.status, Self::handler(&client, Self::on_status))
                .await?,
        );
        client.handles.lock().extend(handles);

        info!(action = %client.topics.action_name, "Action client connected");
        Ok(client)
    }

    /// Wraps a dispatch method into a transport handler that does not keep the client alive.
    fn handler(client: &Arc<Self>, dispatch: fn(&Self, Arc<dyn ActionMessage>)) -> MessageHandler {
        let client = Arc::downgrade(client);
        Arc::new(move |message: Arc<dyn ActionMessage>| {
            if let Some(client) = client.upgrade() {
                dispatch(&client, message);
            }
        })
    }

    /// Topic names of this action.
    pub fn topics(&self) -> &ActionTopics {
        &self.topics
    }

    pub fn add_status_listener(&self, listener: Arc<dyn StatusListener>) -> ListenerId {
        self.status_listeners.add(listener)
    }

    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.status_listeners.remove(id).is_some()
    }

    pub fn add_feedback_listener(&self, listener: Arc<dyn FeedbackListener<F>>) -> ListenerId {
        self.feedback_listeners.add(listener)
    }

    pub fn remove_feedback_listener(&self, id: ListenerId) -> bool {
        self.feedback_listeners.remove(id).is_some()
    }

    pub fn add_result_listener(&self, listener: Arc<dyn ResultListener<R>>) -> ListenerId {
        self.result_listeners.add(listener)
    }

    pub fn remove_result_listener(&self, id: ListenerId) -> bool {
        self.result_listeners.remove(id).is_some()
    }

    /// Registers one object as status, feedback and result listener at once.
    pub fn add_listeners<L>(&self, listener: Arc<L>) -> ListenerIds
    where
        L: StatusListener + FeedbackListener<F> + ResultListener<R> + 'static,
    {
        ListenerIds {
            status: self.status_listeners.add(listener.clone()),
            feedback: self.feedback_listeners.add(listener.clone()),
            result: self.result_listeners.add(listener),
        }
    }

    /// Removes the three registrations made by [`add_listeners`](Self::add_listeners).
    pub fn remove_listeners(&self, ids: ListenerIds) {
        self.status_listeners.remove(ids.status);
        self.feedback_listeners.remove(ids.feedback);
        self.result_listeners.remove(ids.result);
    }

    /// Submits `goal` and returns a future tracking it.
    ///
    /// A blank or missing `id` is replaced by a generated one. The new goal replaces
    /// whatever goal this client tracked before.
    #[instrument(skip(self, goal), fields(action = %self.topics.action_name))]
    pub async fn send_goal(
        self: &Arc<Self>,
        goal: G,
        id: Option<&str>,
    ) -> Result<ActionFuture<G, F, R>, ActionlibError> {
        self.ensure_connected()?;

        let mut action_goal = ActionGoal::new(goal);
        action_goal.goal_id = GoalId::new(id.unwrap_or_default().to_string(), self.transport.now());
        if action_goal.goal_id.is_blank() {
            self.goal_id_generator.generate(&mut action_goal.goal_id);
        }
        action_goal.header = Header::stamped(
            self.goal_seq.fetch_add(1, Ordering::Relaxed),
            self.transport.now(),
        );

        if self.is_active() {
            warn!(
                state = %self.goal_state(),
                "Replacing a goal that is still running"
            );
        }

        let future = ActionFuture::attach(self.clone(), &action_goal);
        if let Err(e) = self.send_goal_wire(action_goal).await {
            future.detach();
            return Err(e);
        }
        Ok(future)
    }

    /// Binds `action_goal` as the tracked goal and publishes it as is.
    pub async fn send_goal_wire(&self, action_goal: ActionGoal<G>) -> Result<(), ActionlibError> {
        self.ensure_connected()?;
        debug!(goal_id = %action_goal.goal_id, "Publishing goal");
        self.goal_manager.write().set_goal(action_goal.clone());
        self.transport
            .publish(&self.topics.goal, Arc::new(action_goal))
            .await
    }

    /// Requests cancellation of `goal_id`.
    ///
    /// When `goal_id` is the tracked goal its state machine moves to
    /// `WaitingForCancelAck` if it still can; the returned flag reports whether it did.
    /// The cancel message is published in every case.
    #[instrument(skip(self), fields(action = %self.topics.action_name))]
    pub async fn send_cancel(&self, goal_id: &GoalId) -> Result<bool, ActionlibError> {
        self.ensure_connected()?;
        let cancelled = {
            let manager = self.goal_manager.read();
            manager.tracks(goal_id) && manager.cancel_goal()
        };
        debug!(goal_id = %goal_id, cancelled, "Publishing cancel");
        self.transport
            .publish(&self.topics.cancel, Arc::new(goal_id.clone()))
            .await?;
        Ok(cancelled)
    }

    /// Whether a server is subscribed to the goal and cancel topics and publishes the
    /// status, feedback and result topics.
    pub fn is_server_connected(&self) -> bool {
        self.topics
            .subscribed_by_server()
            .iter()
            .all(|topic| self.transport.has_subscribers(topic))
            && self
                .topics
                .published_by_server()
                .iter()
                .all(|topic| self.transport.has_publishers(topic))
    }

    /// Polls until a server is connected.
    ///
    /// A zero `timeout`, or one too large to represent as a deadline, waits without bound.
    /// Returns `false` if `timeout` elapsed first.
    #[instrument(skip(self), fields(action = %self.topics.action_name))]
    pub async fn wait_for_action_server_to_start(&self, timeout: Duration) -> bool {
        let deadline = if timeout.is_zero() {
            None
        } else {
            Instant::now().checked_add(timeout)
        };
        loop {
            if self.is_server_connected() {
                debug!("Action server found");
                return true;
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!("Timed out waiting for the action server");
                return false;
            }
            tokio::time::sleep(self.server_wait_poll).await;
        }
    }

    /// State of the tracked goal.
    pub fn goal_state(&self) -> ClientState {
        self.goal_manager.read().goal_state()
    }

    /// Whether the tracked goal is still running.
    pub fn is_active(&self) -> bool {
        self.goal_state().is_running()
    }

    /// Id of the tracked goal, if any.
    pub fn goal_id(&self) -> Option<GoalId> {
        self.goal_manager.read().goal_id().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Unregisters all listeners and releases the client's topics.
    #[instrument(skip(self), fields(action = %self.topics.action_name))]
    pub async fn shutdown(&self) -> Result<(), ActionlibError> {
        if !self.connected.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.status_listeners.clear();
        self.feedback_listeners.clear();
        self.result_listeners.clear();

        let handles = std::mem::take(&mut *self.handles.lock());
        for handle in &handles {
            self.transport.shutdown(handle, self.shutdown_grace).await?;
        }
        info!("Action client shut down");
        Ok(())
    }

    fn ensure_connected(&self) -> Result<(), ActionlibError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(ActionlibError::NotConnected)
        }
    }

    fn on_result(&self, message: Arc<dyn ActionMessage>) {
        let result = match expect_message::<ActionResult<R>>(&message, &self.topics.result) {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Dropping message");
                return;
            }
        };
        trace!(goal_id = %result.goal_id(), "Result received");
        {
            let manager = self.goal_manager.read();
            if manager.tracks(result.goal_id()) {
                manager.update_status(result.status.status);
                manager.result_received();
            } else {
                debug!(goal_id = %result.goal_id(), "Result is not for the tracked goal");
            }
        }
        self.result_listeners
            .for_each(|listener| listener.result_received(&result));
    }

    fn on_feedback(&self, message: Arc<dyn ActionMessage>) {
        let feedback = match expect_message::<ActionFeedback<F>>(&message, &self.topics.feedback) {
            Ok(feedback) => feedback,
            Err(e) => {
                error!(error = %e, "Dropping message");
                return;
            }
        };
        trace!(goal_id = %feedback.goal_id(), "Feedback received");
        {
            let manager = self.goal_manager.read();
            if manager.tracks(feedback.goal_id()) {
                manager.update_status(feedback.status.status);
            }
        }
        self.feedback_listeners
            .for_each(|listener| listener.feedback_received(&feedback));
    }

    fn on_status(&self, message: Arc<dyn ActionMessage>) {
        let status = match expect_message::<GoalStatusArray>(&message, &self.topics.status) {
            Ok(status) => status,
            Err(e) => {
                error!(error = %e, "Dropping message");
                return;
            }
        };
        trace!(entries = status.status_list.len(), "Status received");
        {
            let manager = self.goal_manager.read();
            let entry = manager.goal_id().and_then(|goal_id| status.find(goal_id));
            match entry {
                Some(entry) => {
                    manager.update_status(entry.status);
                }
                None => trace!("Status array has no entry for the tracked goal"),
            }
        }
        self.status_listeners
            .for_each(|listener| listener.status_received(&status));
    }
}

impl<G, F, R> Drop for ActionClient<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn drop(&mut self) {
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
                "Action client dropped outside a runtime, topics left registered"
            ),
        }
    }
}
