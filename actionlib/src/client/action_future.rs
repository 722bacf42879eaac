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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use static_assertions::assert_impl_all;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::client::{ActionClient, ClientGoalManager, ClientState, ListenerIds};
use crate::message::{ActionFeedback, ActionGoal, ActionResult, ActionlibError, GoalId, GoalStatusArray};
use crate::traits::{ActionPayload, FeedbackListener, HasGoalId, ResultListener, StatusListener};

/// Handle over the lifecycle of one submitted goal.
///
/// Returned by [`ActionClient::send_goal`]. The future listens to its client for messages
/// about its own goal and mirrors that goal's protocol state in a private
/// [`ClientGoalManager`], independent of whatever goal the client tracks later.
///
/// Waiting is woken by the result callback rather than polled. Once the result has been
/// received, or a wait has completed, the future stops listening. Dropping the future
/// also stops it listening.
#[derive(Debug)]
pub struct ActionFuture<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    client: Arc<ActionClient<G, F, R>>,
    shared: Arc<FutureShared<G, F, R>>,
}

assert_impl_all!(ActionFuture<(), (), ()>: Send, Sync);

/// State shared between an [`ActionFuture`] and the listener registrations on its client.
#[derive(Debug)]
struct FutureShared<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    goal_id: GoalId,
    goal_manager: ClientGoalManager<G>,
    latest_feedback: Mutex<Option<F>>,
    result: Mutex<Option<ActionResult<R>>>,
    changed: Notify,
    client: Weak<ActionClient<G, F, R>>,
    listener_ids: OnceLock<ListenerIds>,
    detached: AtomicBool,
}

impl<G, F, R> FutureShared<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn detach(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        if let (Some(client), Some(ids)) = (self.client.upgrade(), self.listener_ids.get()) {
            client.remove_listeners(*ids);
            trace!(goal_id = %self.goal_id, "Future detached");
        }
    }
}

impl<G, F, R> StatusListener for FutureShared<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn status_received(&self, status: &GoalStatusArray) {
        if let Some(entry) = status.find(&self.goal_id) {
            self.goal_manager.update_status(entry.status);
            self.changed.notify_waiters();
        }
    }
}

impl<G, F, R> FeedbackListener<F> for FutureShared<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn feedback_received(&self, feedback: &ActionFeedback<F>) {
        if feedback.goal_id().same_goal(&self.goal_id) {
            self.goal_manager.update_status(feedback.status.status);
            *self.latest_feedback.lock() = Some(feedback.feedback.clone());
            self.changed.notify_waiters();
        }
    }
}

impl<G, F, R> ResultListener<R> for FutureShared<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn result_received(&self, result: &ActionResult<R>) {
        if !result.goal_id().same_goal(&self.goal_id) {
            warn!(
                received = %result.goal_id(),
                waiting_for = %self.goal_id,
                "Result for another goal"
            );
            return;
        }
        debug!(goal_id = %self.goal_id, "Result received");
        // The result must be visible before the mirror reports done.
        *self.result.lock() = Some(result.clone());
        self.goal_manager.update_status(result.status.status);
        self.goal_manager.result_received();
        self.detach();
        self.changed.notify_waiters();
    }
}

impl<G, F, R> ActionFuture<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    /// Creates the future for `action_goal` and registers it on `client`.
    ///
    /// Must run before the goal is published so that no reply can be missed.
    pub(crate) fn attach(client: Arc<ActionClient<G, F, R>>, action_goal: &ActionGoal<G>) -> Self {
        let mut goal_manager = ClientGoalManager::new();
        goal_manager.set_goal(action_goal.clone());
        let shared = Arc::new(FutureShared {
            goal_id: action_goal.goal_id.clone(),
            goal_manager,
            latest_feedback: Mutex::new(None),
            result: Mutex::new(None),
            changed: Notify::new(),
            client: Arc::downgrade(&client),
            listener_ids: OnceLock::new(),
            detached: AtomicBool::new(false),
        });
        let ids = client.add_listeners(shared.clone());
        let _ = shared.listener_ids.set(ids);
        Self { client, shared }
    }

    pub fn goal_id(&self) -> &GoalId {
        &self.shared.goal_id
    }

    /// The last feedback payload received for this goal.
    pub fn latest_feedback(&self) -> Option<F> {
        self.shared.latest_feedback.lock().clone()
    }

    /// The result, if it has arrived. Does not wait.
    pub fn latest_result(&self) -> Option<ActionResult<R>> {
        self.shared.result.lock().clone()
    }

    /// State of this goal's private mirror.
    pub fn current_state(&self) -> ClientState {
        self.shared.goal_manager.goal_state()
    }

    /// True once the mirror is no longer running.
    pub fn is_done(&self) -> bool {
        !self.current_state().is_running()
    }

    /// True while the goal is running and no result has arrived.
    ///
    /// This is a heuristic and does not confirm that a cancel was acknowledged.
    pub fn is_cancelled(&self) -> bool {
        self.current_state().is_running() && self.shared.result.lock().is_none()
    }

    /// Sends a cancel request for this goal.
    ///
    /// Cancellation is asynchronous: the outcome is observed later through status and
    /// result messages, so this always reports `true`.
    pub async fn cancel(&self) -> bool {
        if let Err(e) = self.client.send_cancel(&self.shared.goal_id).await {
            warn!(goal_id = %self.shared.goal_id, error = %e, "Cancel could not be published");
        }
        self.shared.goal_manager.cancel_goal();
        true
    }

    /// Waits for the goal to finish, stops listening and returns the result.
    pub async fn get(&self) -> Result<ActionResult<R>, ActionlibError> {
        self.wait_until_done().await;
        self.detach();
        self.finished_result()
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    ///
    /// On timeout the future keeps listening, so a later call can still succeed.
    pub async fn get_timeout(&self, timeout: Duration) -> Result<ActionResult<R>, ActionlibError> {
        match tokio::time::timeout(timeout, self.wait_until_done()).await {
            Ok(()) => {
                self.detach();
                self.finished_result()
            }
            Err(_) => {
                trace!(goal_id = %self.shared.goal_id, ?timeout, "Wait timed out");
                Err(ActionlibError::Timeout { waited: timeout })
            }
        }
    }

    /// Blocking form of [`get`](Self::get) for synchronous callers.
    ///
    /// Returns [`ActionlibError::BlockingInRuntime`] without waiting when called from within
    /// a tokio runtime, where blocking would stall the tasks delivering the result.
    pub fn get_blocking(&self) -> Result<ActionResult<R>, ActionlibError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ActionlibError::BlockingInRuntime);
        }
        futures::executor::block_on(self.get())
    }

    /// Waits like [`get`](Self::get) and discards the result.
    pub async fn wait(&self) -> Result<(), ActionlibError> {
        self.get().await.map(|_| ())
    }

    /// Waits like [`get`](Self::get) and reports whether a result arrived.
    pub async fn received_result(&self) -> bool {
        self.get().await.is_ok()
    }

    /// Stops listening to the client. Idempotent.
    pub fn detach(&self) {
        self.shared.detach();
    }

    async fn wait_until_done(&self) {
        loop {
            let changed = self.shared.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();
            if self.is_done() {
                return;
            }
            changed.await;
        }
    }

    fn finished_result(&self) -> Result<ActionResult<R>, ActionlibError> {
        self.latest_result()
            .ok_or_else(|| ActionlibError::MissingResult {
                goal_id: self.shared.goal_id.id.clone(),
                state: self.current_state().to_string(),
            })
    }
}

impl<G, F, R> Drop for ActionFuture<G, F, R>
where
    G: ActionPayload,
    F: ActionPayload,
    R: ActionPayload,
{
    fn drop(&mut self) {
        self.shared.detach();
    }
}
