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

use crate::message::{ActionFeedback, ActionGoal, ActionResult, GoalId, GoalStatusArray};

/// Receives every status array an [`ActionClient`](crate::client::ActionClient) sees.
///
/// Implemented for any `Fn(&GoalStatusArray) + Send + Sync`.
pub trait StatusListener: Send + Sync {
    fn status_received(&self, status: &GoalStatusArray);
}

/// Receives every feedback message an action client sees, whether or not it matches the
/// goal the client currently tracks.
pub trait FeedbackListener<F>: Send + Sync {
    fn feedback_received(&self, feedback: &ActionFeedback<F>);
}

/// Receives every result message an action client sees.
pub trait ResultListener<R>: Send + Sync {
    fn result_received(&self, result: &ActionResult<R>);
}

impl<Func> StatusListener for Func
where
    Func: Fn(&GoalStatusArray) + Send + Sync,
{
    fn status_received(&self, status: &GoalStatusArray) {
        self(status);
    }
}

impl<F, Func> FeedbackListener<F> for Func
where
    Func: Fn(&ActionFeedback<F>) + Send + Sync,
{
    fn feedback_received(&self, feedback: &ActionFeedback<F>) {
        self(feedback);
    }
}

impl<R, Func> ResultListener<R> for Func
where
    Func: Fn(&ActionResult<R>) + Send + Sync,
{
    fn result_received(&self, result: &ActionResult<R>) {
        self(result);
    }
}

/// Application hooks of an [`ActionServer`](crate::server::ActionServer).
///
/// Callbacks run on the transport's delivery task and should return quickly; long-running
/// work belongs on a spawned task that later drives the goal through
/// [`ActionServer::set_succeed`](crate::server::ActionServer::set_succeed) and friends.
pub trait ActionServerListener<G>: Send + Sync {
    /// A goal has been registered at `PENDING`.
    fn goal_received(&self, _goal: &ActionGoal<G>) {}

    /// A client asked to cancel `goal_id`.
    ///
    /// The listener decides whether and when to drive `CANCEL_REQUEST` and `CANCEL`.
    fn cancel_received(&self, _goal_id: &GoalId) {}

    /// Whether the server should accept `goal`.
    fn accept_goal(&self, goal: &ActionGoal<G>) -> bool;
}
