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
use serde::{Deserialize, Serialize};

use crate::message::{GoalId, GoalStatus, GoalStatusMessage, Header};
use crate::traits::{HasGoalId, HasGoalStatus, HasHeader};

/// A goal request as published by a client on the `goal` topic.
///
/// Wraps the application payload `G` together with the header and the identity the
/// protocol tracks it by.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionGoal<G> {
    /// Sequence number and submission time.
    pub header: Header,
    /// Identity of this goal.
    pub goal_id: GoalId,
    /// Application payload.
    pub goal: G,
}

impl<G> ActionGoal<G> {
    /// Wraps `goal` with a default header and a blank goal id.
    pub fn new(goal: G) -> Self {
        Self {
            header: Header::default(),
            goal_id: GoalId::default(),
            goal,
        }
    }

    /// Wraps `goal` under an explicit identity.
    pub fn with_id(goal: G, goal_id: GoalId) -> Self {
        Self {
            header: Header::default(),
            goal_id,
            goal,
        }
    }
}

/// Progress report for one goal, published by the server on the `feedback` topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionFeedback<F> {
    pub header: Header,
    /// The goal the feedback belongs to and its status at the time of publishing.
    pub status: GoalStatusMessage,
    pub feedback: F,
}

impl<F> ActionFeedback<F> {
    pub fn new(goal_id: GoalId, status: GoalStatus, feedback: F) -> Self {
        Self {
            header: Header::default(),
            status: GoalStatusMessage::new(goal_id, status),
            feedback,
        }
    }
}

/// Terminal outcome for one goal, published by the server on the `result` topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionResult<R> {
    pub header: Header,
    /// The goal the result belongs to and its final status.
    pub status: GoalStatusMessage,
    pub result: R,
}

impl<R> ActionResult<R> {
    pub fn new(goal_id: GoalId, status: GoalStatus, result: R) -> Self {
        Self {
            header: Header::default(),
            status: GoalStatusMessage::new(goal_id, status),
            result,
        }
    }
}

impl<G> HasHeader for ActionGoal<G> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

impl<G> HasGoalId for ActionGoal<G> {
    fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }
}

impl<F> HasHeader for ActionFeedback<F> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

impl<F> HasGoalId for ActionFeedback<F> {
    fn goal_id(&self) -> &GoalId {
        &self.status.goal_id
    }
}

impl<F> HasGoalStatus for ActionFeedback<F> {
    fn status(&self) -> &GoalStatusMessage {
        &self.status
    }
}

impl<R> HasHeader for ActionResult<R> {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

impl<R> HasGoalId for ActionResult<R> {
    fn goal_id(&self) -> &GoalId {
        &self.status.goal_id
    }
}

impl<R> HasGoalStatus for ActionResult<R> {
    fn status(&self) -> &GoalStatusMessage {
        &self.status
    }
}
