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

use tracing::debug;

use crate::client::{ClientState, ClientStateMachine};
use crate::message::{ActionGoal, GoalId};

/// Binds one goal to one [`ClientStateMachine`].
///
/// A manager starts without a goal in [`ClientState::Error`]. Binding a goal with
/// [`set_goal`](Self::set_goal) replaces the previous one wholesale and restarts the
/// machine at [`ClientState::WaitingForGoalAck`].
#[derive(Debug)]
pub struct ClientGoalManager<G> {
    action_goal: Option<ActionGoal<G>>,
    state_machine: ClientStateMachine,
}

impl<G> Default for ClientGoalManager<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> ClientGoalManager<G> {
    pub fn new() -> Self {
        Self {
            action_goal: None,
            state_machine: ClientStateMachine::new(ClientState::Error),
        }
    }

    /// Binds `action_goal`, discarding any previously tracked goal.
    pub fn set_goal(&mut self, action_goal: ActionGoal<G>) {
        debug!(goal_id = %action_goal.goal_id, "Binding goal");
        self.action_goal = Some(action_goal);
        if self.state_machine.is_running() {
            self.state_machine.set_state(ClientState::Error);
        }
        self.state_machine
            .reset_to_state(ClientState::WaitingForGoalAck);
    }

    pub fn action_goal(&self) -> Option<&ActionGoal<G>> {
        self.action_goal.as_ref()
    }

    pub fn goal_id(&self) -> Option<&GoalId> {
        self.action_goal.as_ref().map(|goal| &goal.goal_id)
    }

    /// Whether `goal_id` names the bound goal.
    pub fn tracks(&self, goal_id: &GoalId) -> bool {
        self.goal_id().is_some_and(|tracked| tracked.same_goal(goal_id))
    }

    pub fn cancel_goal(&self) -> bool {
        self.state_machine.cancel()
    }

    pub fn result_received(&self) -> ClientState {
        self.state_machine.result_received()
    }

    /// Records `code` and applies it to the state machine, returning the inferred chain.
    pub fn update_status(&self, code: u8) -> Vec<ClientState> {
        self.state_machine.update_status(code);
        self.state_machine.transition(code)
    }

    pub fn goal_state(&self) -> ClientState {
        self.state_machine.state()
    }

    pub fn state_machine(&self) -> &ClientStateMachine {
        &self.state_machine
    }
}
