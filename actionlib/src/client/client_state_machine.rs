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

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::client::ClientState;
use crate::message::GoalStatus;

/// Ordered client states inferred from receiving status `code` while in `from`.
///
/// Status reports arrive on a heartbeat rather than on every change, so one report can
/// stand for several protocol steps; the returned chain lists all of them, the last entry
/// being the resulting state. An empty chain means no transition. A status the state cannot
/// accept yields `[InvalidTransition]`. `LOST`, unknown codes and the sentinel or terminal
/// states outside the table never transition.
pub fn transition_chain(from: ClientState, code: u8) -> Vec<ClientState> {
    use ClientState::{
        Active as ACT, Done as DNE, InvalidTransition as X, Pending as PND, Preempting as PMT,
        Recalling as RCL, WaitingForCancelAck as WFC, WaitingForGoalAck as WFA,
        WaitingForResult as WFR,
    };
    use GoalStatus::{
        Aborted, Active, Pending, Preempted, Preempting, Recalled, Recalling, Rejected, Succeeded,
    };

    let Some(status) = GoalStatus::from_code(code) else {
        return Vec::new();
    };

    let chain: &[ClientState] = match (from, status) {
        (_, GoalStatus::Lost) => &[],

        (WFA, Pending) => &[PND],
        (WFA, Active) => &[ACT],
        (WFA, Rejected) => &[PND, WFR],
        (WFA, Recalling) => &[PND, RCL],
        (WFA, Recalled) => &[PND, WFR],
        (WFA, Preempted) => &[ACT, PMT, WFR],
        (WFA, Succeeded | Aborted) => &[ACT, WFR],
        (WFA, Preempting) => &[ACT, PMT],

        (PND, Pending) => &[],
        (PND, Active) => &[ACT],
        (PND, Rejected) => &[WFR],
        (PND, Recalling) => &[RCL],
        (PND, Recalled) => &[RCL, WFR],
        (PND, Preempted) => &[ACT, PMT, WFR],
        (PND, Succeeded | Aborted) => &[ACT, WFR],
        (PND, Preempting) => &[ACT, PMT],

        (ACT, Active) => &[],
        (ACT, Pending | Rejected | Recalling | Recalled) => &[X],
        (ACT, Preempted) => &[PMT, WFR],
        (ACT, Succeeded | Aborted) => &[WFR],
        (ACT, Preempting) => &[PMT],

        (WFR, Pending | Recalling | Preempting) => &[X],
        (WFR, Active | Rejected | Recalled | Preempted | Succeeded | Aborted) => &[],

        (WFC | RCL, Pending | Active) => &[],
        (WFC | RCL, Rejected) => &[WFR],
        (WFC | RCL, Recalling) => &[RCL],
        (WFC | RCL, Recalled) => &[RCL, WFR],
        (WFC | RCL, Preempted | Succeeded | Aborted) => &[PMT, WFR],
        (WFC | RCL, Preempting) => &[PMT],

        (PMT, Pending | Active | Rejected | Recalling | Recalled) => &[X],
        (PMT, Preempted | Succeeded | Aborted) => &[WFR],
        (PMT, Preempting) => &[],

        (DNE, Pending | Active | Recalling | Preempting) => &[X],
        (DNE, Rejected | Recalled | Preempted | Succeeded | Aborted) => &[],

        _ => &[],
    };
    chain.to_vec()
}

#[derive(Debug, Clone, Copy)]
struct MachineState {
    state: ClientState,
    latest_goal_status: Option<GoalStatus>,
}

/// Client-side state machine for one goal.
///
/// Every operation is a single critical section over this machine's own lock, so separate
/// goals never contend.
#[derive(Debug)]
pub struct ClientStateMachine {
    inner: Mutex<MachineState>,
}

impl Default for ClientStateMachine {
    fn default() -> Self {
        Self::new(ClientState::Error)
    }
}

impl ClientStateMachine {
    pub fn new(initial: ClientState) -> Self {
        Self {
            inner: Mutex::new(MachineState {
                state: initial,
                latest_goal_status: None,
            }),
        }
    }

    pub fn state(&self) -> ClientState {
        self.inner.lock().state
    }

    /// Overwrites the state, keeping the recorded status.
    pub fn set_state(&self, state: ClientState) {
        let mut inner = self.inner.lock();
        debug!(from = %inner.state, to = %state, "Client state set");
        inner.state = state;
    }

    /// Sets the state and forgets the recorded status, as when binding a new goal.
    pub fn reset_to_state(&self, state: ClientState) {
        let mut inner = self.inner.lock();
        debug!(from = %inner.state, to = %state, "Client state reset");
        inner.state = state;
        inner.latest_goal_status = None;
    }

    /// Records `code` as the latest observed status unless the goal is already `Done`.
    pub fn update_status(&self, code: u8) {
        let mut inner = self.inner.lock();
        if inner.state != ClientState::Done {
            inner.latest_goal_status = GoalStatus::from_code(code);
        }
    }

    /// The status recorded by the last [`update_status`](Self::update_status), if any.
    pub fn latest_goal_status(&self) -> Option<GoalStatus> {
        self.inner.lock().latest_goal_status
    }

    /// The chain [`transition`](Self::transition) would apply for `code`, without applying it.
    pub fn peek_transition(&self, code: u8) -> Vec<ClientState> {
        transition_chain(self.state(), code)
    }

    /// Applies the status `code` and returns the inferred chain.
    ///
    /// The machine ends in the last state of the chain. An invalid transition is logged and
    /// leaves the state unchanged.
    pub fn transition(&self, code: u8) -> Vec<ClientState> {
        let mut inner = self.inner.lock();
        let chain = transition_chain(inner.state, code);
        match chain.last() {
            Some(ClientState::InvalidTransition) => {
                warn!(
                    state = %inner.state,
                    status = GoalStatus::name_of(code),
                    "Invalid client transition ignored"
                );
            }
            Some(&next) => {
                trace!(from = %inner.state, to = %next, ?chain, "Client transition");
                inner.state = next;
            }
            None => trace!(state = %inner.state, status = GoalStatus::name_of(code), "No transition"),
        }
        chain
    }

    /// Moves to `WaitingForCancelAck` if the goal can still be cancelled.
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        let cancellable = inner.state.is_among(&[
            ClientState::WaitingForGoalAck,
            ClientState::Pending,
            ClientState::Active,
        ]);
        if cancellable {
            debug!(from = %inner.state, "Cancel requested");
            inner.state = ClientState::WaitingForCancelAck;
        }
        cancellable
    }

    /// Marks the goal `Done`, or `Error` if no result was expected. Returns the new state.
    pub fn result_received(&self) -> ClientState {
        let mut inner = self.inner.lock();
        inner.state = if inner.state == ClientState::WaitingForResult {
            ClientState::Done
        } else {
            warn!(state = %inner.state, "Result received out of turn");
            ClientState::Error
        };
        inner.state
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ClientState::*;

    #[test]
    fn pending_from_goal_ack() {
        let machine = ClientStateMachine::new(WaitingForGoalAck);
        assert_eq!(machine.transition(GoalStatus::Pending.code()), vec![Pending]);
        assert_eq!(machine.state(), Pending);
    }

    #[test]
    fn rejected_from_goal_ack_infers_pending_first() {
        let machine = ClientStateMachine::new(WaitingForGoalAck);
        assert_eq!(
            machine.transition(GoalStatus::Rejected.code()),
            vec![Pending, WaitingForResult]
        );
        assert_eq!(machine.state(), WaitingForResult);
    }

    #[test]
    fn invalid_transition_keeps_state() {
        let machine = ClientStateMachine::new(Active);
        assert_eq!(
            machine.transition(GoalStatus::Pending.code()),
            vec![InvalidTransition]
        );
        assert_eq!(machine.state(), Active);
    }

    #[test]
    fn lost_and_unknown_codes_do_nothing() {
        for state in ClientState::ALL {
            assert!(transition_chain(state, GoalStatus::Lost.code()).is_empty());
            assert!(transition_chain(state, 200).is_empty());
        }
    }

    #[test]
    fn states_outside_the_table_never_transition() {
        for state in [Error, InvalidTransition, NoTransition, Lost, Unknown] {
            for status in GoalStatus::ALL {
                assert!(transition_chain(state, status.code()).is_empty());
            }
        }
    }

    #[test]
    fn cancel_only_from_cancellable_states() {
        for state in ClientState::ALL {
            let machine = ClientStateMachine::new(state);
            let cancelled = machine.cancel();
            let expected = matches!(state, WaitingForGoalAck | Pending | Active);
            assert_eq!(cancelled, expected, "{state}");
            if expected {
                assert_eq!(machine.state(), WaitingForCancelAck);
                assert!(!machine.cancel());
            } else {
                assert_eq!(machine.state(), state);
            }
        }
    }

    #[test]
    fn result_is_done_only_when_waiting_for_it() {
        for state in ClientState::ALL {
            let machine = ClientStateMachine::new(state);
            let expected = if state == WaitingForResult { Done } else { Error };
            assert_eq!(machine.result_received(), expected, "{state}");
            assert_eq!(machine.state(), expected);
        }
    }

    #[test]
    fn latest_status_is_frozen_once_done() {
        let machine = ClientStateMachine::new(Active);
        machine.update_status(GoalStatus::Active.code());
        assert_eq!(machine.latest_goal_status(), Some(GoalStatus::Active));

        machine.set_state(Done);
        machine.update_status(GoalStatus::Succeeded.code());
        assert_eq!(machine.latest_goal_status(), Some(GoalStatus::Active));

        machine.reset_to_state(WaitingForGoalAck);
        assert_eq!(machine.latest_goal_status(), None);
    }
}
