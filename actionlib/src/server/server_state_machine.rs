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

use std::fmt::{Display, Formatter};

use parking_lot::Mutex;
use tracing::{error, trace};

use crate::message::{ActionlibError, GoalStatus};

/// Events that drive a server-side goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServerEvent {
    CancelRequest = 1,
    Cancel = 2,
    Reject = 3,
    Accept = 4,
    Succeed = 5,
    Abort = 6,
}

impl ServerEvent {
    pub const ALL: [Self; 6] = [
        Self::CancelRequest,
        Self::Cancel,
        Self::Reject,
        Self::Accept,
        Self::Succeed,
        Self::Abort,
    ];

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CancelRequest => "CANCEL_REQUEST",
            Self::Cancel => "CANCEL",
            Self::Reject => "REJECT",
            Self::Accept => "ACCEPT",
            Self::Succeed => "SUCCEED",
            Self::Abort => "ABORT",
        }
    }
}

impl Display for ServerEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

/// The status `state` moves to on `event`, or `None` if the pair is invalid.
pub const fn next_state(state: GoalStatus, event: ServerEvent) -> Option<GoalStatus> {
    use GoalStatus as S;
    use ServerEvent as E;

    match (state, event) {
        (S::Pending, E::Accept) => Some(S::Active),
        (S::Pending, E::Reject) => Some(S::Rejected),
        (S::Pending, E::CancelRequest) => Some(S::Recalling),

        (S::Recalling, E::Accept) => Some(S::Preempting),
        (S::Recalling, E::Reject) => Some(S::Rejected),
        (S::Recalling, E::Cancel) => Some(S::Recalled),

        (S::Active, E::CancelRequest) => Some(S::Preempting),
        (S::Active, E::Succeed) => Some(S::Succeeded),
        (S::Active, E::Abort) => Some(S::Aborted),

        (S::Preempting, E::Cancel) => Some(S::Preempted),
        (S::Preempting, E::Succeed) => Some(S::Succeeded),
        (S::Preempting, E::Abort) => Some(S::Aborted),

        _ => None,
    }
}

/// Server-side state machine for one goal, starting at `PENDING`.
#[derive(Debug)]
pub struct ServerStateMachine {
    state: Mutex<GoalStatus>,
    strict: bool,
}

impl Default for ServerStateMachine {
    fn default() -> Self {
        Self::new(false)
    }
}

impl ServerStateMachine {
    /// With `strict` set, invalid events are returned as errors instead of only logged.
    pub fn new(strict: bool) -> Self {
        Self {
            state: Mutex::new(GoalStatus::Pending),
            strict,
        }
    }

    pub fn state(&self) -> GoalStatus {
        *self.state.lock()
    }

    pub fn set_state(&self, state: GoalStatus) {
        *self.state.lock() = state;
    }

    /// Applies `event` and returns the resulting status.
    ///
    /// An invalid event is logged and leaves the state unchanged. It is reported as
    /// [`ActionlibError::InvalidTransition`] only when the machine is strict.
    pub fn transition(&self, event: ServerEvent) -> Result<GoalStatus, ActionlibError> {
        let mut state = self.state.lock();
        match next_state(*state, event) {
            Some(next) => {
                trace!(from = %*state, to = %next, %event, "Server transition");
                *state = next;
                Ok(next)
            }
            None => {
                error!(state = %*state, %event, "Invalid server transition");
                if self.strict {
                    Err(ActionlibError::InvalidTransition {
                        state: state.name().to_string(),
                        event: event.name().to_string(),
                    })
                } else {
                    Ok(*state)
                }
            }
        }
    }
}
