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

use serde::{Deserialize, Serialize};

/// The client's locally inferred view of a goal's lifecycle.
///
/// This is a different vocabulary from [`GoalStatus`](crate::message::GoalStatus): the
/// server reports statuses, the client folds them into these states. The first three
/// variants are sentinels rather than lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i32)]
pub enum ClientState {
    /// Protocol desynchronisation, or no goal bound yet.
    Error = -3,
    /// Marker for a status the current state cannot accept.
    InvalidTransition = -2,
    /// Marker for a status that leaves the state unchanged.
    NoTransition = -1,
    WaitingForGoalAck = 0,
    Pending = 1,
    Active = 2,
    WaitingForResult = 3,
    WaitingForCancelAck = 4,
    Recalling = 5,
    Preempting = 6,
    Done = 7,
    Lost = 8,
    Unknown = 99,
}

impl ClientState {
    /// Every state, in value order.
    pub const ALL: [Self; 13] = [
        Self::Error,
        Self::InvalidTransition,
        Self::NoTransition,
        Self::WaitingForGoalAck,
        Self::Pending,
        Self::Active,
        Self::WaitingForResult,
        Self::WaitingForCancelAck,
        Self::Recalling,
        Self::Preempting,
        Self::Done,
        Self::Lost,
        Self::Unknown,
    ];

    #[inline]
    pub const fn value(self) -> i32 {
        self as i32
    }

    /// Maps a numeric value back to a state; unrecognised values give [`ClientState::Unknown`].
    pub const fn from_value(value: i32) -> Self {
        match value {
            -3 => Self::Error,
            -2 => Self::InvalidTransition,
            -1 => Self::NoTransition,
            0 => Self::WaitingForGoalAck,
            1 => Self::Pending,
            2 => Self::Active,
            3 => Self::WaitingForResult,
            4 => Self::WaitingForCancelAck,
            5 => Self::Recalling,
            6 => Self::Preempting,
            7 => Self::Done,
            8 => Self::Lost,
            _ => Self::Unknown,
        }
    }

    /// True from `WaitingForGoalAck` up to, but excluding, `Done`.
    #[inline]
    pub const fn is_running(self) -> bool {
        let value = self.value();
        value >= Self::WaitingForGoalAck.value() && value < Self::Done.value()
    }

    pub fn is_among(self, states: &[Self]) -> bool {
        states.contains(&self)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::NoTransition => "NO_TRANSITION",
            Self::WaitingForGoalAck => "WAITING_FOR_GOAL_ACK",
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::WaitingForResult => "WAITING_FOR_RESULT",
            Self::WaitingForCancelAck => "WAITING_FOR_CANCEL_ACK",
            Self::Recalling => "RECALLING",
            Self::Preempting => "PREEMPTING",
            Self::Done => "DONE",
            Self::Lost => "LOST",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Display for ClientState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
