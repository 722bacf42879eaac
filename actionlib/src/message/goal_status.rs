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

//! The server's status vocabulary and the status messages built from it.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::message::{GoalId, Header};
use crate::traits::{HasGoalId, HasHeader};

/// Name rendered for a status byte outside the ten known codes.
pub const UNKNOWN_GOAL_STATUS: &str = "UNKNOWN GOAL STATUS";

/// Authoritative lifecycle code of a goal as tracked by the server.
///
/// The discriminants are the status bytes carried on the `status`, `feedback` and
/// `result` topics and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GoalStatus {
    /// Received by the server, not yet processed.
    Pending = 0,
    /// Accepted and being executed.
    Active = 1,
    /// Cancelled after it started executing.
    Preempted = 2,
    /// Completed successfully.
    Succeeded = 3,
    /// Terminated by the server during execution.
    Aborted = 4,
    /// Refused without being executed.
    Rejected = 5,
    /// Cancel requested while executing, not yet acknowledged.
    Preempting = 6,
    /// Cancel requested before execution started, not yet acknowledged.
    Recalling = 7,
    /// Cancelled before execution started.
    Recalled = 8,
    /// The client stopped hearing about the goal.
    Lost = 9,
}

impl GoalStatus {
    /// Every status, in code order.
    pub const ALL: [Self; 10] = [
        Self::Pending,
        Self::Active,
        Self::Preempted,
        Self::Succeeded,
        Self::Aborted,
        Self::Rejected,
        Self::Preempting,
        Self::Recalling,
        Self::Recalled,
        Self::Lost,
    ];

    /// The wire byte for this status.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Parses a wire byte. Unknown bytes yield `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Active),
            2 => Some(Self::Preempted),
            3 => Some(Self::Succeeded),
            4 => Some(Self::Aborted),
            5 => Some(Self::Rejected),
            6 => Some(Self::Preempting),
            7 => Some(Self::Recalling),
            8 => Some(Self::Recalled),
            9 => Some(Self::Lost),
            _ => None,
        }
    }

    /// Upper-case protocol name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Preempted => "PREEMPTED",
            Self::Succeeded => "SUCCEEDED",
            Self::Aborted => "ABORTED",
            Self::Rejected => "REJECTED",
            Self::Preempting => "PREEMPTING",
            Self::Recalling => "RECALLING",
            Self::Recalled => "RECALLED",
            Self::Lost => "LOST",
        }
    }

    /// Protocol name of a raw status byte, or [`UNKNOWN_GOAL_STATUS`].
    #[must_use]
    pub const fn name_of(code: u8) -> &'static str {
        match Self::from_code(code) {
            Some(status) => status.name(),
            None => UNKNOWN_GOAL_STATUS,
        }
    }

    /// Whether no further server event can move a goal out of this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Preempted
                | Self::Succeeded
                | Self::Aborted
                | Self::Rejected
                | Self::Recalled
                | Self::Lost
        )
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

/// Status of one goal as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalStatusMessage {
    /// The goal this entry describes.
    pub goal_id: GoalId,
    /// Raw status byte, see [`GoalStatus`].
    pub status: u8,
    /// Optional human-readable detail.
    pub text: String,
}

impl GoalStatusMessage {
    /// An entry for `goal_id` in `status`, with no text.
    #[must_use]
    pub fn new(goal_id: GoalId, status: GoalStatus) -> Self {
        Self {
            goal_id,
            status: status.code(),
            text: String::new(),
        }
    }

    /// Attaches detail text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// The typed status, or `None` when the byte is not a known code.
    #[inline]
    #[must_use]
    pub const fn goal_status(&self) -> Option<GoalStatus> {
        GoalStatus::from_code(self.status)
    }
}

impl Display for GoalStatusMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{GoalId:{},Text:{},Status:{}({})}}",
            self.goal_id,
            self.text,
            GoalStatus::name_of(self.status),
            self.status
        )
    }
}

impl HasGoalId for GoalStatusMessage {
    fn goal_id(&self) -> &GoalId {
        &self.goal_id
    }
}

/// Snapshot of every goal a server tracks, published on the `status` topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoalStatusArray {
    /// Sequence number and time of the snapshot.
    pub header: Header,
    /// One entry per tracked goal.
    pub status_list: Vec<GoalStatusMessage>,
}

impl GoalStatusArray {
    /// Finds the entry for `goal_id`.
    ///
    /// If the array holds several entries for the same id, the one whose goal id carries
    /// the most recent stamp wins; on equal stamps the later entry wins.
    #[must_use]
    pub fn find(&self, goal_id: &GoalId) -> Option<&GoalStatusMessage> {
        self.status_list
            .iter()
            .filter(|entry| entry.goal_id.same_goal(goal_id))
            .fold(None, |best: Option<&GoalStatusMessage>, entry| match best {
                Some(current) if current.goal_id.stamp > entry.goal_id.stamp => Some(current),
                _ => Some(entry),
            })
    }
}

impl HasHeader for GoalStatusArray {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}
