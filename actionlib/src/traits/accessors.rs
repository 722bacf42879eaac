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
//! Typed field access shared by the message kinds.

use crate::message::{GoalId, GoalStatusMessage, Header};

/// A message carrying a [`Header`].
pub trait HasHeader {
    fn header(&self) -> &Header;

    fn header_mut(&mut self) -> &mut Header;
}

/// A message that names the goal it concerns.
pub trait HasGoalId {
    fn goal_id(&self) -> &GoalId;
}

/// A message that reports the server's status for one goal.
pub trait HasGoalStatus: HasGoalId {
    fn status(&self) -> &GoalStatusMessage;
}
