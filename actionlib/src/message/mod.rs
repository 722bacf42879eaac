//! Message types exchanged on an action's topics.
//!
//! *   [`GoalId`] and [`Header`]: identity and sequencing carried by every message.
//! *   [`GoalStatus`]: the ten-code status vocabulary shared by client and server, with
//!     [`GoalStatusMessage`] and [`GoalStatusArray`] as published on the `status` topic.
//! *   [`ActionGoal`], [`ActionFeedback`], [`ActionResult`]: envelopes around the
//!     application payloads.
//! *   [`ActionlibError`]: failures returned by the public API.

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

// --- Public Re-exports ---
pub use action_error::ActionlibError;
pub use action_messages::{ActionFeedback, ActionGoal, ActionResult};
pub use goal_id::GoalId;
pub use goal_status::{GoalStatus, GoalStatusArray, GoalStatusMessage, UNKNOWN_GOAL_STATUS};
pub use header::Header;

// --- Submodules ---

/// Defines [`ActionlibError`].
mod action_error;
/// Defines the goal, feedback and result envelopes.
mod action_messages;
/// Defines [`GoalId`].
mod goal_id;
/// Defines [`GoalStatus`] and the status messages.
mod goal_status;
/// Defines [`Header`].
mod header;
