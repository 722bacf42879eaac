//! Client side of the action protocol.
//!
//! *   [`ClientState`] and [`ClientStateMachine`]: the client's inferred view of a goal and
//!     the table that folds server status reports into it.
//! *   [`ClientGoalManager`]: binds one goal to one state machine.
//! *   [`ActionClient`]: topic wiring, goal submission, cancellation and listener fan-out.
//! *   [`ActionFuture`]: awaitable handle over one submitted goal.

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
pub use action_client::{ActionClient, ListenerIds};
pub use action_future::ActionFuture;
pub use client_goal_manager::ClientGoalManager;
pub use client_state::ClientState;
pub use client_state_machine::{transition_chain, ClientStateMachine};

// --- Submodules ---

/// Defines [`ActionClient`].
mod action_client;
/// Defines [`ActionFuture`].
mod action_future;
/// Defines [`ClientGoalManager`].
mod client_goal_manager;
/// Defines [`ClientState`].
mod client_state;
/// Defines [`ClientStateMachine`] and its transition table.
mod client_state_machine;
