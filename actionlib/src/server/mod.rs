//! Server side of the action protocol.
//!
//! *   [`ServerStateMachine`] and [`ServerEvent`]: per-goal lifecycle driven by the
//!     application.
//! *   [`ActionServer`]: goal registry, accept/reject protocol and status heartbeat.

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
pub use action_server::{ActionServer, ServerGoal};
pub use server_state_machine::{next_state, ServerEvent, ServerStateMachine};

// --- Submodules ---

/// Defines [`ActionServer`].
mod action_server;
/// Defines [`ServerStateMachine`] and its transition table.
mod server_state_machine;
