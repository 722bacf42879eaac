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

use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by the action client, future and server.
///
/// Protocol anomalies that the state machines absorb (invalid client transitions, results
/// arriving out of turn) are logged and reflected in state rather than returned here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionlibError {
    /// A bounded wait elapsed before the awaited condition held.
    #[error("timed out after {waited:?}")]
    Timeout {
        /// How long the caller waited.
        waited: Duration,
    },
    /// The server has no registry entry for this goal id.
    #[error("goal `{0}` is not tracked")]
    GoalNotTracked(String),
    /// A server goal received an event its current status does not accept.
    ///
    /// Only returned when strict server transitions are enabled in the configuration.
    #[error("invalid transition: event {event} in state {state}")]
    InvalidTransition {
        /// Status name at the time of the event.
        state: String,
        /// Event name.
        event: String,
    },
    /// A goal finished without a result being recorded.
    #[error("goal `{goal_id}` finished in state {state} without a result")]
    MissingResult {
        /// The goal waited on.
        goal_id: String,
        /// Client state the goal ended in.
        state: String,
    },
    /// A delivered message was not of the type registered for its topic.
    #[error("unexpected message on `{topic}`, expected {expected}")]
    UnexpectedMessage {
        /// Topic the message arrived on.
        topic: String,
        /// Type name the handler expected.
        expected: &'static str,
    },
    /// The client or server has already been shut down.
    #[error("not connected")]
    NotConnected,
    /// A blocking wait was requested from inside a tokio runtime.
    #[error("blocking wait called from within a tokio runtime, use `get().await`")]
    BlockingInRuntime,
    /// A subscription was requested outside of a tokio runtime.
    #[error("no tokio runtime available to drive topic `{0}`")]
    RuntimeUnavailable(String),
}
