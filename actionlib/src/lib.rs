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

#![forbid(unsafe_code)]

//! A goal protocol engine for long-running, preemptible operations carried over
//! publish/subscribe topics.
//!
//! A client submits a *goal*, receives periodic status and feedback about it, may cancel it
//! at any time and eventually receives a terminal *result*. A server accepts or rejects
//! submitted goals, executes them and reports progress. Both ends keep a per-goal state
//! machine; the client's infers whole chains of transitions from the server's periodic
//! status reports so that lost updates do not desynchronise it.
//!
//! ```rust,ignore
//! use actionlib::prelude::*;
//!
//! let transport: SharedTransport = Arc::new(LocalBroker::new());
//! let server = ActionServer::<Goal, Feedback, Outcome>::connect(transport.clone(), "fibonacci").await?;
//! let client = ActionClient::<Goal, Feedback, Outcome>::connect(transport, "fibonacci").await?;
//!
//! client.wait_for_action_server_to_start(Duration::from_secs(1)).await;
//! let future = client.send_goal(Goal { order: 10 }, None).await?;
//! let result = future.get_timeout(Duration::from_secs(5)).await?;
//! ```

/// Shared infrastructure: transport implementation, configuration, id generation.
pub(crate) mod common;

/// Client side: state machine, goal manager, action client and future.
pub(crate) mod client;

/// Message types and errors.
pub(crate) mod message;

/// Server side: state machine and action server.
pub(crate) mod server;

/// Core traits: message marker, transport seam, listeners, accessors.
pub(crate) mod traits;

/// Re-exports of everything an application needs.
///
/// ## Macros
/// *   [`actionlib_macro::action_payload`]: declares a goal, feedback or result payload.
/// *   [`async_trait::async_trait`]: for implementing [`Transport`](crate::traits::Transport).
///
/// ## Client
/// *   [`ActionClient`](crate::client::ActionClient), [`ActionFuture`](crate::client::ActionFuture)
/// *   [`ClientState`](crate::client::ClientState), [`ClientStateMachine`](crate::client::ClientStateMachine),
///     [`ClientGoalManager`](crate::client::ClientGoalManager)
///
/// ## Server
/// *   [`ActionServer`](crate::server::ActionServer), [`ServerStateMachine`](crate::server::ServerStateMachine),
///     [`ServerEvent`](crate::server::ServerEvent)
///
/// ## Messages and infrastructure
/// *   [`GoalId`](crate::message::GoalId), [`GoalStatus`](crate::message::GoalStatus) and the message envelopes
/// *   [`LocalBroker`](crate::common::LocalBroker), [`ActionlibConfig`](crate::common::ActionlibConfig)
pub mod prelude {
    pub use actionlib_macro::action_payload;
    pub use async_trait::async_trait;

    pub use crate::client::{
        transition_chain, ActionClient, ActionFuture, ClientGoalManager, ClientState,
        ClientStateMachine, ListenerIds,
    };
    pub use crate::common::{
        init_tracing, ActionTopics, ActionlibConfig, GoalIdGenerator, ListenerId,
        ListenerRegistry, LocalBroker, SharedTransport, CONFIG,
    };
    pub use crate::message::{
        ActionFeedback, ActionGoal, ActionResult, ActionlibError, GoalId, GoalStatus,
        GoalStatusArray, GoalStatusMessage, Header, UNKNOWN_GOAL_STATUS,
    };
    pub use crate::server::{next_state, ActionServer, ServerEvent, ServerGoal, ServerStateMachine};
    pub use crate::traits::{
        downcast_message, expect_message, ActionMessage, ActionPayload, ActionServerListener,
        FeedbackListener, HasGoalId, HasGoalStatus, HasHeader, MessageHandler, ResultListener,
        StatusListener, TopicHandle, TopicRole, Transport,
    };
}
