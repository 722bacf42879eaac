//! Core traits of the action protocol.
//!
//! *   [`ActionMessage`]: marker trait for values carried over a topic.
//! *   [`Transport`]: the publish/subscribe seam.
//! *   [`HasHeader`], [`HasGoalId`], [`HasGoalStatus`]: typed accessors over message kinds.
//! *   [`StatusListener`], [`FeedbackListener`], [`ResultListener`]: client-side callbacks.
//! *   [`ActionServerListener`]: server-side application hooks.

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
pub use accessors::{HasGoalId, HasGoalStatus, HasHeader};
pub use action_message::{downcast_message, expect_message, ActionMessage, ActionPayload};
pub use listeners::{ActionServerListener, FeedbackListener, ResultListener, StatusListener};
pub use transport::{MessageHandler, TopicHandle, TopicRole, Transport};

// --- Submodules ---

mod accessors;
/// Defines the [`ActionMessage`] marker trait.
mod action_message;
/// Defines the client and server listener traits.
mod listeners;
/// Defines the [`Transport`] trait.
mod transport;
