//! Shared infrastructure for action clients and servers.
//!
//! *   [`LocalBroker`]: in-process implementation of [`Transport`](crate::traits::Transport).
//! *   [`ActionTopics`]: topic naming for one action.
//! *   [`GoalIdGenerator`]: unique goal ids.
//! *   [`ListenerRegistry`]: copy-on-write listener sets.
//! *   [`ActionlibConfig`]: configuration loaded from XDG locations, with [`init_tracing`].

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
pub use broker::LocalBroker;
pub use config::{ActionlibConfig, CONFIG};
pub use goal_id_generator::GoalIdGenerator;
pub use listener_registry::{ListenerId, ListenerRegistry, ListenerSnapshot};
pub use logging::init_tracing;
pub use topics::ActionTopics;
pub use types::*;

// --- Submodules ---

/// Defines common type aliases.
mod types;

/// Defines the in-process `LocalBroker` transport.
mod broker;
/// Defines the configuration system.
pub mod config;
/// Defines the goal id generator.
mod goal_id_generator;
/// Defines the copy-on-write listener registry.
mod listener_registry;
/// Defines tracing initialisation for applications.
mod logging;
/// Defines topic naming.
mod topics;
