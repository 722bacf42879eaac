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

//! Type aliases shared by the client and server.

use std::sync::Arc;

use crate::common::ListenerRegistry;
use crate::traits::{
    ActionServerListener, FeedbackListener, ResultListener, StatusListener, Transport,
};

/// A transport shared between the clients, servers and generators of one process.
pub type SharedTransport = Arc<dyn Transport>;

/// Registered status listeners of an action client.
pub type StatusListeners = ListenerRegistry<dyn StatusListener>;
/// Registered feedback listeners of an action client.
pub type FeedbackListeners<F> = ListenerRegistry<dyn FeedbackListener<F>>;
/// Registered result listeners of an action client.
pub type ResultListeners<R> = ListenerRegistry<dyn ResultListener<R>>;
/// Registered application hooks of an action server.
pub type ServerListeners<G> = ListenerRegistry<dyn ActionServerListener<G>>;
