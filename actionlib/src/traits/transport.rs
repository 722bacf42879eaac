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

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;

use crate::message::ActionlibError;
use crate::traits::ActionMessage;

/// Callback invoked for every message delivered on a subscribed topic.
pub type MessageHandler = Arc<dyn Fn(Arc<dyn ActionMessage>) + Send + Sync>;

/// Which side of a topic a [`TopicHandle`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicRole {
    Publisher,
    Subscriber,
}

/// Registration of one publisher or subscriber on a topic.
///
/// Returned by [`Transport::advertise`] and [`Transport::subscribe`]; passed back to
/// [`Transport::shutdown`] to release it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicHandle {
    topic: String,
    role: TopicRole,
    id: u64,
}

impl TopicHandle {
    pub fn new(topic: impl Into<String>, role: TopicRole, id: u64) -> Self {
        Self {
            topic: topic.into(),
            role,
            id,
        }
    }

    #[inline]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[inline]
    pub const fn role(&self) -> TopicRole {
        self.role
    }

    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Display for TopicHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}({:?})", self.topic, self.id, self.role)
    }
}

/// The publish/subscribe substrate action clients and servers run on.
///
/// Implementations own topic discovery, framing and delivery. The protocol layer only
/// publishes typed messages, subscribes handlers, checks whether a topic has a peer on
/// the other side, and releases its registrations with a bounded wait.
///
/// Handlers registered through [`subscribe`](Transport::subscribe) must be invoked in
/// publish order for any single subscription.
#[async_trait]
pub trait Transport: Send + Sync + Debug + 'static {
    /// Registers the caller as a publisher of `topic`.
    async fn advertise(&self, topic: &str) -> Result<TopicHandle, ActionlibError>;

    /// Registers `handler` to receive every message published on `topic`.
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
    ) -> Result<TopicHandle, ActionlibError>;

    /// Publishes `message` to all current subscribers of `topic`.
    ///
    /// Publishing to a topic without subscribers succeeds and drops the message.
    async fn publish(
        &self,
        topic: &str,
        message: Arc<dyn ActionMessage>,
    ) -> Result<(), ActionlibError>;

    /// Whether at least one subscriber currently listens on `topic`.
    fn has_subscribers(&self, topic: &str) -> bool;

    /// Whether at least one publisher has advertised `topic`.
    fn has_publishers(&self, topic: &str) -> bool;

    /// Releases a registration, waiting at most `grace` for in-flight deliveries.
    async fn shutdown(&self, handle: &TopicHandle, grace: Duration) -> Result<(), ActionlibError>;

    /// Current transport time, used to stamp goal ids and headers.
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
