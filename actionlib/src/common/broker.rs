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

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::common::{ActionlibConfig, CONFIG};
use crate::message::ActionlibError;
use crate::traits::{ActionMessage, MessageHandler, TopicHandle, TopicRole, Transport};

/// An in-process [`Transport`] connecting clients and servers that share one runtime.
///
/// The broker keeps a table of topics, each with its advertised publishers and its
/// subscriptions. Every subscription owns a bounded mailbox drained by its own delivery
/// task, so one subscriber's handler never delays another's and each handler sees messages
/// in the order they were published. Publishing places the message in every mailbox of the
/// topic concurrently and returns once all of them have accepted it.
///
/// Cloning a `LocalBroker` yields another handle onto the same topic table.
#[derive(Debug, Clone)]
pub struct LocalBroker {
    inner: Arc<BrokerInner>,
}

#[derive(Debug)]
struct BrokerInner {
    topics: DashMap<String, TopicEntry>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

#[derive(Debug, Default)]
struct TopicEntry {
    publishers: HashSet<u64>,
    subscribers: HashMap<u64, Subscription>,
}

#[derive(Debug)]
struct Subscription {
    mailbox: mpsc::Sender<Arc<dyn ActionMessage>>,
    cancellation_token: CancellationToken,
    delivery: JoinHandle<()>,
}

impl Default for LocalBroker {
    fn default() -> Self {
        Self::with_config(&CONFIG)
    }
}

impl LocalBroker {
    /// Creates a broker using the global configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a broker whose subscriptions use `limits.subscription_queue_capacity`.
    pub fn with_config(config: &ActionlibConfig) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                topics: DashMap::new(),
                next_id: AtomicU64::new(1),
                queue_capacity: config.subscription_queue_capacity(),
            }),
        }
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .get(topic)
            .map_or(0, |entry| entry.subscribers.len())
    }

    /// Number of advertised publishers of `topic`.
    pub fn publisher_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .get(topic)
            .map_or(0, |entry| entry.publishers.len())
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn spawn_delivery(
        runtime: &tokio::runtime::Handle,
        topic: String,
        handler: MessageHandler,
        mut receiver: mpsc::Receiver<Arc<dyn ActionMessage>>,
        cancellation_token: CancellationToken,
    ) -> JoinHandle<()> {
        runtime.spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancellation_token.cancelled() => break,
                    received = receiver.recv() => match received {
                        Some(message) => {
                            trace!(topic = %topic, "Delivering message");
                            handler(message);
                        }
                        None => break,
                    },
                }
            }
            trace!(topic = %topic, "Delivery task stopped");
        })
    }
}

#[async_trait]
impl Transport for LocalBroker {
    #[instrument(skip(self))]
    async fn advertise(&self, topic: &str) -> Result<TopicHandle, ActionlibError> {
        let id = self.next_id();
        self.inner
            .topics
            .entry(topic.to_string())
            .or_default()
            .publishers
            .insert(id);
        debug!(topic, id, "Publisher advertised");
        Ok(TopicHandle::new(topic, TopicRole::Publisher, id))
    }

    #[instrument(skip(self, handler))]
    async fn subscribe(
        &self,
        topic: &str,
        handler: MessageHandler,
    ) -> Result<TopicHandle, ActionlibError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| ActionlibError::RuntimeUnavailable(topic.to_string()))?;
        let id = self.next_id();
        let (mailbox, receiver) = mpsc::channel(self.inner.queue_capacity);
        let cancellation_token = CancellationToken::new();
        let delivery = Self::spawn_delivery(
            &runtime,
            topic.to_string(),
            handler,
            receiver,
            cancellation_token.clone(),
        );
        self.inner
            .topics
            .entry(topic.to_string())
            .or_default()
            .subscribers
            .insert(
                id,
                Subscription {
                    mailbox,
                    cancellation_token,
                    delivery,
                },
            );
        debug!(topic, id, "Subscriber registered");
        Ok(TopicHandle::new(topic, TopicRole::Subscriber, id))
    }

    async fn publish(
        &self,
        topic: &str,
        message: Arc<dyn ActionMessage>,
    ) -> Result<(), ActionlibError> {
        // Clone the mailboxes out so no map guard is held across the sends.
        let mailboxes: Vec<_> = match self.inner.topics.get(topic) {
            Some(entry) => entry
                .subscribers
                .values()
                .map(|subscription| subscription.mailbox.clone())
                .collect(),
            None => Vec::new(),
        };

        if mailboxes.is_empty() {
            trace!(topic, "No subscribers, message dropped");
            return Ok(());
        }

        trace!(topic, count = mailboxes.len(), "Publishing message");
        let sends = mailboxes.iter().map(|mailbox| {
            let message = message.clone();
            async move {
                if mailbox.send(message).await.is_err() {
                    trace!(topic, "Subscriber mailbox closed during publish");
                }
            }
        });
        join_all(sends).await;
        Ok(())
    }

    fn has_subscribers(&self, topic: &str) -> bool {
        self.subscriber_count(topic) > 0
    }

    fn has_publishers(&self, topic: &str) -> bool {
        self.publisher_count(topic) > 0
    }

    #[instrument(skip(self, handle), fields(handle = %handle))]
    async fn shutdown(&self, handle: &TopicHandle, grace: Duration) -> Result<(), ActionlibError> {
        let subscription = {
            let Some(mut entry) = self.inner.topics.get_mut(handle.topic()) else {
                trace!("Topic already gone");
                return Ok(());
            };
            match handle.role() {
                TopicRole::Publisher => {
                    entry.publishers.remove(&handle.id());
                    None
                }
                TopicRole::Subscriber => entry.subscribers.remove(&handle.id()),
            }
        };

        if let Some(subscription) = subscription {
            subscription.cancellation_token.cancel();
            let abort = subscription.delivery.abort_handle();
            if tokio::time::timeout(grace, subscription.delivery).await.is_err() {
                warn!(?grace, "Delivery task did not stop within the grace period, aborting");
                abort.abort();
            }
        }
        debug!("Registration released");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::traits::downcast_message;

    #[tokio::test]
    async fn delivers_in_publish_order() -> anyhow::Result<()> {
        let broker = LocalBroker::with_config(&ActionlibConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = broker
            .subscribe(
                "counter",
                Arc::new(move |message: Arc<dyn ActionMessage>| {
                    if let Some(value) = downcast_message::<u32>(&message) {
                        sink.lock().push(value);
                    }
                }),
            )
            .await?;

        for value in 0..50_u32 {
            broker.publish("counter", Arc::new(value)).await?;
        }

        for _ in 0..100 {
            if seen.lock().len() == 50 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*seen.lock(), (0..50).collect::<Vec<_>>());

        broker.shutdown(&handle, Duration::from_millis(100)).await?;
        assert!(!broker.has_subscribers("counter"));
        Ok(())
    }

    #[tokio::test]
    async fn tracks_publishers_and_subscribers_per_topic() -> anyhow::Result<()> {
        let broker = LocalBroker::with_config(&ActionlibConfig::default());
        assert!(!broker.has_publishers("a/status"));

        let publisher = broker.advertise("a/status").await?;
        assert!(broker.has_publishers("a/status"));
        assert!(!broker.has_publishers("b/status"));

        broker.shutdown(&publisher, Duration::ZERO).await?;
        assert!(!broker.has_publishers("a/status"));

        // Releasing twice is harmless.
        broker.shutdown(&publisher, Duration::ZERO).await?;
        Ok(())
    }

    #[tokio::test]
    async fn publishing_without_subscribers_succeeds() -> anyhow::Result<()> {
        let broker = LocalBroker::with_config(&ActionlibConfig::default());
        broker.publish("nobody/listens", Arc::new(1_u8)).await?;
        Ok(())
    }
}
