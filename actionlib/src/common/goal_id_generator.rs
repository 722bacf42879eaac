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

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::message::GoalId;
use crate::traits::Transport;

const SEPARATOR: char = '-';

lazy_static! {
    static ref PROCESS_COUNTER: Arc<AtomicU64> = Arc::new(AtomicU64::new(0));
}

/// Issues goal ids of the form `<owner>-<counter>`, stamped with transport time.
///
/// Generators built with [`new`](Self::new) draw from one process-wide counter, so ids
/// never repeat within the process even when several clients share an owner name.
/// [`with_counter`](Self::with_counter) injects a private counter instead.
#[derive(Debug, Clone)]
pub struct GoalIdGenerator {
    prefix: String,
    counter: Arc<AtomicU64>,
    transport: Arc<dyn Transport>,
}

impl GoalIdGenerator {
    /// Creates a generator drawing from the process-wide counter.
    pub fn new(owner: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self::with_counter(owner, PROCESS_COUNTER.clone(), transport)
    }

    /// Creates a generator drawing from an existing counter.
    pub fn with_counter(
        owner: impl Into<String>,
        counter: Arc<AtomicU64>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let mut prefix = owner.into();
        prefix.push(SEPARATOR);
        Self {
            prefix,
            counter,
            transport,
        }
    }

    /// Writes a new unique id and the current transport time into `goal_id`.
    ///
    /// Returns the id that was written.
    pub fn generate(&self, goal_id: &mut GoalId) -> String {
        let count = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{}{count}", self.prefix);
        goal_id.id.clone_from(&id);
        goal_id.stamp = self.transport.now();
        id
    }

    /// Convenience form of [`generate`](Self::generate) returning a fresh [`GoalId`].
    pub fn next_id(&self) -> GoalId {
        let mut goal_id = GoalId::default();
        self.generate(&mut goal_id);
        goal_id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::thread;

    use super::*;
    use crate::common::{ActionlibConfig, LocalBroker};

    fn transport() -> Arc<dyn Transport> {
        Arc::new(LocalBroker::with_config(&ActionlibConfig::default()))
    }

    fn generator(owner: &str) -> GoalIdGenerator {
        GoalIdGenerator::new(owner, transport())
    }

    #[test]
    fn ten_thousand_sequential_ids_are_unique() {
        let generator = generator("client");
        let ids: HashSet<String> = (0..10_000).map(|_| generator.next_id().id).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn writes_id_and_stamp_into_the_container() {
        let generator =
            GoalIdGenerator::with_counter("fibonacci_client", Arc::default(), transport());
        let mut goal_id = GoalId::default();
        let id = generator.generate(&mut goal_id);
        assert_eq!(id, "fibonacci_client-1");
        assert_eq!(goal_id.id, id);
        assert!(goal_id.stamp > std::time::UNIX_EPOCH);
        assert_eq!(generator.next_id().id, "fibonacci_client-2");
    }

    #[test]
    fn concurrent_generation_never_repeats() {
        let generator = generator("node");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = generator.clone();
                thread::spawn(move || (0..500).map(|_| generator.next_id().id).collect::<Vec<_>>())
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("generator thread panicked") {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 4_000);
    }

    #[test]
    fn shared_counter_spans_generators() {
        let counter = Arc::new(AtomicU64::new(0));
        let first = GoalIdGenerator::with_counter("node", counter.clone(), transport());
        let second = GoalIdGenerator::with_counter("node", counter, transport());
        assert_ne!(first.next_id().id, second.next_id().id);
    }

    #[test]
    fn generators_with_one_owner_never_collide() {
        let first = generator("shared_owner");
        let second = generator("shared_owner");
        let ids: HashSet<String> = (0..100)
            .flat_map(|_| [first.next_id().id, second.next_id().id])
            .collect();
        assert_eq!(ids.len(), 200);
        assert!(ids.iter().all(|id| id.starts_with("shared_owner-")));
    }
}
