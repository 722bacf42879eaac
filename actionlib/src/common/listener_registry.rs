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

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Identifies a registered listener so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// The listeners of one kind as seen at one point in time.
pub type ListenerSnapshot<L> = Arc<Vec<(ListenerId, Arc<L>)>>;

/// A copy-on-write set of listeners.
///
/// Dispatch iterates an immutable snapshot, so a listener may add or remove listeners
/// (itself included) from inside its own callback. Changes take effect from the next
/// dispatch; the one in progress still reaches every listener it started with.
pub struct ListenerRegistry<L: ?Sized> {
    listeners: RwLock<ListenerSnapshot<L>>,
    next_id: AtomicU64,
}

impl<L: ?Sized> Default for ListenerRegistry<L> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<L: ?Sized> Debug for ListenerRegistry<L> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` and returns its id.
    pub fn add(&self, listener: Arc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.listeners.write();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push((id, listener));
        *guard = Arc::new(next);
        id
    }

    /// Removes the listener registered under `id`, returning it if it was present.
    pub fn remove(&self, id: ListenerId) -> Option<Arc<L>> {
        let mut guard = self.listeners.write();
        let position = guard.iter().position(|(candidate, _)| *candidate == id)?;
        let mut next: Vec<_> = guard.iter().cloned().collect();
        let (_, removed) = next.remove(position);
        *guard = Arc::new(next);
        Some(removed)
    }

    /// Removes every listener, returning them in registration order.
    pub fn clear(&self) -> Vec<Arc<L>> {
        let previous = std::mem::replace(&mut *self.listeners.write(), Arc::new(Vec::new()));
        previous.iter().map(|(_, listener)| listener.clone()).collect()
    }

    /// The current listeners. Later changes do not affect the returned snapshot.
    pub fn snapshot(&self) -> ListenerSnapshot<L> {
        self.listeners.read().clone()
    }

    /// Calls `f` once for each listener in the current snapshot.
    pub fn for_each(&self, mut f: impl FnMut(&L)) {
        let snapshot = self.snapshot();
        for (_, listener) in snapshot.iter() {
            f(listener);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
