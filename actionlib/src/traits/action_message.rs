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
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use dyn_clone::DynClone;

use crate::message::ActionlibError;

/// A marker trait for anything that can travel over a [`Transport`](crate::traits::Transport) topic.
///
/// Combines `Any + Send + Sync + Debug` with [`DynClone`] so that a message can be
/// shared between delivery tasks, cloned behind a trait object and downcast back to its
/// concrete type by the receiving handler.
///
/// A blanket implementation covers every qualifying type; message structs only need to
/// derive `Clone` and `Debug`.
pub trait ActionMessage: DynClone + Any + Send + Sync + Debug {
    /// Returns the message as a dynamic [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns the message as a mutable dynamic [`Any`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

dyn_clone::clone_trait_object!(ActionMessage);

impl<T> ActionMessage for T
where
    T: Any + Send + Sync + Debug + DynClone + 'static,
{
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Bounds required of application goal, feedback and result payloads.
///
/// Implemented automatically; `#[action_payload]` derives what is missing and asserts the
/// thread-safety bounds at compile time.
pub trait ActionPayload: Clone + Debug + Send + Sync + 'static {}

impl<T> ActionPayload for T where T: Clone + Debug + Send + Sync + 'static {}

/// Clones the concrete message out of a delivered trait object.
///
/// Returns `None` when the message is of another type.
pub fn downcast_message<M>(message: &Arc<dyn ActionMessage>) -> Option<M>
where
    M: ActionMessage + Clone,
{
    (**message).as_any().downcast_ref::<M>().cloned()
}

/// Like [`downcast_message`], but reports the topic and expected type on a mismatch.
pub fn expect_message<M>(message: &Arc<dyn ActionMessage>, topic: &str) -> Result<M, ActionlibError>
where
    M: ActionMessage + Clone,
{
    downcast_message(message).ok_or_else(|| ActionlibError::UnexpectedMessage {
        topic: topic.to_string(),
        expected: std::any::type_name::<M>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    #[derive(Debug, Clone)]
    struct Pong;

    #[test]
    fn downcasts_through_the_trait_object() {
        let message: Arc<dyn ActionMessage> = Arc::new(Ping(7));
        assert_eq!(downcast_message::<Ping>(&message), Some(Ping(7)));
        assert!(downcast_message::<Pong>(&message).is_none());
    }

    #[test]
    fn mismatches_name_the_topic() {
        let message: Arc<dyn ActionMessage> = Arc::new(Pong);
        match expect_message::<Ping>(&message, "ping/result") {
            Err(ActionlibError::UnexpectedMessage { topic, expected }) => {
                assert_eq!(topic, "ping/result");
                assert!(expected.ends_with("Ping"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
