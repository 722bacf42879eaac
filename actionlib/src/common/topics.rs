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

/// Names of the five topics that make up one action.
///
/// For an action named `A` the client publishes `A/goal` and `A/cancel`; the server
/// publishes `A/status`, `A/feedback` and `A/result`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActionTopics {
    pub action_name: String,
    pub goal: String,
    pub cancel: String,
    pub status: String,
    pub feedback: String,
    pub result: String,
}

impl ActionTopics {
    pub fn new(action_name: impl Into<String>) -> Self {
        let action_name = action_name.into();
        let topic = |suffix: &str| format!("{action_name}/{suffix}");
        Self {
            goal: topic("goal"),
            cancel: topic("cancel"),
            status: topic("status"),
            feedback: topic("feedback"),
            result: topic("result"),
            action_name,
        }
    }

    /// Topics the server publishes and the client subscribes to.
    pub fn published_by_server(&self) -> [&str; 3] {
        [&self.status, &self.feedback, &self.result]
    }

    /// Topics the client publishes and the server subscribes to.
    pub fn subscribed_by_server(&self) -> [&str; 2] {
        [&self.goal, &self.cancel]
    }
}
