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

use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

use derive_new::new;
use serde::{Deserialize, Serialize};

/// Identity of one goal instance.
///
/// `id` is the logical identity: two goals carrying the same `id` are the same goal as
/// far as the protocol is concerned. `stamp` records when the id was issued and is only
/// used to break ties between status entries that report the same `id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct GoalId {
    /// Unique identifier, `<owner>-<counter>` when generated.
    pub id: String,
    /// Time at which the identifier was issued.
    pub stamp: SystemTime,
}

impl GoalId {
    /// Creates a goal id with the given identifier and the Unix epoch as its stamp.
    #[must_use]
    pub fn from_id(id: impl Into<String>) -> Self {
        Self::new(id.into(), UNIX_EPOCH)
    }

    /// `true` when the identifier is empty or whitespace, i.e. one should be generated.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.id.trim().is_empty()
    }

    /// Whether `other` names the same logical goal.
    #[inline]
    #[must_use]
    pub fn same_goal(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Default for GoalId {
    fn default() -> Self {
        Self::from_id(String::new())
    }
}

impl Display for GoalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_ids_need_generating() {
        assert!(GoalId::default().is_blank());
        assert!(GoalId::from_id("  \t").is_blank());
        assert!(!GoalId::from_id("node-1").is_blank());
    }

    #[test]
    fn same_goal_ignores_the_stamp() {
        let early = GoalId::from_id("node-1");
        let late = GoalId::new("node-1".to_string(), UNIX_EPOCH + std::time::Duration::from_secs(5));
        assert!(early.same_goal(&late));
        assert!(!early.same_goal(&GoalId::from_id("node-2")));
        assert_eq!(late.to_string(), "node-1");
    }
}
