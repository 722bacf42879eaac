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

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Standard message header: a sequence number, a timestamp and a frame tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Publisher-assigned sequence number.
    pub seq: u32,
    /// Time the message was stamped.
    pub stamp: SystemTime,
    /// Free-form frame tag, unused by the protocol itself.
    pub frame_id: String,
}

impl Header {
    /// A header with the given sequence number and stamp and an empty frame tag.
    #[must_use]
    pub const fn stamped(seq: u32, stamp: SystemTime) -> Self {
        Self {
            seq,
            stamp,
            frame_id: String::new(),
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::stamped(0, UNIX_EPOCH)
    }
}
