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

//! Test support for actionlib.
//!
//! ```rust,ignore
//! use actionlib_test::prelude::*;
//!
//! #[actionlib_test]
//! async fn goal_round_trip() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

#[doc(hidden)]
pub use parking_lot;
#[doc(hidden)]
pub use tokio;
#[doc(hidden)]
pub use tracing;

/// Imports for test modules.
pub mod prelude {
    pub use actionlib_test_macro::actionlib_test;
}
