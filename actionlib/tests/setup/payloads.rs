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
#![allow(unused)]

use actionlib::prelude::*;

#[action_payload(default)]
#[derive(PartialEq, Eq)]
pub struct FibonacciGoal {
    pub order: u32,
}

#[action_payload(default)]
#[derive(PartialEq, Eq)]
pub struct FibonacciFeedback {
    pub sequence: Vec<u64>,
}

#[action_payload(wire, default)]
#[derive(PartialEq, Eq)]
pub struct FibonacciResult {
    pub sequence: Vec<u64>,
}

/// The first `order + 1` Fibonacci numbers.
pub fn fibonacci(order: u32) -> Vec<u64> {
    let mut sequence = vec![0, 1];
    while sequence.len() <= order as usize {
        let next = sequence[sequence.len() - 1] + sequence[sequence.len() - 2];
        sequence.push(next);
    }
    sequence.truncate(order as usize + 1);
    sequence
}
