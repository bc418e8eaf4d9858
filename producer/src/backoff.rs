/* Licensed to the Apache Software Foundation (ASF) under one
 * or more contributor license agreements.  See the NOTICE file
 * distributed with this work for additional information
 * regarding copyright ownership.  The ASF licenses this file
 * to you under the Apache License, Version 2.0 (the
 * "License"); you may not use this file except in compliance
 * with the License.  You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing,
 * software distributed under the License is distributed on an
 * "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
 * KIND, either express or implied.  See the License for the
 * specific language governing permissions and limitations
 * under the License.
 */

use std::fmt::Debug;
use std::time::Duration;

/// Wait strategy between retries of a failed flush.
pub trait Backoff: Send + Debug + 'static {
    /// Duration to wait after the current failure; escalates on every call.
    fn duration(&mut self) -> Duration;
    /// Back to the baseline after a fully successful flush.
    fn reset(&mut self);
}

/// Doubles (or multiplies by `factor`) the wait on every consecutive
/// failure, capped at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    factor: u32,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            factor: 2,
            attempt: 0,
        }
    }

    pub fn with_factor(self, factor: u32) -> Self {
        Self {
            factor: factor.max(1),
            ..self
        }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

impl Backoff for ExponentialBackoff {
    fn duration(&mut self) -> Duration {
        let wait = self
            .base
            .saturating_mul(self.factor.saturating_pow(self.attempt));
        self.attempt = self.attempt.saturating_add(1);
        wait.min(self.max)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Same wait after every failure.
#[derive(Debug, Clone)]
pub struct ConstantBackoff(pub Duration);

impl Backoff for ConstantBackoff {
    fn duration(&mut self) -> Duration {
        self.0
    }

    fn reset(&mut self) {}
}
