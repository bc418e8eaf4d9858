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

use async_trait::async_trait;
use batch_producer::{PutRecordsClient, PutRecordsOutput, Record, RecordOutcome, SubmitError};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Stand-in for a remote stream that randomly fails whole requests or
/// throttles individual records.
#[derive(Debug)]
pub struct SimulatedStream {
    reject_rate: f64,
    transport_error_rate: f64,
    latency: Duration,
    pub requests: AtomicU64,
    pub accepted_records: AtomicU64,
    pub accepted_bytes: AtomicU64,
    pub rejected_records: AtomicU64,
    pub transport_errors: AtomicU64,
}

impl SimulatedStream {
    pub fn new(reject_rate: f64, transport_error_rate: f64, latency: Duration) -> Self {
        Self {
            reject_rate: reject_rate.clamp(0.0, 1.0),
            transport_error_rate: transport_error_rate.clamp(0.0, 1.0),
            latency,
            requests: AtomicU64::new(0),
            accepted_records: AtomicU64::new(0),
            accepted_bytes: AtomicU64::new(0),
            rejected_records: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl PutRecordsClient for SimulatedStream {
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, SubmitError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.transport_error_rate) {
            self.transport_errors.fetch_add(1, Ordering::Relaxed);
            return Err(SubmitError::Transport(format!(
                "stream: {stream_name} is unreachable"
            )));
        }

        let outcomes = records
            .iter()
            .map(|record| {
                if rng.gen_bool(self.reject_rate) {
                    self.rejected_records.fetch_add(1, Ordering::Relaxed);
                    RecordOutcome::failed(
                        "ProvisionedThroughputExceededException",
                        "Rate exceeded for shard",
                    )
                } else {
                    self.accepted_records.fetch_add(1, Ordering::Relaxed);
                    self.accepted_bytes
                        .fetch_add(record.size() as u64, Ordering::Relaxed);
                    RecordOutcome::accepted()
                }
            })
            .collect();
        Ok(PutRecordsOutput::from_outcomes(outcomes))
    }
}
