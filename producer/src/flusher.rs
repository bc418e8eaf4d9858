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

use crate::backoff::Backoff;
use crate::batch::Batch;
use crate::client::PutRecordsClient;
use crate::error_callback::{ErrorCallback, ErrorCtx};
use std::sync::Arc;
use strum::Display;
use tracing::{error, trace, warn};

/// Why a batch is being flushed. Only reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum FlushReason {
    #[strum(to_string = "request size")]
    RequestSize,
    #[strum(to_string = "batch length")]
    BatchLength,
    #[strum(to_string = "interval")]
    Interval,
    #[strum(to_string = "drain")]
    Drain,
}

/// Submits batches and keeps retrying whatever the service did not accept.
pub struct Flusher {
    name: String,
    stream_name: String,
    client: Arc<dyn PutRecordsClient>,
    backoff: Box<dyn Backoff>,
    max_retries: Option<u32>,
    error_callback: Arc<dyn ErrorCallback>,
}

impl Flusher {
    pub fn new(
        name: String,
        stream_name: String,
        client: Arc<dyn PutRecordsClient>,
        backoff: Box<dyn Backoff>,
        max_retries: Option<u32>,
        error_callback: Arc<dyn ErrorCallback>,
    ) -> Self {
        Self {
            name,
            stream_name,
            client,
            backoff,
            max_retries,
            error_callback,
        }
    }

    /// Returns once every record of `batch` was accepted, or once the retry
    /// limit (if any) was reached and the rest went to the error callback.
    /// Only a request accepted in full resets the backoff.
    pub async fn flush(&mut self, mut batch: Batch, reason: FlushReason) {
        let name = &self.name;
        let stream = &self.stream_name;
        let mut retries = 0u32;

        while !batch.is_empty() {
            trace!(
                "Producer: {name} flushing {} record(s), {} bytes to stream: {stream}, reason: {reason}, retry: {retries}",
                batch.len(),
                batch.size()
            );

            let last_error = match self.client.put_records(stream, batch.records()).await {
                Ok(output) if output.failed_record_count == 0 => {
                    self.backoff.reset();
                    break;
                }
                Ok(output) => {
                    for outcome in output.records.iter().filter(|outcome| outcome.is_failure()) {
                        error!(
                            "Producer: {name} failed to put record to stream: {stream}, code: {}, message: {}",
                            outcome.error_code.as_deref().unwrap_or_default(),
                            outcome.error_message.as_deref().unwrap_or_default()
                        );
                    }

                    batch = batch.failures(&output.records);
                    if batch.is_empty() {
                        warn!(
                            "Producer: {name} got {} failure(s) from stream: {stream} without any rejected record.",
                            output.failed_record_count
                        );
                        break;
                    }
                    format!("{} record(s) rejected", output.failed_record_count)
                }
                Err(error) => {
                    error!(
                        "Producer: {name} failed to put {} record(s) to stream: {stream}. {error}",
                        batch.len()
                    );
                    error.to_string()
                }
            };

            retries += 1;
            if let Some(max_retries) = self.max_retries {
                if retries > max_retries {
                    self.error_callback
                        .call(ErrorCtx {
                            stream_name: stream.clone(),
                            reason,
                            attempts: retries,
                            last_error,
                            records: batch.into_records(),
                        })
                        .await;
                    break;
                }
            }

            let backoff = self.backoff.duration();
            warn!(
                "Producer: {name} has {} failure(s) for stream: {stream}, retrying in {backoff:?}...",
                batch.len()
            );
            tokio::time::sleep(backoff).await;
        }
    }
}
