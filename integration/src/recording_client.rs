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
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const REJECTED_CODE: &str = "ProvisionedThroughputExceededException";

/// Scripted answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Accept,
    /// Reject the records at the given positions of the request.
    Reject(Vec<usize>),
    TransportError,
}

/// Request sent to [`RecordingClient`], with the answer it got.
#[derive(Debug, Clone)]
pub struct Request {
    pub stream_name: String,
    pub records: Vec<Record>,
    pub response: Response,
}

impl Request {
    pub fn payloads(&self) -> Vec<Bytes> {
        self.records.iter().map(|r| r.data.clone()).collect()
    }

    pub fn size(&self) -> usize {
        self.records.iter().map(Record::size).sum()
    }
}

/// In-memory ingestion service that records every request and answers
/// according to a script; once the script runs out every request succeeds.
#[derive(Debug, Default)]
pub struct RecordingClient {
    script: Mutex<VecDeque<Response>>,
    requests: Mutex<Vec<Request>>,
    latency: Mutex<Option<Duration>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(script: impl IntoIterator<Item = Response>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    /// Applies to every request submitted from now on.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Payloads the service accepted, in acceptance order.
    pub fn accepted(&self) -> Vec<Bytes> {
        let requests = self.requests.lock().unwrap();
        let mut accepted = Vec::new();
        for request in requests.iter() {
            match &request.response {
                Response::Accept => accepted.extend(request.payloads()),
                Response::Reject(positions) => accepted.extend(
                    request
                        .records
                        .iter()
                        .enumerate()
                        .filter(|(index, _)| !positions.contains(index))
                        .map(|(_, record)| record.data.clone()),
                ),
                Response::TransportError => {}
            }
        }
        accepted
    }
}

#[async_trait]
impl PutRecordsClient for RecordingClient {
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, SubmitError> {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let response = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Response::Accept);
        self.requests.lock().unwrap().push(Request {
            stream_name: stream_name.to_owned(),
            records: records.to_vec(),
            response: response.clone(),
        });

        match response {
            Response::Accept => Ok(PutRecordsOutput::all_accepted(records.len())),
            Response::Reject(positions) => Ok(PutRecordsOutput::from_outcomes(
                (0..records.len())
                    .map(|index| {
                        if positions.contains(&index) {
                            RecordOutcome::failed(REJECTED_CODE, "Rate exceeded for shard")
                        } else {
                            RecordOutcome::accepted()
                        }
                    })
                    .collect(),
            )),
            Response::TransportError => {
                Err(SubmitError::Transport("connection reset by peer".to_owned()))
            }
        }
    }
}
