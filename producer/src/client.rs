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

use crate::record::Record;
use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

/// Failure to get a structured answer from the service at all.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request throttled: {0}")]
    Throttled(String),
}

/// Per-position result of a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl RecordOutcome {
    pub fn accepted() -> Self {
        Self::default()
    }

    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            error_message: Some(message.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_code.is_some()
    }
}

/// Structured response of a submission request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutRecordsOutput {
    pub failed_record_count: u32,
    /// One entry per submitted record, in submission order.
    pub records: Vec<RecordOutcome>,
}

impl PutRecordsOutput {
    pub fn all_accepted(count: usize) -> Self {
        Self {
            failed_record_count: 0,
            records: vec![RecordOutcome::accepted(); count],
        }
    }

    pub fn from_outcomes(records: Vec<RecordOutcome>) -> Self {
        let failed_record_count = records.iter().filter(|r| r.is_failure()).count() as u32;
        Self {
            failed_record_count,
            records,
        }
    }
}

/// The remote ingestion capability used by the flusher.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PutRecordsClient: Send + Sync + 'static {
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, SubmitError>;
}
