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

use crate::backoff::{Backoff, ExponentialBackoff};
use crate::client::PutRecordsClient;
use crate::error::ProducerError;
use crate::error_callback::{ErrorCallback, LogErrorCallback};
use crate::{MAX_BATCH_LENGTH, MAX_RECORD_SIZE};
use bon::Builder;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BACKLOG_SIZE: usize = 500;
const DEFAULT_BATCH_LENGTH: usize = 500;
const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_NAME: &str = "producer";

/// Determines how `put` behaves when the backlog is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackpressureMode {
    /// Block until there is space in the backlog
    #[default]
    Block,
    /// Block with a timeout, after which the put fails
    BlockWithTimeout(Duration),
    /// Fail immediately
    FailImmediately,
}

impl FromStr for BackpressureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if let Some(timeout) = s.strip_prefix("block_with_timeout:") {
            let timeout = humantime::parse_duration(timeout.trim())
                .map_err(|error| format!("Invalid backpressure timeout: {timeout}. {error}"))?;
            return Ok(BackpressureMode::BlockWithTimeout(timeout));
        }

        match s.as_str() {
            "block" => Ok(BackpressureMode::Block),
            "fail_immediately" => Ok(BackpressureMode::FailImmediately),
            _ => Err(format!("Invalid backpressure mode: {s}")),
        }
    }
}

impl Display for BackpressureMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackpressureMode::Block => write!(f, "block"),
            BackpressureMode::BlockWithTimeout(timeout) => {
                write!(f, "block_with_timeout:{}", humantime::format_duration(*timeout))
            }
            BackpressureMode::FailImmediately => write!(f, "fail_immediately"),
        }
    }
}

/// Runtime configuration of a [`crate::Producer`].
#[derive(Builder)]
pub struct ProducerConfig {
    /// Name of the target stream.
    #[builder(into)]
    pub stream_name: String,
    /// Remote ingestion capability.
    pub client: Arc<dyn PutRecordsClient>,
    /// Attached to every log event of this producer.
    #[builder(into, default = String::from(DEFAULT_NAME))]
    pub name: String,
    /// Capacity of the backlog between `put` callers and the batching task.
    #[builder(default = DEFAULT_BACKLOG_SIZE)]
    pub backlog_size: usize,
    /// Maximum **number of records** per request.
    #[builder(default = DEFAULT_BATCH_LENGTH)]
    pub batch_length: usize,
    /// How long an incomplete batch may wait before being flushed.
    #[builder(default = DEFAULT_FLUSH_INTERVAL)]
    pub flush_interval: Duration,
    /// Appended to every record's payload.
    #[builder(into, default = Bytes::new())]
    pub separator: Bytes,
    #[builder(default = Box::new(ExponentialBackoff::default()))]
    pub backoff: Box<dyn Backoff>,
    /// Retries of a single batch before it goes to `error_callback`. `None` => retry forever.
    pub max_retries: Option<u32>,
    #[builder(default)]
    pub backpressure: BackpressureMode,
    #[builder(default = Arc::new(LogErrorCallback))]
    pub error_callback: Arc<dyn ErrorCallback>,
}

impl ProducerConfig {
    pub fn validate(&self) -> Result<(), ProducerError> {
        if self.stream_name.is_empty() {
            return Err(ProducerError::InvalidConfig(
                "stream name cannot be empty".to_owned(),
            ));
        }

        if self.backlog_size == 0 {
            return Err(ProducerError::InvalidConfig(
                "backlog size must be greater than 0".to_owned(),
            ));
        }

        if self.batch_length == 0 || self.batch_length > MAX_BATCH_LENGTH {
            return Err(ProducerError::InvalidConfig(format!(
                "batch length must be between 1 and {MAX_BATCH_LENGTH}, got {}",
                self.batch_length
            )));
        }

        if self.flush_interval.is_zero() {
            return Err(ProducerError::InvalidConfig(
                "flush interval must be greater than 0".to_owned(),
            ));
        }

        if self.separator.len() >= MAX_RECORD_SIZE {
            return Err(ProducerError::InvalidConfig(format!(
                "separator of {} bytes leaves no room for records",
                self.separator.len()
            )));
        }

        Ok(())
    }
}

impl Debug for ProducerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProducerConfig")
            .field("stream_name", &self.stream_name)
            .field("name", &self.name)
            .field("backlog_size", &self.backlog_size)
            .field("batch_length", &self.batch_length)
            .field("flush_interval", &self.flush_interval)
            .field("separator", &self.separator)
            .field("backoff", &self.backoff)
            .field("max_retries", &self.max_retries)
            .field("backpressure", &self.backpressure)
            .field("error_callback", &self.error_callback)
            .finish_non_exhaustive()
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    #[serde_as(as = "DisplayFromStr")]
    pub base: humantime::Duration,
    #[serde_as(as = "DisplayFromStr")]
    pub max: humantime::Duration,
    pub factor: u32,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(100).into(),
            max: Duration::from_secs(5).into(),
            factor: 2,
        }
    }
}

/// Serializable part of [`ProducerConfig`], e.g. loaded from a TOML file.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerSettings {
    pub stream_name: String,
    pub name: String,
    pub backlog_size: usize,
    pub batch_length: usize,
    #[serde_as(as = "DisplayFromStr")]
    pub flush_interval: humantime::Duration,
    pub separator: String,
    pub max_retries: Option<u32>,
    #[serde_as(as = "DisplayFromStr")]
    pub backpressure: BackpressureMode,
    pub backoff: BackoffSettings,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            name: DEFAULT_NAME.to_owned(),
            backlog_size: DEFAULT_BACKLOG_SIZE,
            batch_length: DEFAULT_BATCH_LENGTH,
            flush_interval: DEFAULT_FLUSH_INTERVAL.into(),
            separator: String::new(),
            max_retries: None,
            backpressure: BackpressureMode::Block,
            backoff: BackoffSettings::default(),
        }
    }
}

impl ProducerSettings {
    /// Combines the settings with the runtime collaborators.
    pub fn into_config(self, client: Arc<dyn PutRecordsClient>) -> ProducerConfig {
        let backoff = ExponentialBackoff::new(*self.backoff.base, *self.backoff.max)
            .with_factor(self.backoff.factor);
        ProducerConfig::builder()
            .stream_name(self.stream_name)
            .client(client)
            .name(self.name)
            .backlog_size(self.backlog_size)
            .batch_length(self.batch_length)
            .flush_interval(*self.flush_interval)
            .separator(Bytes::from(self.separator.into_bytes()))
            .backoff(Box::new(backoff))
            .maybe_max_retries(self.max_retries)
            .backpressure(self.backpressure)
            .build()
    }
}
