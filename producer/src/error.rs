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

use std::time::Duration;
use thiserror::Error;

/// Errors returned synchronously to producer callers.
///
/// Delivery failures never show up here: they are retried (or handed to the
/// configured error callback) by the background flusher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProducerError {
    #[error("Record size {size} exceeds the maximum of {max} bytes")]
    RecordSizeExceeded { size: usize, max: usize },
    #[error("Producer has been stopped")]
    ProducerStopped,
    #[error("Producer backlog is full")]
    BacklogFull,
    #[error("Timed out after {0:?} waiting for space in the producer backlog")]
    BacklogTimeout(Duration),
    #[error("Invalid producer configuration: {0}")]
    InvalidConfig(String),
    #[error("Producer has already been started")]
    AlreadyStarted,
    #[error("Producer has not been started")]
    NotStarted,
}
