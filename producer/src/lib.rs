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

//! Batching producer for streaming ingestion services.
//!
//! Records are validated and enqueued by [`Producer::put`], accumulated into
//! batches by a single background task and submitted through a
//! [`PutRecordsClient`]. Rejected records are retried with backoff until the
//! service accepts them.

pub mod assembler;
pub mod backoff;
pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod error_callback;
pub mod flusher;
pub mod producer;
pub mod record;

pub use assembler::LifecycleState;
pub use backoff::{Backoff, ConstantBackoff, ExponentialBackoff};
pub use batch::Batch;
pub use client::{PutRecordsClient, PutRecordsOutput, RecordOutcome, SubmitError};
pub use config::{BackpressureMode, ProducerConfig, ProducerSettings};
pub use error::ProducerError;
pub use error_callback::{ErrorCallback, ErrorCtx, LogErrorCallback};
pub use flusher::FlushReason;
pub use producer::Producer;
pub use record::Record;

pub const MIB: usize = 1_048_576;

/// Upper bound for a single record: payload, partition key and separator.
pub const MAX_RECORD_SIZE: usize = MIB;

/// Upper bound for the aggregated size of one submission request.
pub const MAX_REQUEST_SIZE: usize = 5 * MIB;

/// Upper bound for the number of records in one submission request.
pub const MAX_BATCH_LENGTH: usize = 500;
