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

use crate::flusher::FlushReason;
use crate::record::Record;
use async_trait::async_trait;
use std::fmt::Debug;
use tracing::error;

/// Context handed to an [`ErrorCallback`] once a batch ran out of retries.
#[derive(Debug, Clone)]
pub struct ErrorCtx {
    pub stream_name: String,
    pub reason: FlushReason,
    pub attempts: u32,
    pub last_error: String,
    pub records: Vec<Record>,
}

/// Receives records the producer gave up on.
///
/// Only invoked when a retry limit is configured; with the default unbounded
/// retries every record is eventually accepted by the service.
#[async_trait]
pub trait ErrorCallback: Send + Sync + Debug + 'static {
    async fn call(&self, ctx: ErrorCtx);
}

#[derive(Debug, Default)]
pub struct LogErrorCallback;

#[async_trait]
impl ErrorCallback for LogErrorCallback {
    async fn call(&self, ctx: ErrorCtx) {
        error!(
            "Giving up on {} record(s) for stream: {} after {} attempt(s), reason: {}. Last error: {}",
            ctx.records.len(),
            ctx.stream_name,
            ctx.attempts,
            ctx.reason,
            ctx.last_error
        );
    }
}
