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

use crate::MAX_REQUEST_SIZE;
use crate::batch::Batch;
use crate::flusher::{FlushReason, Flusher};
use crate::record::Record;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use strum::Display;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, trace};

const ORDERING: Ordering = Ordering::SeqCst;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[repr(u8)]
pub enum LifecycleState {
    /// Created, background task not started yet.
    Idle = 0,
    Running = 1,
    /// Backlog closed, flushing whatever is left in it.
    Draining = 2,
    Stopped = 3,
}

impl From<u8> for LifecycleState {
    fn from(value: u8) -> Self {
        match value {
            0 => LifecycleState::Idle,
            1 => LifecycleState::Running,
            2 => LifecycleState::Draining,
            _ => LifecycleState::Stopped,
        }
    }
}

/// Lifecycle state readable from the producer while the assembler owns it.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn get(&self) -> LifecycleState {
        self.0.load(ORDERING).into()
    }

    pub(crate) fn set(&self, state: LifecycleState) {
        self.0.store(state as u8, ORDERING);
    }
}

/// Current batch plus the flusher; only ever touched by the assembler task.
struct Accumulator {
    batch: Batch,
    batch_length: usize,
    flusher: Flusher,
}

impl Accumulator {
    async fn push(&mut self, record: Record) {
        if self.batch.size() + record.size() > MAX_REQUEST_SIZE {
            self.flush(FlushReason::RequestSize).await;
        }

        self.batch.push(record);
        if self.batch.len() >= self.batch_length {
            self.flush(FlushReason::BatchLength).await;
        }
    }

    async fn flush(&mut self, reason: FlushReason) {
        if self.batch.is_empty() {
            return;
        }

        let batch = self.batch.take();
        self.flusher.flush(batch, reason).await;
    }
}

/// Single consumer of the backlog: batches records and decides when to flush.
///
/// Runs until the backlog is disconnected, i.e. every sender is gone and
/// every record sent through them has been received.
pub(crate) struct BatchAssembler {
    name: String,
    receiver: flume::Receiver<Record>,
    flush_interval: Duration,
    state: SharedState,
    accumulator: Accumulator,
}

impl BatchAssembler {
    pub(crate) fn new(
        name: String,
        receiver: flume::Receiver<Record>,
        batch_length: usize,
        flush_interval: Duration,
        flusher: Flusher,
        state: SharedState,
    ) -> Self {
        Self {
            name,
            receiver,
            flush_interval,
            state,
            accumulator: Accumulator {
                batch: Batch::with_capacity(batch_length),
                batch_length,
                flusher,
            },
        }
    }

    pub(crate) async fn run(self) {
        let BatchAssembler {
            name,
            receiver,
            flush_interval,
            state,
            mut accumulator,
        } = self;

        let mut interval = tokio::time::interval_at(Instant::now() + flush_interval, flush_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Producer: {name} has been started, flush interval: {flush_interval:?}.");

        loop {
            tokio::select! {
                record = receiver.recv_async() => {
                    let Ok(record) = record else {
                        trace!("Producer: {name} backlog has been closed and drained.");
                        break;
                    };

                    accumulator.push(record).await;
                }
                _ = interval.tick() => {
                    accumulator.flush(FlushReason::Interval).await;
                }
            }
        }

        accumulator.flush(FlushReason::Drain).await;
        state.set(LifecycleState::Stopped);
        info!("Producer: {name} has been drained.");
    }
}
