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

use crate::assembler::{BatchAssembler, LifecycleState, SharedState};
use crate::config::{BackpressureMode, ProducerConfig};
use crate::error::ProducerError;
use crate::flusher::Flusher;
use crate::record::Record;
use bytes::Bytes;
use flume::TrySendError;
use std::mem;
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, trace, warn};

enum Lifecycle {
    Idle(BatchAssembler),
    Running(JoinHandle<()>),
    Stopped,
}

/// Accepts records from any number of callers and delivers them in batches.
///
/// ```no_run
/// # use batch_producer::{Producer, ProducerConfig, PutRecordsClient};
/// # use std::sync::Arc;
/// # async fn run(client: Arc<dyn PutRecordsClient>) -> Result<(), batch_producer::ProducerError> {
/// let producer = Producer::new(
///     ProducerConfig::builder()
///         .stream_name("events")
///         .client(client)
///         .separator(&b"\n"[..])
///         .build(),
/// )?;
/// producer.start()?;
/// producer.put(b"hello", "user-1").await?;
/// producer.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct Producer {
    name: String,
    stream_name: String,
    separator: Bytes,
    backpressure: BackpressureMode,
    /// Taken on stop. Every put works on its own clone, so the backlog only
    /// disconnects once the last in-flight put has finished.
    sender: Mutex<Option<flume::Sender<Record>>>,
    backlog: flume::Receiver<Record>,
    state: SharedState,
    lifecycle: Mutex<Lifecycle>,
}

impl Producer {
    pub fn new(config: ProducerConfig) -> Result<Self, ProducerError> {
        config.validate()?;

        let (sender, receiver) = flume::bounded(config.backlog_size);
        let state = SharedState::default();
        let flusher = Flusher::new(
            config.name.clone(),
            config.stream_name.clone(),
            config.client,
            config.backoff,
            config.max_retries,
            config.error_callback,
        );
        let assembler = BatchAssembler::new(
            config.name.clone(),
            receiver.clone(),
            config.batch_length,
            config.flush_interval,
            flusher,
            state.clone(),
        );

        Ok(Self {
            name: config.name,
            stream_name: config.stream_name,
            separator: config.separator,
            backpressure: config.backpressure,
            sender: Mutex::new(Some(sender)),
            backlog: receiver,
            state,
            lifecycle: Mutex::new(Lifecycle::Idle(assembler)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    /// Number of records waiting in the backlog.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Spawns the batching task on the current tokio runtime.
    pub fn start(&self) -> Result<(), ProducerError> {
        let mut lifecycle = self.lock_lifecycle();
        match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle(assembler) => {
                trace!("Starting producer: {}...", self.name);
                self.state.set(LifecycleState::Running);
                *lifecycle = Lifecycle::Running(tokio::spawn(assembler.run()));
                Ok(())
            }
            other => {
                *lifecycle = other;
                warn!("Producer: {} has already been started.", self.name);
                Err(ProducerError::AlreadyStarted)
            }
        }
    }

    /// Enqueues a record. Safe to call concurrently.
    ///
    /// Oversized records are rejected without touching the backlog. When the
    /// backlog is full the behavior depends on [`BackpressureMode`]; by
    /// default the call waits for space.
    pub async fn put(
        &self,
        data: &[u8],
        partition_key: impl Into<String>,
    ) -> Result<(), ProducerError> {
        let Some(sender) = lock(&self.sender).clone() else {
            return Err(ProducerError::ProducerStopped);
        };

        let record = Record::new(data, partition_key, &self.separator)?;
        match self.backpressure {
            BackpressureMode::Block => sender
                .send_async(record)
                .await
                .map_err(|_| ProducerError::ProducerStopped),
            BackpressureMode::BlockWithTimeout(timeout) => {
                match tokio::time::timeout(timeout, sender.send_async(record)).await {
                    Ok(result) => result.map_err(|_| ProducerError::ProducerStopped),
                    Err(_) => Err(ProducerError::BacklogTimeout(timeout)),
                }
            }
            BackpressureMode::FailImmediately => {
                sender.try_send(record).map_err(|error| match error {
                    TrySendError::Full(_) => ProducerError::BacklogFull,
                    TrySendError::Disconnected(_) => ProducerError::ProducerStopped,
                })
            }
        }
    }

    /// Stops accepting records and waits until everything already accepted
    /// has been submitted.
    pub async fn stop(&self) -> Result<(), ProducerError> {
        let handle = {
            let mut lifecycle = self.lock_lifecycle();
            match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                Lifecycle::Running(handle) => handle,
                Lifecycle::Stopped => return Ok(()),
                idle @ Lifecycle::Idle(_) => {
                    *lifecycle = idle;
                    return Err(ProducerError::NotStarted);
                }
            }
        };

        info!(
            "Stopping producer: {}, backlog: {}...",
            self.name,
            self.backlog_len()
        );
        self.state.set(LifecycleState::Draining);
        lock(&self.sender).take();
        if let Err(error) = handle.await {
            error!("Producer: {} task failed: {error}", self.name);
        }

        info!("Producer: {} has been stopped.", self.name);
        Ok(())
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        lock(&self.lifecycle)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
