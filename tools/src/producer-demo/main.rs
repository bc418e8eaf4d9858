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

mod args;
mod simulated_stream;

use crate::args::Args;
use crate::simulated_stream::SimulatedStream;
use anyhow::Context;
use batch_producer::{Producer, ProducerSettings};
use clap::Parser;
use rand::distributions::Alphanumeric;
use rand::{Rng, thread_rng};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_STREAM: &str = "demo-stream";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings(&args)?;
    let stream = Arc::new(SimulatedStream::new(
        args.reject_rate,
        args.transport_error_rate,
        Duration::from_millis(args.latency_ms),
    ));
    info!("Starting producer demo with settings: {settings:?}");
    let producer = Arc::new(Producer::new(settings.into_config(stream.clone()))?);
    producer.start()?;

    let started_at = Instant::now();
    let mut tasks = Vec::with_capacity(args.producers);
    for producer_id in 0..args.producers {
        let producer = producer.clone();
        let records = args.records;
        let payload_size = args.payload_size;
        let partition_keys = args.partition_keys.max(1);
        tasks.push(tokio::spawn(async move {
            for index in 0..records {
                let payload = random_payload(payload_size);
                let key = format!("key-{}", (producer_id + index) % partition_keys);
                producer.put(payload.as_bytes(), key).await?;
            }
            anyhow::Ok(())
        }));
    }

    for task in tasks {
        task.await.context("producer task panicked")??;
    }
    producer.stop().await?;

    let elapsed = started_at.elapsed();
    let total = args.producers * args.records;
    let accepted = stream.accepted_records.load(Ordering::Relaxed);
    info!(
        "Put {total} records in {elapsed:?}: {accepted} accepted ({} bytes) in {} requests, {} rejections retried, {} transport errors retried.",
        stream.accepted_bytes.load(Ordering::Relaxed),
        stream.requests.load(Ordering::Relaxed),
        stream.rejected_records.load(Ordering::Relaxed),
        stream.transport_errors.load(Ordering::Relaxed),
    );
    anyhow::ensure!(
        accepted == total as u64,
        "expected {total} accepted records, got {accepted}"
    );
    Ok(())
}

fn load_settings(args: &Args) -> anyhow::Result<ProducerSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("invalid config file: {}", path.display()))?
        }
        None => ProducerSettings::default(),
    };

    if let Some(stream) = &args.stream {
        settings.stream_name = stream.clone();
    }
    if settings.stream_name.is_empty() {
        settings.stream_name = DEFAULT_STREAM.to_owned();
    }
    if let Some(batch_length) = args.batch_length {
        settings.batch_length = batch_length;
    }
    if let Some(flush_interval) = args.flush_interval_ms {
        settings.flush_interval = Duration::from_millis(flush_interval).into();
    }
    Ok(settings)
}

fn random_payload(size: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(size)
        .map(char::from)
        .collect()
}
