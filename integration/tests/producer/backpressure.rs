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

use super::{HOUR, base_config, create_payload};
use batch_producer::{BackpressureMode, Producer, ProducerConfig, ProducerError};
use integration::recording_client::RecordingClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const LATENCY: Duration = Duration::from_secs(1);

fn create_slow_producer(client: &Arc<RecordingClient>, backpressure: BackpressureMode) -> Producer {
    Producer::new(ProducerConfig {
        backlog_size: 1,
        batch_length: 1,
        flush_interval: HOUR,
        backpressure,
        ..base_config(client)
    })
    .unwrap()
}

#[tokio::test(start_paused = true)]
async fn should_block_put_while_flusher_is_busy() {
    let client = Arc::new(RecordingClient::new().with_latency(LATENCY));
    let producer = create_slow_producer(&client, BackpressureMode::Block);
    producer.start().unwrap();

    // Taken by the assembler, which then waits for the slow service.
    producer.put(&create_payload(0), "key").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    // Fills the backlog.
    producer.put(&create_payload(1), "key").await.unwrap();

    let started_at = Instant::now();
    producer.put(&create_payload(2), "key").await.unwrap();
    assert!(started_at.elapsed() >= Duration::from_millis(900));

    producer.stop().await.unwrap();
    assert_eq!(client.accepted().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn should_fail_put_immediately_while_flusher_is_busy() {
    let client = Arc::new(RecordingClient::new().with_latency(LATENCY));
    let producer = create_slow_producer(&client, BackpressureMode::FailImmediately);
    producer.start().unwrap();

    producer.put(&create_payload(0), "key").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    producer.put(&create_payload(1), "key").await.unwrap();

    assert_eq!(
        producer.put(&create_payload(2), "key").await,
        Err(ProducerError::BacklogFull)
    );

    producer.stop().await.unwrap();
    assert_eq!(client.accepted().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn should_time_out_put_while_flusher_is_busy() {
    let client = Arc::new(RecordingClient::new().with_latency(LATENCY));
    let timeout = Duration::from_millis(100);
    let producer = create_slow_producer(&client, BackpressureMode::BlockWithTimeout(timeout));
    producer.start().unwrap();

    producer.put(&create_payload(0), "key").await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    producer.put(&create_payload(1), "key").await.unwrap();

    assert_eq!(
        producer.put(&create_payload(2), "key").await,
        Err(ProducerError::BacklogTimeout(timeout))
    );

    producer.stop().await.unwrap();
    assert_eq!(client.accepted().len(), 2);
}
