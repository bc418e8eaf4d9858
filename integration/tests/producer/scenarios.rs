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

use super::{BACKOFF, HOUR, STREAM_NAME, create_payload, create_producer};
use batch_producer::{LifecycleState, MAX_RECORD_SIZE, MAX_REQUEST_SIZE, MIB, ProducerError};
use integration::CapturedLogs;
use integration::recording_client::{REJECTED_CODE, RecordingClient, Response};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn should_flush_on_batch_length_and_remainder_on_stop() {
    let client = Arc::new(RecordingClient::new());
    let producer = create_producer(&client, 2, HOUR);
    producer.start().unwrap();

    for index in 0..3 {
        producer.put(&create_payload(index), "key").await.unwrap();
    }
    producer.stop().await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].payloads(),
        vec![create_payload(0), create_payload(1)]
    );
    assert_eq!(requests[1].payloads(), vec![create_payload(2)]);
    assert!(requests.iter().all(|r| r.stream_name == STREAM_NAME));
    assert_eq!(producer.state(), LifecycleState::Stopped);
}

#[tokio::test]
async fn should_reject_record_one_byte_over_limit() {
    let client = Arc::new(RecordingClient::new());
    let producer = create_producer(&client, 10, HOUR);
    let key = "partition-key";
    let data = vec![b'x'; MAX_RECORD_SIZE + 1 - key.len()];

    let result = producer.put(&data, key).await;

    assert!(matches!(
        result,
        Err(ProducerError::RecordSizeExceeded { size, .. }) if size == MAX_RECORD_SIZE + 1
    ));
    assert_eq!(producer.backlog_len(), 0);
}

#[tokio::test(start_paused = true)]
async fn should_resubmit_only_rejected_record_after_backoff() {
    let client = Arc::new(RecordingClient::with_script([Response::Reject(vec![1])]));
    let producer = create_producer(&client, 3, HOUR);
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    producer.start().unwrap();

    let started_at = Instant::now();
    for index in 0..3 {
        producer
            .put(&create_payload(index), format!("key-{index}"))
            .await
            .unwrap();
    }
    producer.stop().await.unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].records.len(), 3);
    assert_eq!(requests[1].records.len(), 1);
    assert_eq!(requests[1].records[0], requests[0].records[1]);
    assert_eq!(requests[1].records[0].partition_key, "key-1");
    assert!(started_at.elapsed() >= BACKOFF);
    assert_eq!(client.accepted().len(), 3);

    let logs = logs.contents();
    assert!(logs.contains("ERROR"));
    assert!(logs.contains(&format!("code: {REJECTED_CODE}, message: Rate exceeded for shard")));
}

#[tokio::test(start_paused = true)]
async fn should_flush_incomplete_batch_when_interval_elapses() {
    let client = Arc::new(RecordingClient::new());
    let producer = create_producer(&client, 100, Duration::from_millis(200));
    producer.start().unwrap();

    producer.put(b"first", "key").await.unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(client.requests().len(), 1);

    producer.put(b"second", "key").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(client.requests().len(), 2);

    producer.stop().await.unwrap();
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn should_split_large_records_by_request_size() {
    let client = Arc::new(RecordingClient::new());
    let producer = create_producer(&client, 500, HOUR);
    producer.start().unwrap();

    let data = vec![b'x'; MIB - 16];
    for index in 0..12 {
        producer.put(&data, format!("key-{index}")).await.unwrap();
    }
    producer.stop().await.unwrap();

    let requests = client.requests();
    let total: usize = requests.iter().map(|r| r.records.len()).sum();
    assert_eq!(total, 12);
    assert!(requests.len() >= 3);
    for request in &requests {
        assert!(request.size() <= MAX_REQUEST_SIZE);
    }
}
