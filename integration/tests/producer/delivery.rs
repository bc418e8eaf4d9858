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

use super::{base_config, create_payload};
use async_trait::async_trait;
use batch_producer::{ErrorCallback, ErrorCtx, MIB, Producer, ProducerConfig, ProducerError};
use bytes::Bytes;
use futures::future::join_all;
use integration::recording_client::{RecordingClient, Response};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_matrix;

const PRODUCERS: usize = 8;
const RECORDS_PER_PRODUCER: usize = 250;

fn batch_length(length: usize) -> usize {
    length
}

fn backlog_size(size: usize) -> usize {
    size
}

fn failing_script() -> Vec<Response> {
    let mut script = Vec::new();
    for round in 0..20 {
        script.push(Response::Accept);
        script.push(Response::Reject(vec![0, round % 3, 7]));
        if round % 4 == 0 {
            script.push(Response::TransportError);
        }
    }
    script
}

#[test_matrix(
    [batch_length(1), batch_length(7), batch_length(500)],
    [backlog_size(1), backlog_size(64)]
)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_deliver_every_accepted_record_despite_failures(
    batch_length: usize,
    backlog_size: usize,
) {
    let client = Arc::new(RecordingClient::with_script(failing_script()));
    let producer = Arc::new(
        Producer::new(ProducerConfig {
            batch_length,
            backlog_size,
            flush_interval: Duration::from_millis(10),
            ..base_config(&client)
        })
        .unwrap(),
    );
    producer.start().unwrap();

    let tasks = (0..PRODUCERS).map(|producer_id| {
        let producer = producer.clone();
        tokio::spawn(async move {
            for index in 0..RECORDS_PER_PRODUCER {
                let payload = create_payload(producer_id * RECORDS_PER_PRODUCER + index);
                producer
                    .put(&payload, format!("producer-{producer_id}"))
                    .await
                    .unwrap();
            }
        })
    });
    for result in join_all(tasks).await {
        result.unwrap();
    }
    producer.stop().await.unwrap();

    let expected: HashSet<Bytes> = (0..PRODUCERS * RECORDS_PER_PRODUCER)
        .map(create_payload)
        .collect();
    let accepted: HashSet<Bytes> = client.accepted().into_iter().collect();
    assert_eq!(accepted, expected);
    assert_eq!(producer.backlog_len(), 0);

    for request in client.requests() {
        assert!(!request.records.is_empty());
        assert!(request.records.len() <= batch_length);
    }
}

#[tokio::test]
async fn should_keep_per_producer_order_within_requests() {
    let client = Arc::new(RecordingClient::new());
    let producer = Producer::new(ProducerConfig {
        batch_length: 10,
        ..base_config(&client)
    })
    .unwrap();
    producer.start().unwrap();

    for index in 0..95 {
        producer.put(&create_payload(index), "key").await.unwrap();
    }
    producer.stop().await.unwrap();

    let delivered: Vec<Bytes> = client
        .requests()
        .iter()
        .flat_map(|request| request.payloads())
        .collect();
    let expected: Vec<Bytes> = (0..95).map(create_payload).collect();
    assert_eq!(delivered, expected);
}

#[derive(Debug, Default)]
struct CollectingCallback {
    records: Mutex<Vec<Bytes>>,
}

#[async_trait]
impl ErrorCallback for CollectingCallback {
    async fn call(&self, ctx: ErrorCtx) {
        self.records
            .lock()
            .unwrap()
            .extend(ctx.records.into_iter().map(|record| record.data));
    }
}

#[tokio::test(start_paused = true)]
async fn should_hand_undeliverable_records_to_error_callback_when_retries_are_bounded() {
    let client = Arc::new(RecordingClient::with_script(vec![Response::TransportError; 10]));
    let callback = Arc::new(CollectingCallback::default());
    let producer = Producer::new(ProducerConfig {
        batch_length: 2,
        max_retries: Some(2),
        error_callback: callback.clone(),
        ..base_config(&client)
    })
    .unwrap();
    producer.start().unwrap();

    for index in 0..4 {
        producer.put(&create_payload(index), "key").await.unwrap();
    }
    producer.stop().await.unwrap();

    // First batch: 3 failed attempts, second batch: 3 failed attempts,
    // nothing accepted. The script still has 4 failures left.
    assert_eq!(client.requests().len(), 6);
    assert!(client.accepted().is_empty());
    let given_up = callback.records.lock().unwrap().clone();
    let expected: Vec<Bytes> = (0..4).map(create_payload).collect();
    assert_eq!(given_up, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn should_deliver_every_record_whose_put_succeeded_while_stopping() {
    const PUTTERS: usize = 7;

    for round in 0..20 {
        let client = Arc::new(RecordingClient::new());
        let producer = Arc::new(Producer::new(base_config(&client)).unwrap());
        producer.start().unwrap();

        let data = Bytes::from(vec![b'x'; MIB / 4]);
        let tasks: Vec<_> = (0..PUTTERS)
            .map(|putter| {
                let producer = producer.clone();
                let data = data.clone();
                tokio::spawn(async move {
                    let mut succeeded = 0usize;
                    loop {
                        match producer.put(&data, format!("putter-{putter}")).await {
                            Ok(()) => succeeded += 1,
                            Err(ProducerError::ProducerStopped) => return succeeded,
                            Err(error) => panic!("Unexpected put error: {error}"),
                        }
                        tokio::time::sleep(Duration::from_micros(1500)).await;
                    }
                })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(20)).await;
        // Keep the final flush in flight while late puts are still racing the stop.
        client.set_latency(Duration::from_millis(50));
        producer.stop().await.unwrap();

        let succeeded: usize = join_all(tasks)
            .await
            .into_iter()
            .map(|result| result.unwrap())
            .sum();
        assert_eq!(
            client.accepted().len(),
            succeeded,
            "round {round}: every successful put must be delivered"
        );
        assert_eq!(producer.backlog_len(), 0);
    }
}
