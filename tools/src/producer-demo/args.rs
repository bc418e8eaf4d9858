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

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Pushes random records through the batching producer into a simulated stream")]
pub struct Args {
    /// Optional TOML file with producer settings, overridden by the flags below
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Target stream name
    #[arg(long, short = 's')]
    pub stream: Option<String>,

    /// Number of concurrent tasks putting records
    #[arg(long, short = 'p', default_value_t = 4)]
    pub producers: usize,

    /// Number of records put by every task
    #[arg(long, short = 'n', default_value_t = 10_000)]
    pub records: usize,

    /// Payload size in bytes
    #[arg(long, default_value_t = 256)]
    pub payload_size: usize,

    /// Number of distinct partition keys
    #[arg(long, default_value_t = 16)]
    pub partition_keys: usize,

    /// Maximum number of records per request
    #[arg(long)]
    pub batch_length: Option<usize>,

    /// Flush interval in milliseconds
    #[arg(long)]
    pub flush_interval_ms: Option<u64>,

    /// Probability that the simulated stream rejects a single record
    #[arg(long, default_value_t = 0.02)]
    pub reject_rate: f64,

    /// Probability that a whole request fails at the transport level
    #[arg(long, default_value_t = 0.01)]
    pub transport_error_rate: f64,

    /// Simulated request latency in milliseconds
    #[arg(long, default_value_t = 5)]
    pub latency_ms: u64,
}
