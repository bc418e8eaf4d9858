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

use crate::MAX_RECORD_SIZE;
use crate::error::ProducerError;
use bytes::{BufMut, Bytes, BytesMut};

/// A single entry of a submission request: the payload (separator already
/// appended) and the key used by the service to pick a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data: Bytes,
    pub partition_key: String,
}

impl Record {
    /// Builds a record from the caller's payload, appending `separator`.
    ///
    /// Fails with [`ProducerError::RecordSizeExceeded`] when payload, key and
    /// separator together are larger than [`MAX_RECORD_SIZE`].
    pub fn new(
        data: &[u8],
        partition_key: impl Into<String>,
        separator: &[u8],
    ) -> Result<Self, ProducerError> {
        let partition_key = partition_key.into();
        let size = data.len() + partition_key.len() + separator.len();
        if size > MAX_RECORD_SIZE {
            return Err(ProducerError::RecordSizeExceeded {
                size,
                max: MAX_RECORD_SIZE,
            });
        }

        let mut buf = BytesMut::with_capacity(data.len() + separator.len());
        buf.put_slice(data);
        buf.put_slice(separator);
        Ok(Self {
            data: buf.freeze(),
            partition_key,
        })
    }

    /// Bytes this record contributes to a request.
    pub fn size(&self) -> usize {
        self.data.len() + self.partition_key.len()
    }
}
