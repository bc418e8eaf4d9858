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

use crate::client::RecordOutcome;
use crate::record::Record;
use std::mem;

/// Ordered records waiting for submission, with their accumulated size.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    records: Vec<Record>,
    size: usize,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            size: 0,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.size += record.size();
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total bytes of all records in the batch.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Moves the records out, leaving an empty batch with the same capacity.
    pub fn take(&mut self) -> Batch {
        let capacity = self.records.capacity();
        mem::replace(self, Batch::with_capacity(capacity))
    }

    /// Builds the retry batch: records whose outcome at the same position
    /// carries an error code, in their original order. Records without an
    /// outcome are treated as rejected.
    pub fn failures(self, outcomes: &[RecordOutcome]) -> Batch {
        let mut failed = Batch::default();
        for (index, record) in self.records.into_iter().enumerate() {
            if outcomes.get(index).map_or(true, RecordOutcome::is_failure) {
                failed.push(record);
            }
        }
        failed
    }
}

impl FromIterator<Record> for Batch {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        let mut batch = Batch::default();
        for record in iter {
            batch.push(record);
        }
        batch
    }
}
