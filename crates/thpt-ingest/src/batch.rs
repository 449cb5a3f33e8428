//! Batch accumulator: an in-memory buffer between parsing and loading

use thpt_common::record::ScoreRecord;

/// Buffers parsed records up to a configured batch size
///
/// Purely process-local; `drain` moves the buffered records out so nothing
/// is retained once a batch has been handed to the loader.
#[derive(Debug)]
pub struct BatchAccumulator {
    records: Vec<ScoreRecord>,
    capacity: usize,
}

impl BatchAccumulator {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: ScoreRecord) {
        self.records.push(record);
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Return the buffered records and reset the buffer
    pub fn drain(&mut self) -> Vec<ScoreRecord> {
        std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity))
    }
}
