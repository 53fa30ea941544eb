use std::mem;

use crate::engine::errors::ConfigurationError;
use crate::engine::types::{Batch, WriteOperation};

/// Cuts the operation stream into batches of exactly `max_batch_size`; only
/// the batch returned by [`BatchBuilder::finish`] may be smaller. Operation
/// order is preserved across and within batches.
#[derive(Debug)]
pub struct BatchBuilder {
    max_batch_size: usize,
    buffer: Vec<WriteOperation>,
    built: u64,
}

impl BatchBuilder {
    pub fn new(max_batch_size: usize) -> Result<Self, ConfigurationError> {
        if max_batch_size == 0 {
            return Err(ConfigurationError::InvalidBatchSize);
        }
        Ok(Self {
            max_batch_size,
            buffer: Vec::with_capacity(max_batch_size),
            built: 0,
        })
    }

    pub fn push(&mut self, op: WriteOperation) -> Option<Batch> {
        self.buffer.push(op);
        if self.buffer.len() == self.max_batch_size {
            Some(self.cut())
        } else {
            None
        }
    }

    /// Pushes every operation, returning the batches that filled up.
    pub fn extend(&mut self, ops: impl IntoIterator<Item = WriteOperation>) -> Vec<Batch> {
        ops.into_iter().filter_map(|op| self.push(op)).collect()
    }

    /// Flushes the trailing partial batch, if any.
    pub fn finish(mut self) -> Option<Batch> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.cut())
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn batches_built(&self) -> u64 {
        self.built
    }

    fn cut(&mut self) -> Batch {
        self.built += 1;
        let ops = mem::replace(&mut self.buffer, Vec::with_capacity(self.max_batch_size));
        Batch::new(self.built, ops)
    }
}

/// Batches a materialized operation list.
pub fn split_into_batches(
    ops: Vec<WriteOperation>,
    max_batch_size: usize,
) -> Result<Vec<Batch>, ConfigurationError> {
    let mut builder = BatchBuilder::new(max_batch_size)?;
    let mut batches = builder.extend(ops);
    batches.extend(builder.finish());
    Ok(batches)
}
