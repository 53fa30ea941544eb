use std::collections::HashSet;

use super::document::{DocumentRef, WriteOperation};

/// An ordered group of write operations sent as one bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    seq: u64,
    operations: Vec<WriteOperation>,
}

impl Batch {
    pub fn new(seq: u64, operations: Vec<WriteOperation>) -> Self {
        Self { seq, operations }
    }

    /// Position of this batch in the stream, starting at 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn operations(&self) -> &[WriteOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<WriteOperation> {
        self.operations
    }

    /// Distinct documents touched by this batch.
    pub fn refs(&self) -> HashSet<DocumentRef> {
        self.operations
            .iter()
            .map(|op| op.reference.clone())
            .collect()
    }
}
