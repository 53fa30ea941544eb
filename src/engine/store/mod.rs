pub mod client;
pub mod memory;

pub use client::{
    BulkAction, BulkItemOutcome, BulkOperation, BulkOptions, ConflictPolicy, DocumentStore, Page,
    Script, UpdateByQuery, UpdateByQueryReport,
};
pub use memory::{MemoryStore, ScriptEffect, ScriptFn};

#[cfg(test)]
mod memory_test;
