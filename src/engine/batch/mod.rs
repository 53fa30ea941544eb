pub mod builder;

pub use builder::{BatchBuilder, split_into_batches};
