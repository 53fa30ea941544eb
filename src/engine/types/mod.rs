pub mod batch;
pub mod document;
pub mod filter;

pub use batch::Batch;
pub use document::{DocumentRef, Fields, RawDocument, WriteOperation};
pub use filter::ScanFilter;
