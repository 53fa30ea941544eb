pub mod scanner;

pub use scanner::{DocumentScanner, PageConsumer, ScanReport};
