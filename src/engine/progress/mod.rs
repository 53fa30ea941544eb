pub mod tracker;

pub use tracker::{ProgressState, ProgressTracker, status_line};
