pub mod stage;

pub use stage::{DocumentFailure, Transform, TransformReport, TransformStage};
