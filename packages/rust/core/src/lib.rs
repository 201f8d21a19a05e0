//! Run orchestration for the jobscout pipeline.

pub mod pipeline;

pub use pipeline::{
    Phase, PipelineConfig, ProgressReporter, RunReport, SilentProgress, run,
};
