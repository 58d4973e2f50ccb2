//! Pipeline orchestrator for coordinating job execution.
//!
//! This module provides the infrastructure for converting rip directories.
//! Each job is checked, then runs a fixed sequence of steps that validate,
//! execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! JobRunner
//!     ├── check: required files, no-overwrite
//!     └── Pipeline
//!         ├── Step: Split   (skipped with no-convert)
//!         ├── Step: Image
//!         ├── Step: Tag
//!         └── Step: Verify
//! ```
//!
//! # Example
//!
//! ```ignore
//! use wav2flac_core::models::{ConversionJob, JobFlags};
//! use wav2flac_core::orchestrator::JobRunner;
//! use wav2flac_core::tagging::FlacTagWriter;
//!
//! let jobs = ConversionJob::plan(&dirs, None, JobFlags::default())?;
//! let runner = JobRunner::new(settings, Box::new(FlacTagWriter::new()));
//! let summary = runner.process_all(&jobs);
//! println!("{} failed", summary.failed());
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

#[cfg(test)]
mod testing;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use runner::{JobOutcome, JobResult, JobRunner, RunSummary};
pub use step::PipelineStep;
pub use steps::{ImageStep, SplitStep, TagStep, VerifyStep};
pub use types::{
    Context, ImageOutput, JobState, SplitOutput, StepOutcome, TagOutput, VerifyOutput,
};

use crate::tagging::TagWriter;

/// Create a standard pipeline with all steps in the correct order.
///
/// The standard pipeline executes these steps:
/// 1. Split - cut the rip into tracks with shntool
/// 2. Image - copy the cover to `folder.<ext>`
/// 3. Tag - write Vorbis comments through `tag_writer`
/// 4. Verify - list the resulting comments with metaflac
pub fn create_standard_pipeline(tag_writer: Box<dyn TagWriter>) -> Pipeline {
    Pipeline::new()
        .with_step(SplitStep::new())
        .with_step(ImageStep::new())
        .with_step(TagStep::new(tag_writer))
        .with_step(VerifyStep::new())
}
