//! Core types for the orchestrator pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Settings;
use crate::models::ConversionJob;

/// Read-only context passed to pipeline steps.
///
/// Contains the job and the run's settings. Mutable state goes in `JobState`.
pub struct Context {
    /// The job being processed.
    pub job: ConversionJob,
    /// Settings shared by every job of the run.
    pub settings: Arc<Settings>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(job: ConversionJob, settings: Arc<Settings>) -> Self {
        Self { job, settings }
    }

    /// Job name/identifier.
    pub fn job_name(&self) -> &str {
        &self.job.name
    }

    /// Input directory of the job.
    pub fn input_dir(&self) -> &Path {
        &self.job.input_dir
    }

    /// Output directory of the job.
    pub fn output_dir(&self) -> &Path {
        &self.job.output_dir
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section and written once.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    /// Split step results.
    pub split: Option<SplitOutput>,
    /// Image step results.
    pub image: Option<ImageOutput>,
    /// Tag step results.
    pub tags: Option<TagOutput>,
    /// Verify step results.
    pub verify: Option<VerifyOutput>,
}

impl JobState {
    /// Create an empty job state.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Output from the Split step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutput {
    /// Track files present after splitting, sorted.
    pub tracks: Vec<PathBuf>,
    /// The tool flagged the leading track as too short and it was removed.
    pub removed_short_track: bool,
    /// Split tool exit code.
    pub exit_code: i32,
    /// Stage log path.
    pub log_path: PathBuf,
}

/// Output from the Image step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutput {
    /// Image copied from the input directory.
    pub source: PathBuf,
    /// `folder.<ext>` in the output directory.
    pub destination: PathBuf,
}

/// Output from the Tag step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutput {
    /// Files whose tags were rewritten.
    pub files: Vec<PathBuf>,
    /// Total tag values written.
    pub values_written: usize,
    /// Spellings missing from the conversion dictionary.
    pub unknown_names: Vec<String>,
    /// Target names rejected as Vorbis comment field names.
    pub invalid_names: Vec<String>,
}

/// Output from the Verify step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyOutput {
    /// Files listed, in the order passed to the tool.
    pub files: Vec<PathBuf>,
    /// Metadata tool exit code.
    pub exit_code: i32,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (not an error).
    Skipped(String),
}
