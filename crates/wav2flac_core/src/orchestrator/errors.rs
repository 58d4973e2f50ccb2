//! Errors raised while a job runs.
//!
//! A [`StepError`] says what went wrong inside a stage; the pipeline wraps it
//! in a [`PipelineError`] naming the job and the stage.

use std::io;

use thiserror::Error;

use crate::models::DescriptorError;
use crate::tagging::TagError;

/// A job failed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage rejected its inputs, failed, or recorded bad results.
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// The output directory could not be prepared.
    #[error("Job '{job_name}' could not start: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    /// Wrap a stage error with the job and stage names.
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }
}

/// Failure inside one stage.
#[derive(Error, Debug)]
pub enum StepError {
    /// A stage finished without the results it should have recorded.
    #[error("Invalid output: {0}")]
    InvalidOutput(String),

    /// An external command exited non-zero.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// Filesystem or process spawn failure.
    #[error("Failed {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// A file the stage reads is missing.
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// A descriptor file could not be read.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// The tag writer failed.
    #[error(transparent)]
    Tagging(#[from] TagError),

    /// The job is not in a state the stage can run in.
    #[error("Precondition not met: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    /// `message` is usually the tail of the tool's transcript.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// `operation` reads after "Failed", e.g. `creating image.log`.
    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

/// Result of a stage call.
pub type StepResult<T> = Result<T, StepError>;

/// Result of a pipeline run.
pub type PipelineResult<T> = Result<T, PipelineError>;
