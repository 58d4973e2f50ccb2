//! Job runner for processing the input directories of one run.
//!
//! This module provides the `JobRunner`, which checks each job's
//! preconditions, prepares its output directory and runs it through the
//! pipeline. A failing job is reported and the remaining jobs still run.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::models::{ConversionJob, SkipReason};
use crate::tagging::TagWriter;

use super::errors::PipelineError;
use super::pipeline::{Pipeline, PipelineRunResult};
use super::types::{Context, JobState};
use super::create_standard_pipeline;

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every step ran to completion or was skipped by the step itself.
    Completed {
        steps_completed: Vec<String>,
        steps_skipped: Vec<String>,
    },
    /// The job was not started.
    Skipped(SkipReason),
    /// A step failed; later steps did not run.
    Failed(String),
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    /// Job name (input directory's last segment).
    pub job_name: String,
    /// Input directory.
    pub input_dir: PathBuf,
    /// Output directory.
    pub output_dir: PathBuf,
    /// How the job ended.
    pub outcome: JobOutcome,
}

impl JobResult {
    fn new(job: &ConversionJob, outcome: JobOutcome) -> Self {
        Self {
            job_name: job.name.clone(),
            input_dir: job.input_dir.clone(),
            output_dir: job.output_dir.clone(),
            outcome,
        }
    }

    /// Create a completed result.
    pub fn completed(job: &ConversionJob, run_result: PipelineRunResult) -> Self {
        Self::new(
            job,
            JobOutcome::Completed {
                steps_completed: run_result.steps_completed,
                steps_skipped: run_result.steps_skipped,
            },
        )
    }

    /// Create a skipped result.
    pub fn skipped(job: &ConversionJob, reason: SkipReason) -> Self {
        Self::new(job, JobOutcome::Skipped(reason))
    }

    /// Create a failed result.
    pub fn failure(job: &ConversionJob, error: impl Into<String>) -> Self {
        Self::new(job, JobOutcome::Failed(error.into()))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, JobOutcome::Skipped(_))
    }
}

/// Results of every job in a run, in input order.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub results: Vec<JobResult>,
}

impl RunSummary {
    /// Jobs that ran to the end.
    pub fn completed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, JobOutcome::Completed { .. }))
            .count()
    }

    /// Jobs that were not started.
    pub fn skipped(&self) -> usize {
        self.results.iter().filter(|r| r.is_skipped()).count()
    }

    /// Jobs that failed.
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    /// Whether any job failed. Skips do not count.
    pub fn any_failed(&self) -> bool {
        self.results.iter().any(JobResult::is_failed)
    }
}

/// Runs conversion jobs through the pipeline, one at a time.
///
/// # Example
///
/// ```ignore
/// let runner = JobRunner::new(settings, Box::new(FlacTagWriter::new()));
/// let summary = runner.process_all(&jobs);
/// ```
pub struct JobRunner {
    /// Settings shared by every job.
    settings: Arc<Settings>,
    /// Pipeline each job runs through.
    pipeline: Pipeline,
}

impl JobRunner {
    /// Create a runner with the standard pipeline.
    pub fn new(settings: Settings, tag_writer: Box<dyn TagWriter>) -> Self {
        Self::with_pipeline(settings, create_standard_pipeline(tag_writer))
    }

    /// Create a runner with a custom pipeline.
    pub fn with_pipeline(settings: Settings, pipeline: Pipeline) -> Self {
        Self {
            settings: Arc::new(settings),
            pipeline,
        }
    }

    /// Decide whether a job may start.
    ///
    /// Required files are checked first, in order; the first missing one
    /// skips the job. With `no_overwrite`, an existing output directory also
    /// skips it. Nothing is written either way.
    pub fn check(job: &ConversionJob) -> Option<SkipReason> {
        if let Some(missing) = job.missing_files().first() {
            return Some(SkipReason::MissingFile((*missing).to_string()));
        }

        if job.flags.no_overwrite && job.output_dir.is_dir() {
            return Some(SkipReason::OutputExists(job.output_dir.clone()));
        }

        None
    }

    /// Process a single job.
    pub fn process_job(&self, job: &ConversionJob) -> JobResult {
        let _span = tracing::info_span!("job", name = %job.name).entered();

        if let Some(reason) = Self::check(job) {
            tracing::warn!("{}; Skip {}", reason, job.input_dir.display());
            return JobResult::skipped(job, reason);
        }

        if !job.flags.no_convert {
            if let Err(e) = std::fs::create_dir_all(&job.output_dir) {
                let err = PipelineError::setup_failed(
                    &job.name,
                    format!(
                        "Failed to create output directory {}: {}",
                        job.output_dir.display(),
                        e
                    ),
                );
                tracing::error!("{}", err);
                return JobResult::failure(job, err.to_string());
            }
        }

        tracing::info!(
            "Starting job: {} -> {}",
            job.input_dir.display(),
            job.output_dir.display()
        );

        let ctx = Context::new(job.clone(), Arc::clone(&self.settings));
        let mut state = JobState::new();

        match self.pipeline.run(&ctx, &mut state) {
            Ok(run_result) => {
                tracing::info!("Job completed: {}", job.output_dir.display());
                JobResult::completed(job, run_result)
            }
            Err(e) => {
                tracing::error!("{}", e);
                JobResult::failure(job, e.to_string())
            }
        }
    }

    /// Process jobs sequentially, in order.
    pub fn process_all(&self, jobs: &[ConversionJob]) -> RunSummary {
        let mut summary = RunSummary {
            results: Vec::with_capacity(jobs.len()),
        };

        for (i, job) in jobs.iter().enumerate() {
            tracing::info!("Processing job {}/{}: {}", i + 1, jobs.len(), job.name);
            summary.results.push(self.process_job(job));
        }

        tracing::info!(
            "Run finished: {} completed, {} skipped, {} failed",
            summary.completed(),
            summary.skipped(),
            summary.failed()
        );

        summary
    }
}
