//! Runs the stages of one job in order.

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};

/// Ordered stages of a conversion job.
///
/// The first stage that fails ends the job; stages after it do not run.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a stage.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append a stage, builder style.
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run every stage for the job in `ctx`, recording results in `state`.
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        for step in &self.steps {
            let step_name = step.name();
            tracing::info!("=== {} ===", step.description());

            if let Err(e) = step.validate_input(ctx) {
                tracing::error!("{} cannot run: {}", step_name, e);
                return Err(PipelineError::step_failed(ctx.job_name(), step_name, e));
            }

            let outcome = step.execute(ctx, state).map_err(|e| {
                tracing::error!("{} failed: {}", step_name, e);
                PipelineError::step_failed(ctx.job_name(), step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    if let Err(e) = step.validate_output(ctx, state) {
                        tracing::error!("{} left bad results: {}", step_name, e);
                        return Err(PipelineError::step_failed(ctx.job_name(), step_name, e));
                    }

                    tracing::info!("{} completed", step_name);
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    tracing::info!("{} skipped: {}", step_name, reason);
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        Ok(result)
    }

    /// Number of stages.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Stage names in run order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Which stages ran and which skipped themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::models::{ConversionJob, JobFlags};
    use crate::orchestrator::errors::StepError;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        outcome: Result<StepOutcome, &'static str>,
    }

    impl CountingStep {
        fn new(name: &'static str, counter: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                execute_count: Arc::clone(counter),
                outcome: Ok(StepOutcome::Success),
            }
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<StepOutcome, StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .map_err(StepError::precondition_failed)
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn context() -> Context {
        let job = ConversionJob::new(PathBuf::from("/rips/wav/album"), None, JobFlags::default());
        Context::new(job, Arc::new(Settings::default()))
    }

    #[test]
    fn lists_stages_in_order() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .with_step(CountingStep::new("Split", &counter))
            .with_step(CountingStep::new("Image", &counter));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Split", "Image"]);
    }

    #[test]
    fn runs_steps_in_order_and_records_skips() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut skipping = CountingStep::new("Split", &counter);
        skipping.outcome = Ok(StepOutcome::Skipped("no-convert".to_string()));

        let pipeline = Pipeline::new()
            .with_step(skipping)
            .with_step(CountingStep::new("Image", &counter));

        let result = pipeline.run(&context(), &mut JobState::new()).unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(result.steps_skipped, vec!["Split"]);
        assert_eq!(result.steps_completed, vec!["Image"]);
    }

    #[test]
    fn failure_stops_later_steps() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut failing = CountingStep::new("Image", &counter);
        failing.outcome = Err("broken");

        let pipeline = Pipeline::new()
            .with_step(failing)
            .with_step(CountingStep::new("Tag", &counter));

        let err = pipeline.run(&context(), &mut JobState::new()).unwrap_err();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("'Image'"));
    }
}
