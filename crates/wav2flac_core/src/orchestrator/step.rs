//! The contract every conversion stage implements.

use super::errors::StepResult;
use super::types::{Context, JobState, StepOutcome};

/// One stage of a conversion job.
///
/// For each job the [`Pipeline`](super::Pipeline) calls, in order:
///
/// 1. `validate_input` - refuse to start when inputs or the output
///    directory are missing
/// 2. `execute` - do the work, write the stage log, record results
/// 3. `validate_output` - only after `Success`; check what was recorded
///
/// An error from any of them fails the job and no later stage runs.
///
/// ```ignore
/// impl PipelineStep for ImageStep {
///     fn name(&self) -> &str { "Image" }
///
///     fn validate_input(&self, ctx: &Context) -> StepResult<()> {
///         require_output_dir(ctx)
///     }
///
///     fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
///         // copy cover.jpg to folder.jpg, write image.log
///         state.image = Some(ImageOutput { source, destination });
///         Ok(StepOutcome::Success)
///     }
///
///     fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
///         state.image.as_ref().map(|_| ()).ok_or_else(|| StepError::invalid_output("no image"))
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Short stage name used in errors and job results.
    fn name(&self) -> &str;

    /// Check preconditions. Must not write anything.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Run the stage.
    ///
    /// `StepOutcome::Skipped` means the stage had nothing to do, which does
    /// not fail the job.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome>;

    /// Check the results recorded in `state`.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Banner logged when the stage starts.
    fn description(&self) -> &str {
        self.name()
    }
}
