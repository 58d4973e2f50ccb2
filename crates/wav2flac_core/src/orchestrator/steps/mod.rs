//! Pipeline step implementations.
//!
//! Each step handles one stage of a conversion job and writes its own log
//! file into the output directory.

mod image;
mod split;
mod tag;
mod verify;

pub use image::{folder_file_name, ImageStep};
pub use split::{detect_short_leading_track, SplitStep, SHORT_TRACK_WARNING};
pub use tag::TagStep;
pub use verify::VerifyStep;

/// Split stage log.
pub const SPLIT_LOG: &str = "shnsplit.log";
/// Image stage log.
pub const IMAGE_LOG: &str = "image.log";
/// Tag stage log.
pub const TAG_LOG: &str = "tagflac.log";
/// Verification stage log.
pub const VERIFY_LOG: &str = "metaflac.log";

use crate::logging::{LineFormat, StageLog};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::Context;

/// Create a stage log in the job's output directory.
fn open_stage_log(ctx: &Context, name: &str, format: LineFormat) -> StepResult<StageLog> {
    StageLog::create(ctx.job.output_file(name), format)
        .map_err(|e| StepError::io_error(format!("creating {}", name), e))
}

/// Close a stage log and normalize its line endings.
fn finish_stage_log(log: StageLog) -> StepResult<()> {
    let name = log.path().display().to_string();
    log.finish()
        .map_err(|e| StepError::io_error(format!("finishing {}", name), e))
}

/// The output directory must exist before any stage writes its log.
fn require_output_dir(ctx: &Context) -> StepResult<()> {
    if !ctx.output_dir().is_dir() {
        return Err(StepError::precondition_failed(format!(
            "Output directory does not exist: {}",
            ctx.output_dir().display()
        )));
    }
    Ok(())
}
