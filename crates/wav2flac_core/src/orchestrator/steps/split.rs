//! Split step - cuts the rip into per-track FLAC files with shntool.
//!
//! The tool runs inside the output directory with every path passed relative
//! to it. Its interleaved output is cleaned of backspace progress updates and
//! kept in `shnsplit.log`.

use std::fs;
use std::io;

use super::{finish_stage_log, open_stage_log, require_output_dir, SPLIT_LOG};
use crate::logging::{collapse_backspaces, log_transcript, LineFormat, StageLog};
use crate::models::{CUE_FILE, WAV_FILE};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, SplitOutput, StepOutcome};
use crate::paths::relative_path;
use crate::tagging::list_flac_files;
use crate::tools::ToolRunner;

/// Warning shntool prints when the pregap before track 1 becomes its own file.
pub const SHORT_TRACK_WARNING: &str = "warning: file 1 will be too short to be burned";

/// File shntool writes the pregap to.
const SHORT_TRACK_FILE: &str = "00.flac";

/// Transcript lines kept in a failure message.
const ERROR_TAIL_LINES: usize = 5;

/// Whether the split tool reported a leading track too short to keep.
///
/// shntool has no structured signal for this; the transcript is searched for
/// its warning text.
pub fn detect_short_leading_track(transcript: &str) -> bool {
    transcript.contains(SHORT_TRACK_WARNING)
}

/// Split step for cue-driven splitting.
pub struct SplitStep;

impl SplitStep {
    pub fn new() -> Self {
        Self
    }

    /// Arguments for `shntool split`, relative to the output directory.
    fn build_args(ctx: &Context) -> Vec<String> {
        let out = ctx.output_dir();
        let rel = |name: &str| {
            relative_path(&ctx.job.input_file(name), out)
                .display()
                .to_string()
        };

        vec![
            "split".to_string(),
            "-O".to_string(),
            "always".to_string(),
            "-d".to_string(),
            relative_path(out, out).display().to_string(),
            "-o".to_string(),
            "flac".to_string(),
            "-f".to_string(),
            rel(CUE_FILE),
            "-t".to_string(),
            "%n".to_string(),
            rel(WAV_FILE),
        ]
    }

    /// Delete the pregap file and note it in the log.
    fn remove_short_track(ctx: &Context, log: &StageLog) -> StepResult<()> {
        log.info(&format!("Removing {}", SHORT_TRACK_FILE));

        match fs::remove_file(ctx.job.output_file(SHORT_TRACK_FILE)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log.warn(&format!("{} was not created", SHORT_TRACK_FILE));
                Ok(())
            }
            Err(e) => Err(StepError::io_error(
                format!("removing {}", SHORT_TRACK_FILE),
                e,
            )),
        }
    }
}

impl Default for SplitStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for SplitStep {
    fn name(&self) -> &str {
        "Split"
    }

    fn description(&self) -> &str {
        "Split the rip into per-track FLAC files"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.job.flags.no_convert {
            return Ok(());
        }

        for name in [WAV_FILE, CUE_FILE] {
            let path = ctx.job.input_file(name);
            if !path.is_file() {
                return Err(StepError::file_not_found(path.display().to_string()));
            }
        }

        require_output_dir(ctx)
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        if ctx.job.flags.no_convert {
            return Ok(StepOutcome::Skipped("conversion disabled".to_string()));
        }

        let runner = ToolRunner::new(ctx.settings.tools.shntool_path());
        let args = Self::build_args(ctx);

        tracing::info!(
            "Splitting {} using {}",
            ctx.job.input_file(WAV_FILE).display(),
            runner.name()
        );

        let log = open_stage_log(ctx, SPLIT_LOG, LineFormat::Raw)?;

        let output = match runner.run(&args, ctx.output_dir()) {
            Ok(output) => output,
            Err(e) => {
                let err = StepError::io_error(format!("running {}", runner.name()), e);
                log.error(&err.to_string());
                finish_stage_log(log)?;
                return Err(err);
            }
        };

        let transcript = collapse_backspaces(&output.transcript);

        log.write_raw(&transcript)
            .map_err(|e| StepError::io_error(format!("writing {}", SPLIT_LOG), e))?;
        log_transcript(&runner.name(), &transcript);

        let removed_short_track = detect_short_leading_track(&transcript);
        if removed_short_track {
            Self::remove_short_track(ctx, &log)?;
        }

        let log_path = log.path().to_path_buf();
        finish_stage_log(log)?;

        if !output.success() {
            return Err(StepError::command_failed(
                runner.name(),
                output.exit_code,
                output.tail(ERROR_TAIL_LINES),
            ));
        }

        let tracks = list_flac_files(ctx.output_dir())
            .map_err(|e| StepError::io_error("listing split tracks", e))?;

        tracing::info!("Split into {} track(s)", tracks.len());

        state.split = Some(SplitOutput {
            tracks,
            removed_short_track,
            exit_code: output.exit_code,
            log_path,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let split = state
            .split
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Split results not recorded"))?;

        if split.tracks.is_empty() {
            return Err(StepError::invalid_output("Split produced no FLAC files"));
        }

        Ok(())
    }
}
