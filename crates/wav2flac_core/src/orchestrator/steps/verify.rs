//! Verify step - lists the final Vorbis comments with metaflac.
//!
//! Observational only: the listing goes to `metaflac.log` and the process-wide
//! log stream, and no file is changed.

use std::path::PathBuf;

use super::{finish_stage_log, open_stage_log, require_output_dir, VERIFY_LOG};
use crate::logging::{log_transcript, LineFormat};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome, VerifyOutput};
use crate::tagging::list_flac_files;
use crate::tools::ToolRunner;

/// Transcript lines kept in a failure message.
const ERROR_TAIL_LINES: usize = 5;

/// Verify step for the comment listing.
pub struct VerifyStep;

impl VerifyStep {
    pub fn new() -> Self {
        Self
    }

    /// `metaflac` arguments listing only the comment block of `files`.
    fn build_args(files: &[String]) -> Vec<String> {
        let mut args = vec![
            "--list".to_string(),
            "--block-type=VORBIS_COMMENT".to_string(),
        ];
        args.extend(files.iter().cloned());
        args
    }
}

impl Default for VerifyStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for VerifyStep {
    fn name(&self) -> &str {
        "Verify"
    }

    fn description(&self) -> &str {
        "List tags of the finished tracks"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        require_output_dir(ctx)
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let files = list_flac_files(ctx.output_dir())
            .map_err(|e| StepError::io_error("listing FLAC files", e))?;

        let log = open_stage_log(ctx, VERIFY_LOG, LineFormat::Raw)?;

        if files.is_empty() {
            log.warn(&format!("No FLAC files in {}", ctx.output_dir().display()));
            finish_stage_log(log)?;
            return Ok(StepOutcome::Skipped("no FLAC files".to_string()));
        }

        // The tool runs in the output directory, so bare file names suffice.
        let names: Vec<String> = files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();

        let runner = ToolRunner::new(ctx.settings.tools.metaflac_path());
        let output = runner
            .run(&Self::build_args(&names), ctx.output_dir())
            .map_err(|e| StepError::io_error(format!("running {}", runner.name()), e))?;

        log_transcript(&runner.name(), &output.transcript);
        log.write_raw(&output.transcript)
            .map_err(|e| StepError::io_error(format!("writing {}", VERIFY_LOG), e))?;
        finish_stage_log(log)?;

        if !output.success() {
            return Err(StepError::command_failed(
                runner.name(),
                output.exit_code,
                output.tail(ERROR_TAIL_LINES),
            ));
        }

        state.verify = Some(VerifyOutput {
            files: names.into_iter().map(PathBuf::from).collect(),
            exit_code: output.exit_code,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.verify.is_none() {
            return Err(StepError::invalid_output("Verify results not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobFlags;
    use crate::orchestrator::testing::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn args_request_comment_block_only() {
        let args = VerifyStep::build_args(&["01.flac".to_string(), "02.flac".to_string()]);
        assert_eq!(
            args,
            vec!["--list", "--block-type=VORBIS_COMMENT", "01.flac", "02.flac"]
        );
    }

    #[test]
    fn no_flac_files_skips_without_running_tool() {
        let root = tempdir().unwrap();
        let input = populated_input_dir(root.path(), "album");
        let ctx = context_for(
            &input,
            JobFlags::default(),
            settings_with_tools(Path::new("shntool"), &root.path().join("no-such-tool")),
        );
        fs::create_dir_all(ctx.output_dir()).unwrap();

        let mut state = JobState::new();
        let outcome = VerifyStep::new().execute(&ctx, &mut state).unwrap();

        assert!(matches!(outcome, StepOutcome::Skipped(_)));
        assert!(state.verify.is_none());
        let log = fs::read_to_string(ctx.job.output_file(VERIFY_LOG)).unwrap();
        assert!(log.contains("No FLAC files"));
    }

    #[cfg(unix)]
    #[test]
    fn lists_sorted_files_and_normalizes_log() {
        let root = tempdir().unwrap();
        let input = populated_input_dir(root.path(), "album");
        let metaflac = fake_tool(root.path(), "metaflac", FAKE_METAFLAC);
        let ctx = context_for(
            &input,
            JobFlags::default(),
            settings_with_tools(Path::new("shntool"), &metaflac),
        );
        fs::create_dir_all(ctx.output_dir()).unwrap();
        for name in ["02.flac", "01.flac", "folder.jpg"] {
            fs::write(ctx.job.output_file(name), b"").unwrap();
        }

        let step = VerifyStep::new();
        let mut state = JobState::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        assert_eq!(
            state.verify.as_ref().unwrap().files,
            vec![PathBuf::from("01.flac"), PathBuf::from("02.flac")]
        );

        let log = fs::read_to_string(ctx.job.output_file(VERIFY_LOG)).unwrap();
        assert_eq!(
            log,
            "01.flac:  comment[0]: TITLE=x\n02.flac:  comment[0]: TITLE=x\n"
        );
    }
}
