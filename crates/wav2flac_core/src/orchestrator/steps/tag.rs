//! Tag step - rewrites the Vorbis comments of every track.
//!
//! The tag writer is lent `tagflac.log` for exactly the duration of the call.
//! The log is released on every exit path, so nothing written for one job can
//! end up in another job's log.

use super::{finish_stage_log, open_stage_log, require_output_dir, TAG_LOG};
use crate::logging::LineFormat;
use crate::models::{ConversionDictionary, TagList, TAGS_FILE};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome, TagOutput};
use crate::tagging::TagWriter;

/// Tag step backed by a [`TagWriter`].
pub struct TagStep {
    writer: Box<dyn TagWriter>,
}

impl TagStep {
    pub fn new(writer: Box<dyn TagWriter>) -> Self {
        Self { writer }
    }
}

impl PipelineStep for TagStep {
    fn name(&self) -> &str {
        "Tag"
    }

    fn description(&self) -> &str {
        "Apply tags to FLAC files"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let tags = ctx.job.input_file(TAGS_FILE);
        if !tags.is_file() {
            return Err(StepError::file_not_found(tags.display().to_string()));
        }

        require_output_dir(ctx)
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let tags = TagList::load(&ctx.job.input_file(TAGS_FILE))?;

        let dictionary_path = ctx.settings.tools.convert_config_path();
        let dictionary = ConversionDictionary::load_or_bundled(dictionary_path.as_deref())?;

        tracing::debug!(
            "Conversion dictionary: {} ({} entries)",
            dictionary_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "bundled".to_string()),
            dictionary.len()
        );

        let log = open_stage_log(ctx, TAG_LOG, LineFormat::Stamped)?;
        let applied = self
            .writer
            .apply(ctx.output_dir(), &tags, &dictionary, &log);

        if let Err(ref e) = applied {
            log.error(&e.to_string());
        }
        finish_stage_log(log)?;

        let report = applied?;

        tracing::info!(
            "Tagged {} file(s) with {} value(s)",
            report.files.len(),
            report.values_written
        );

        state.tags = Some(TagOutput {
            files: report.files,
            values_written: report.values_written,
            unknown_names: report.unknown_names,
            invalid_names: report.invalid_names,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.tags.is_none() {
            return Err(StepError::invalid_output("Tag results not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::StageLog;
    use crate::models::JobFlags;
    use crate::orchestrator::testing::*;
    use crate::tagging::{TagError, TagReport};
    use parking_lot::Mutex;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingWriter {
        calls: Arc<Mutex<Vec<(PathBuf, usize)>>>,
        fail: bool,
    }

    impl TagWriter for RecordingWriter {
        fn apply(
            &self,
            dir: &Path,
            tags: &TagList,
            _dictionary: &ConversionDictionary,
            log: &StageLog,
        ) -> Result<TagReport, TagError> {
            self.calls
                .lock()
                .push((dir.to_path_buf(), tags.assignments.len()));
            log.info("recording writer called");

            if self.fail {
                return Err(TagError::WriteFailed {
                    path: dir.join("01.flac"),
                    message: "disk full".to_string(),
                });
            }

            Ok(TagReport {
                files: vec![dir.join("01.flac")],
                values_written: 2,
                ..Default::default()
            })
        }
    }

    fn prepared_context(root: &Path) -> Context {
        let input = populated_input_dir(root, "album");
        let ctx = context_for(&input, JobFlags::default(), Settings::default());
        fs::create_dir_all(ctx.output_dir()).unwrap();
        ctx
    }

    #[test]
    fn lends_log_to_writer() {
        let root = tempdir().unwrap();
        let ctx = prepared_context(root.path());
        let writer = RecordingWriter::default();
        let calls = Arc::clone(&writer.calls);

        let step = TagStep::new(Box::new(writer));
        let mut state = JobState::new();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        assert_eq!(*calls.lock(), vec![(ctx.output_dir().to_path_buf(), 3)]);
        assert_eq!(state.tags.as_ref().unwrap().values_written, 2);

        let log = fs::read_to_string(ctx.job.output_file(TAG_LOG)).unwrap();
        assert!(log.contains("INFO:tagflac: recording writer called"));
    }

    #[test]
    fn writer_failure_still_closes_log() {
        let root = tempdir().unwrap();
        let ctx = prepared_context(root.path());
        let step = TagStep::new(Box::new(RecordingWriter {
            fail: true,
            ..Default::default()
        }));

        let err = step
            .execute(&ctx, &mut JobState::new())
            .unwrap_err();
        assert!(matches!(err, StepError::Tagging(_)));

        let log = fs::read_to_string(ctx.job.output_file(TAG_LOG)).unwrap();
        assert!(log.contains("recording writer called"));
        assert!(log.contains("ERROR:tagflac:"));
        assert!(log.contains("disk full"));
    }

    #[test]
    fn bad_tags_file_is_a_descriptor_error() {
        let root = tempdir().unwrap();
        let ctx = prepared_context(root.path());
        fs::write(ctx.job.input_file(TAGS_FILE), "just a string\n").unwrap();

        let err = TagStep::new(Box::new(RecordingWriter::default()))
            .execute(&ctx, &mut JobState::new())
            .unwrap_err();

        assert!(matches!(err, StepError::Descriptor(_)));
        assert!(!ctx.job.output_file(TAG_LOG).exists());
    }
}
