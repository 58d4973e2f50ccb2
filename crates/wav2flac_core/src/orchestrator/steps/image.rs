//! Image step - copies the cover referenced by `meta.yml` to `folder.<ext>`.

use std::fs;
use std::path::Path;

use super::{finish_stage_log, open_stage_log, require_output_dir, IMAGE_LOG};
use crate::logging::LineFormat;
use crate::models::{MetaDescriptor, META_FILE};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, ImageOutput, JobState, StepOutcome};
use crate::paths::relative_path;

/// Name of the cover image in the output directory.
///
/// Any case of `.jpg` or `.jpeg` becomes `folder.jpg`. Other extensions are
/// kept as written, and a name without one gives plain `folder`.
pub fn folder_file_name(image_name: &str) -> String {
    match Path::new(image_name).extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy();
            if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") {
                "folder.jpg".to_string()
            } else {
                format!("folder.{}", ext)
            }
        }
        None => "folder".to_string(),
    }
}

/// Image step for placing the cover next to the tracks.
pub struct ImageStep;

impl ImageStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for ImageStep {
    fn name(&self) -> &str {
        "Image"
    }

    fn description(&self) -> &str {
        "Copy the cover image"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        let meta = ctx.job.input_file(META_FILE);
        if !meta.is_file() {
            return Err(StepError::file_not_found(meta.display().to_string()));
        }

        require_output_dir(ctx)
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let meta = MetaDescriptor::load(&ctx.job.input_file(META_FILE))?;
        let log = open_stage_log(ctx, IMAGE_LOG, LineFormat::Raw)?;

        let Some(image) = meta.image_ref() else {
            log.info(&format!("No image reference found in {}", META_FILE));
            finish_stage_log(log)?;
            return Ok(StepOutcome::Skipped("no image reference".to_string()));
        };

        let source = ctx.job.input_file(&image.file_name);
        let destination = ctx.job.output_file(&folder_file_name(&image.file_name));

        log.info(&format!(
            "Copying {} to {}",
            relative_path(&source, ctx.output_dir()).display(),
            relative_path(&destination, ctx.output_dir()).display()
        ));

        if !source.is_file() {
            log.error(&format!("Image not found: {}", source.display()));
            finish_stage_log(log)?;
            return Err(StepError::file_not_found(source.display().to_string()));
        }

        if let Err(e) = fs::copy(&source, &destination) {
            let err = StepError::io_error(format!("copying {}", image.file_name), e);
            log.error(&err.to_string());
            finish_stage_log(log)?;
            return Err(err);
        }

        finish_stage_log(log)?;

        state.image = Some(ImageOutput {
            source,
            destination,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        match &state.image {
            Some(image) if image.destination.is_file() => Ok(()),
            Some(image) => Err(StepError::invalid_output(format!(
                "Cover image missing after copy: {}",
                image.destination.display()
            ))),
            None => Err(StepError::invalid_output("Image results not recorded")),
        }
    }
}
