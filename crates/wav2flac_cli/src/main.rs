//! Batch conversion of WAV+CUE rips into tagged per-track FLAC files.
//!
//! Each input directory holds `a.wav`, `a.cue`, `meta.yml` and `tags.yml`.
//! The tracks, the cover image and the stage logs are written to the output
//! directory, which by default is the input directory with its last `wav`
//! segment replaced by `flac`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use wav2flac_core::config::ConfigManager;
use wav2flac_core::logging::{init_tracing, LogLevel};
use wav2flac_core::models::{ConversionJob, JobFlags};
use wav2flac_core::orchestrator::{JobOutcome, JobRunner};
use wav2flac_core::tagging::FlacTagWriter;

const VERSION: &str = match option_env!("WAV2FLAC_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Batch convert WAV+CUE rips into tagged FLAC tracks.
#[derive(Parser, Debug)]
#[command(author, about, max_term_width = 80, version = VERSION)]
struct Opts {
    /// Input directories, processed in order.
    #[arg(value_name = "INDIR", required_unless_present = "write_config")]
    indirs: Vec<PathBuf>,

    /// Output directory. Only valid with a single input directory.
    #[arg(long, value_name = "OUTDIR")]
    outdir: Option<PathBuf>,

    /// Configuration file. Defaults to the per-user config file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Do not split; only copy the cover, tag and list existing tracks.
    #[arg(long)]
    no_convert: bool,

    /// Skip input directories whose output directory already exists.
    #[arg(long)]
    no_overwrite: bool,

    /// More log output. Repeat for trace output.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Less log output. Repeat to show errors only.
    #[arg(short, long, action = clap::ArgAction::Count)]
    quiet: u8,

    /// Write the effective configuration to the config file and exit.
    #[arg(long)]
    write_config: bool,
}

impl Opts {
    fn log_level(&self, configured: LogLevel) -> LogLevel {
        match (self.verbose, self.quiet) {
            (0, 0) => configured,
            (1, _) => LogLevel::Debug,
            (_, 0) => LogLevel::Trace,
            (_, 1) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}

fn load_config(opts: &Opts) -> Result<ConfigManager> {
    match &opts.config {
        Some(path) => ConfigManager::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => ConfigManager::load_default().context("Failed to load configuration"),
    }
}

fn main() -> Result<ExitCode> {
    let opts = Opts::parse();
    let config = load_config(&opts)?;

    if opts.write_config {
        let path = config.save().context("Failed to write configuration")?;
        println!("{}", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    init_tracing(opts.log_level(config.settings().logging.level));
    tracing::debug!("wav2flac {}", VERSION);

    if let Some(path) = config.path() {
        tracing::info!("Using configuration {}", path.display());
    }

    let flags = JobFlags {
        no_convert: opts.no_convert,
        no_overwrite: opts.no_overwrite,
    };

    let jobs = ConversionJob::plan(&opts.indirs, opts.outdir.as_deref(), flags)?;

    let runner = JobRunner::new(config.into_settings(), Box::new(FlacTagWriter::new()));
    let summary = runner.process_all(&jobs);

    for result in &summary.results {
        if let JobOutcome::Failed(message) = &result.outcome {
            eprintln!("{}: {}", result.input_dir.display(), message);
        }
    }

    if summary.any_failed() {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
