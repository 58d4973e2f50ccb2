//! Job-related data structures.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::paths::{derive_output_dir, normalize_lexically, resolve_input_dir};

/// Rip audio file, split by the cue sheet.
pub const WAV_FILE: &str = "a.wav";
/// Cue sheet describing the track boundaries.
pub const CUE_FILE: &str = "a.cue";
/// Metadata descriptor (cover image reference).
pub const META_FILE: &str = "meta.yml";
/// Tag descriptor.
pub const TAGS_FILE: &str = "tags.yml";

/// Files that must exist in an input directory before any stage runs.
pub fn required_files(no_convert: bool) -> Vec<&'static str> {
    let mut files = vec![META_FILE, TAGS_FILE];
    if !no_convert {
        files.extend([CUE_FILE, WAV_FILE]);
    }
    files
}

/// Behaviour switches shared by every job of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobFlags {
    /// Skip splitting; only place the image, tag and verify.
    pub no_convert: bool,
    /// Skip a job whose output directory already exists.
    pub no_overwrite: bool,
}

/// One input directory and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Job name for logs (the input directory's last segment).
    pub name: String,
    /// Absolute input directory.
    pub input_dir: PathBuf,
    /// Output directory, fixed for the lifetime of the job.
    pub output_dir: PathBuf,
    /// Run flags.
    pub flags: JobFlags,
}

impl ConversionJob {
    /// Create a job, deriving the output directory unless one is given.
    ///
    /// `.` and `..` segments are collapsed in both directories first.
    pub fn new(input_dir: PathBuf, output_dir: Option<PathBuf>, flags: JobFlags) -> Self {
        let input_dir = normalize_lexically(&input_dir);
        let output_dir = match output_dir {
            Some(dir) => normalize_lexically(&dir),
            None => derive_output_dir(&input_dir),
        };
        let name = input_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input_dir.display().to_string());

        Self {
            name,
            input_dir,
            output_dir,
            flags,
        }
    }

    /// Build the jobs for one run.
    ///
    /// Input directories are `~`-expanded and made absolute. An explicit
    /// output directory is only accepted with exactly one input directory.
    pub fn plan(
        input_dirs: &[PathBuf],
        output_dir: Option<&Path>,
        flags: JobFlags,
    ) -> Result<Vec<Self>, JobError> {
        if input_dirs.is_empty() {
            return Err(JobError::NoInputs);
        }

        if output_dir.is_some() && input_dirs.len() > 1 {
            return Err(JobError::OutputDirWithMultipleInputs {
                count: input_dirs.len(),
            });
        }

        let output_dir = output_dir
            .map(|dir| {
                resolve_input_dir(dir).map_err(|source| JobError::InvalidPath {
                    path: dir.to_path_buf(),
                    source,
                })
            })
            .transpose()?;

        input_dirs
            .iter()
            .map(|dir| {
                let input_dir = resolve_input_dir(dir).map_err(|source| JobError::InvalidPath {
                    path: dir.clone(),
                    source,
                })?;
                Ok(Self::new(input_dir, output_dir.clone(), flags))
            })
            .collect()
    }

    /// Path to a file in the input directory.
    pub fn input_file(&self, name: &str) -> PathBuf {
        self.input_dir.join(name)
    }

    /// Path to a file in the output directory.
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Required input files that are missing, in check order.
    pub fn missing_files(&self) -> Vec<&'static str> {
        required_files(self.flags.no_convert)
            .into_iter()
            .filter(|name| !self.input_file(name).is_file())
            .collect()
    }
}

/// Why a job was skipped before any stage ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required input file is missing.
    MissingFile(String),
    /// The output directory exists and overwriting is disabled.
    OutputExists(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingFile(name) => write!(f, "File not found: {}", name),
            SkipReason::OutputExists(dir) => {
                write!(f, "Output directory already exists: {}", dir.display())
            }
        }
    }
}

/// Errors while setting up the jobs of a run.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("No input directories given")]
    NoInputs,

    #[error(
        "An output directory was given with {count} input directories (only one input directory may be given)"
    )]
    OutputDirWithMultipleInputs { count: usize },

    #[error("Invalid path {path}: {source}")]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
