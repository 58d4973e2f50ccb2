//! Command runner for external process execution.

use std::ffi::OsStr;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Standard output and standard error, interleaved as written.
    pub transcript: String,
}

impl ToolOutput {
    /// Whether the tool exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// The last `lines` lines of the transcript.
    pub fn tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.transcript.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// Runs one external tool.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    /// Executable path or name looked up on `PATH`.
    program: PathBuf,
}

impl ToolRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Short tool name for messages (`shntool` for `/usr/bin/shntool`).
    pub fn name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Render a command line for logging.
    pub fn command_line<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        let mut line = self.program.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.as_ref().to_string_lossy());
        }
        line
    }

    /// Run the tool in `cwd` and wait for it to exit.
    ///
    /// Both output streams are redirected into one anonymous temp file so the
    /// transcript keeps their relative order. A non-zero exit is not an error
    /// here; callers decide what it means.
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> io::Result<ToolOutput> {
        let mut capture = tempfile::tempfile()?;

        tracing::debug!("Running: {} (in {})", self.command_line(args), cwd.display());

        let status = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(capture.try_clone()?)
            .stderr(capture.try_clone()?)
            .status()
            .map_err(|e| {
                io::Error::new(
                    e.kind(),
                    format!("failed to run {}: {}", self.program.display(), e),
                )
            })?;

        capture.seek(SeekFrom::Start(0))?;
        let mut raw = Vec::new();
        capture.read_to_end(&mut raw)?;

        Ok(ToolOutput {
            exit_code: status.code().unwrap_or(-1),
            transcript: String::from_utf8_lossy(&raw).into_owned(),
        })
    }
}
