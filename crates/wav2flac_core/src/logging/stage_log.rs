//! Per-stage log file.
//!
//! Each pipeline stage gets its own log file in the output directory that:
//! - Is created (truncated) when the stage starts
//! - Receives raw tool transcripts and/or formatted lines
//! - Is finalized by flushing, closing and stripping carriage returns
//!
//! A `StageLog` that is dropped without [`StageLog::finish`] still flushes
//! and closes its file, so error paths never leak an open handle.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::normalize::strip_carriage_returns;
use super::types::{LineFormat, LogLevel};

/// Log file for a single stage of a single job.
pub struct StageLog {
    /// Short name used in stamped lines and tracing events.
    name: String,
    /// Path to log file.
    path: PathBuf,
    /// File writer (buffered). `None` once closed.
    writer: Mutex<Option<BufWriter<File>>>,
    /// How `log` lines are rendered.
    format: LineFormat,
}

impl StageLog {
    /// Create the log file at `path`, truncating any previous content.
    ///
    /// The log's name is the file stem (`tagflac` for `tagflac.log`).
    pub fn create(path: impl AsRef<Path>, format: LineFormat) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stage".to_string());

        let file = File::create(&path)?;

        Ok(Self {
            name,
            path,
            writer: Mutex::new(Some(BufWriter::new(file))),
            format,
        })
    }

    /// Get the log name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append text exactly as given.
    pub fn write_raw(&self, text: &str) -> io::Result<()> {
        match *self.writer.lock() {
            Some(ref mut writer) => writer.write_all(text.as_bytes()),
            None => Err(closed_error(&self.path)),
        }
    }

    /// Log a line at the given level.
    ///
    /// The line is also forwarded to `tracing`. Write failures are ignored
    /// here and surface from [`StageLog::finish`].
    pub fn log(&self, level: LogLevel, message: &str) {
        forward_to_tracing(&self.name, level, message);

        let line = match self.format {
            LineFormat::Raw => format!("{}\n", message),
            LineFormat::Stamped => format!(
                "[{}] {}:{}: {}\n",
                Local::now().format("%H:%M:%S"),
                level,
                self.name,
                message
            ),
        };

        let _ = self.write_raw(&line);
    }

    /// Log an info line.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug line.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning line.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Log an error line.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    /// Flush and close the file, then normalize its line endings.
    pub fn finish(self) -> io::Result<()> {
        self.close()?;
        strip_carriage_returns(&self.path)
    }

    /// Flush and close the file. Later writes fail.
    fn close(&self) -> io::Result<()> {
        match self.writer.lock().take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for StageLog {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn forward_to_tracing(name: &str, level: LogLevel, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!(log = name, "{}", message),
        LogLevel::Debug => tracing::debug!(log = name, "{}", message),
        LogLevel::Info => tracing::info!(log = name, "{}", message),
        LogLevel::Warn => tracing::warn!(log = name, "{}", message),
        LogLevel::Error => tracing::error!(log = name, "{}", message),
    }
}

fn closed_error(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("stage log already closed: {}", path.display()),
    )
}
