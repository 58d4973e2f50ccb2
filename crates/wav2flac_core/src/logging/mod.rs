//! Logging infrastructure for wav2flac.
//!
//! This module provides:
//! - Per-stage log files (`shnsplit.log`, `image.log`, `tagflac.log`,
//!   `metaflac.log`) through [`StageLog`]
//! - Cleanup of captured tool output (backspace erasure, CR stripping)
//! - Integration with the `tracing` ecosystem for the process-wide stream
//!
//! # Example
//!
//! ```no_run
//! use wav2flac_core::logging::{LineFormat, StageLog};
//!
//! let log = StageLog::create("/music/flac/album/image.log", LineFormat::Raw).unwrap();
//! log.write_raw("Copying ../cover.jpg to folder.jpg\n").unwrap();
//! log.finish().unwrap();
//! ```

mod normalize;
mod stage_log;
mod types;

pub use normalize::{collapse_backspaces, strip_carriage_returns};
pub use stage_log::StageLog;
pub use types::{LineFormat, LogLevel};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for process-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Emit captured tool output to the process-wide stream, one event per line.
pub fn log_transcript(tool: &str, transcript: &str) {
    for line in transcript.lines() {
        tracing::info!(tool, "> {}", line);
    }
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
