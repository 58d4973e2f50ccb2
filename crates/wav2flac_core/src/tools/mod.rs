//! External tool execution.
//!
//! The split tool and the metadata tool are opaque executables. This module
//! runs them synchronously and hands back their exit code and transcript.

mod runner;

pub use runner::{ToolOutput, ToolRunner};
