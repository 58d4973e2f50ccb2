//! wav2flac core - backend logic for converting audio rips.
//!
//! This crate contains the per-directory conversion pipeline: splitting a
//! WAV+CUE pair into FLAC tracks, placing cover art, applying tags and
//! listing the resulting metadata for audit. It has no CLI dependencies.

pub mod config;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod paths;
pub mod tagging;
pub mod tools;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
