//! Configuration management for wav2flac.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Tool path overrides with `~` expansion
//! - Atomic file writes (write to temp, then rename)
//!
//! # Example
//!
//! ```no_run
//! use wav2flac_core::config::ConfigManager;
//!
//! // Load the user config, or defaults when none exists
//! let config = ConfigManager::load_default().unwrap();
//!
//! println!("Split tool: {}", config.settings().tools.shntool_path().display());
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{LoggingSettings, Settings, ToolSettings};
