//! Config manager for loading and saving settings.
//!
//! Key features:
//! - Explicit config files must exist and parse, or loading fails
//! - The per-user default file is optional
//! - Atomic writes (write to temp file, then rename)

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::settings::Settings;

/// Directory under the user config dir holding `config.toml`.
const APP_DIR: &str = "wav2flac";
/// Config file name.
const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to write config file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Holds the settings for a run and where they came from.
///
/// Loaded once at startup and shared read-only by every job.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Path to the config file, if one was read or is to be written.
    config_path: Option<PathBuf>,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager with default settings and no backing file.
    pub fn defaults() -> Self {
        Self {
            config_path: None,
            settings: Settings::default(),
        }
    }

    /// Create a manager that writes to `config_path`, starting from defaults.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(config_path.into()),
            settings: Settings::default(),
        }
    }

    /// Load config from an explicitly given file.
    ///
    /// Returns error if the file doesn't exist or doesn't parse.
    pub fn load(config_path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_path = config_path.into();

        if !config_path.exists() {
            return Err(ConfigError::NotFound(config_path));
        }

        let content = fs::read_to_string(&config_path).map_err(|source| {
            ConfigError::ReadError {
                path: config_path.clone(),
                source,
            }
        })?;

        let settings = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: config_path.clone(),
            source,
        })?;

        Ok(Self {
            config_path: Some(config_path),
            settings,
        })
    }

    /// Load the per-user config file if it exists, defaults otherwise.
    pub fn load_default() -> ConfigResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::defaults()),
        }
    }

    /// Location of the per-user config file (`<config dir>/wav2flac/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Get the config file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Changes made here are only in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the manager, returning the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Save the config atomically.
    ///
    /// Without a backing path this writes to [`ConfigManager::default_path`].
    pub fn save(&self) -> ConfigResult<PathBuf> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_path()
                .ok_or_else(|| ConfigError::NotFound(PathBuf::from(CONFIG_FILE)))?,
        };

        let content = self.generate_config_with_comments()?;
        atomic_write(&path, &content).map_err(|source| ConfigError::WriteError {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// Generate config content with helpful comments.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# wav2flac configuration\n\n");

        output.push_str("# External tools and the tag conversion dictionary.\n");
        output.push_str("# Paths may start with ~ for the home directory.\n");
        output.push_str("[tools]\n");
        for line in toml::to_string_pretty(&self.settings.tools)?.lines() {
            output.push_str(line);
            output.push('\n');
        }
        if self.settings.tools.convert_config.is_none() {
            output.push_str("# convert_config = \"~/convert.yml\"\n");
        }
        output.push('\n');

        output.push_str("# Process-wide log level (trace, debug, info, warn, error).\n");
        output.push_str("[logging]\n");
        for line in toml::to_string_pretty(&self.settings.logging)?.lines() {
            output.push_str(line);
            output.push('\n');
        }

        Ok(output)
    }
}

/// Write content to a file atomically.
///
/// Writes to a temp file in the same directory first, then renames.
fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("toml.tmp");

    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}
