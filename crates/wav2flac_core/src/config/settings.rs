//! Settings struct with TOML-based sections.
//!
//! Every key is optional; missing keys and sections take their defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;
use crate::paths::expand_home;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// External tool and data file locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// External tool paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Split tool executable.
    #[serde(default = "default_shntool")]
    pub shntool: String,

    /// Metadata inspection tool executable.
    #[serde(default = "default_metaflac")]
    pub metaflac: String,

    /// Tag conversion dictionary. The bundled sample is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert_config: Option<String>,
}

fn default_shntool() -> String {
    "shntool".to_string()
}

fn default_metaflac() -> String {
    "metaflac".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            shntool: default_shntool(),
            metaflac: default_metaflac(),
            convert_config: None,
        }
    }
}

impl ToolSettings {
    /// Split tool path with `~` expanded.
    pub fn shntool_path(&self) -> PathBuf {
        expand_home(&self.shntool)
    }

    /// Metadata tool path with `~` expanded.
    pub fn metaflac_path(&self) -> PathBuf {
        expand_home(&self.metaflac)
    }

    /// Conversion dictionary path with `~` expanded, if configured.
    pub fn convert_config_path(&self) -> Option<PathBuf> {
        self.convert_config.as_deref().map(expand_home)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level for the process-wide log stream.
    #[serde(default)]
    pub level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[tools]"));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains("shntool = \"shntool\""));
        assert!(!toml.contains("convert_config"));
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.tools.convert_config = Some("~/convert.yml".to_string());
        settings.logging.level = LogLevel::Debug;

        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[tools]\nmetaflac = \"/opt/flac/bin/metaflac\"";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        // Custom value preserved
        assert_eq!(parsed.tools.metaflac, "/opt/flac/bin/metaflac");
        // Defaults applied for missing
        assert_eq!(parsed.tools.shntool, "shntool");
        assert_eq!(parsed.tools.convert_config, None);
        assert_eq!(parsed.logging.level, LogLevel::Info);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let parsed: Settings = toml::from_str("").unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn tool_paths_expand_home() {
        let tools = ToolSettings {
            shntool: "~/bin/shntool".to_string(),
            ..Default::default()
        };

        if let Some(home) = dirs::home_dir() {
            assert_eq!(tools.shntool_path(), home.join("bin/shntool"));
        }
        assert_eq!(tools.metaflac_path(), PathBuf::from("metaflac"));
        assert!(tools.convert_config_path().is_none());
    }
}
