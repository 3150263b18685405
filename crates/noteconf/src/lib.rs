//! Configuration loading for notewise.
//!
//! notewise decodes MIDI events against three lookup tables (channel names,
//! control-change codes, key signatures). Every table ships compiled into
//! the library; this crate only decides whether a table is overridden by a
//! file on disk, where the clef boundary sits, and how chatty logging is.
//!
//! # Usage
//!
//! ```rust,no_run
//! use noteconf::NoteConfig;
//!
//! let config = NoteConfig::load().expect("Failed to load config");
//! println!("Treble clef starts at key {}", config.notation.treble_switch);
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/notewise/config.toml` (system)
//! 2. `~/.config/notewise/config.toml` (user)
//! 3. `./notewise.toml` (local override, or an explicit path)
//! 4. Environment variables (`NOTEWISE_*`)
//!
//! # Example Config
//!
//! ```toml
//! [tables]
//! channels = "~/midi/req/MIDI_Channels.txt"
//! key_signatures = "/usr/share/notewise/key_signatures.txt"
//!
//! [notation]
//! treble_switch = 60
//!
//! [logging]
//! level = "notewise=debug"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigLayer, ConfigSources};
pub use sections::{LoggingConfig, NotationConfig, TablesConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Complete notewise configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteConfig {
    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub notation: NotationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NoteConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    ///
    /// If `config_path` is provided, it takes precedence over the local
    /// `./notewise.toml` override. System and user configs still load first.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = NoteConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let layer = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, layer);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# notewise configuration\n\n");

        output.push_str("[tables]\n");
        let tables = [
            ("channels", &self.tables.channels),
            ("control_changes", &self.tables.control_changes),
            ("key_signatures", &self.tables.key_signatures),
        ];
        for (name, path) in tables {
            match path {
                Some(path) => output.push_str(&format!("{} = \"{}\"\n", name, path.display())),
                None => output.push_str(&format!("# {} = built-in\n", name)),
            }
        }

        output.push_str("\n[notation]\n");
        output.push_str(&format!(
            "treble_switch = {}\n",
            self.notation.treble_switch
        ));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NoteConfig::default();
        assert_eq!(config.notation.treble_switch, 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.tables.channels.is_none());
    }

    #[test]
    fn test_to_toml() {
        let mut config = NoteConfig::default();
        config.tables.channels = Some(PathBuf::from("/tmp/channels.txt"));
        let toml = config.to_toml();
        assert!(toml.contains("[tables]"));
        assert!(toml.contains("channels = \"/tmp/channels.txt\""));
        assert!(toml.contains("# key_signatures = built-in"));
        assert!(toml.contains("treble_switch = 60"));
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = NoteConfig::default();
        config.tables.key_signatures = Some(PathBuf::from("/data/keys.txt"));
        config.notation.treble_switch = 55;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notewise.toml");
        std::fs::write(&path, config.to_toml()).unwrap();

        let layer = loader::load_from_file(&path).unwrap();
        let reloaded = loader::merge_configs(NoteConfig::default(), layer);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[notation]\ntreble_switch = 48\n").unwrap();

        let (_config, sources) = NoteConfig::load_with_sources_from(Some(&path)).unwrap();
        assert_eq!(sources.files.last(), Some(&path));
    }
}
