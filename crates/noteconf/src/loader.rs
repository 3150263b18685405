//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, LoggingConfig, NotationConfig, NoteConfig, TablesConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Values one config file sets explicitly. Anything left `None` falls
/// through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub channels: Option<PathBuf>,
    pub control_changes: Option<PathBuf>,
    pub key_signatures: Option<PathBuf>,
    pub treble_switch: Option<u8>,
    pub log_level: Option<String>,
}

/// Discover config files, optionally with an explicit override path.
///
/// Returns paths in load order (system, user, local) and only files that
/// exist. If `cli_path` is provided and exists, it replaces the local
/// override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/notewise/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("notewise/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("notewise.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load the values a TOML file sets.
pub fn load_from_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut layer = ConfigLayer::default();

    if let Some(tables) = table.get("tables").and_then(|v| v.as_table()) {
        let path_of = |name: &str| tables.get(name).and_then(|v| v.as_str()).map(expand_path);
        layer.channels = path_of("channels");
        layer.control_changes = path_of("control_changes");
        layer.key_signatures = path_of("key_signatures");
    }

    if let Some(notation) = table.get("notation").and_then(|v| v.as_table()) {
        if let Some(v) = notation.get("treble_switch").and_then(|v| v.as_integer()) {
            layer.treble_switch = Some(midi_key("notation.treble_switch", v)?);
        }
    }

    if let Some(logging) = table.get("logging").and_then(|v| v.as_table()) {
        if let Some(v) = logging.get("level").and_then(|v| v.as_str()) {
            layer.log_level = Some(v.to_string());
        }
    }

    Ok(layer)
}

fn midi_key(key: &str, value: i64) -> Result<u8, ConfigError> {
    u8::try_from(value)
        .ok()
        .filter(|k| *k <= 127)
        .ok_or_else(|| ConfigError::Invalid {
            key: key.to_string(),
            message: format!("{} is not a MIDI key number (0-127)", value),
        })
}

/// Apply a file's layer on top of `base`. Every value the layer sets wins,
/// including one equal to the compiled default.
pub fn merge_configs(base: NoteConfig, overlay: ConfigLayer) -> NoteConfig {
    NoteConfig {
        tables: TablesConfig {
            channels: overlay.channels.or(base.tables.channels),
            control_changes: overlay.control_changes.or(base.tables.control_changes),
            key_signatures: overlay.key_signatures.or(base.tables.key_signatures),
        },
        notation: NotationConfig {
            treble_switch: overlay.treble_switch.unwrap_or(base.notation.treble_switch),
        },
        logging: LoggingConfig {
            level: overlay.log_level.unwrap_or(base.logging.level),
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(
    config: &mut NoteConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_overrides_from(config, sources, |name| env::var(name).ok())
}

/// Apply overrides read through `lookup`, which stands in for the process
/// environment.
pub fn apply_overrides_from<F>(
    config: &mut NoteConfig,
    sources: &mut ConfigSources,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("NOTEWISE_CHANNEL_TABLE") {
        config.tables.channels = Some(expand_path(&v));
        sources.env_overrides.push("NOTEWISE_CHANNEL_TABLE".to_string());
    }
    if let Some(v) = lookup("NOTEWISE_CONTROL_TABLE") {
        config.tables.control_changes = Some(expand_path(&v));
        sources.env_overrides.push("NOTEWISE_CONTROL_TABLE".to_string());
    }
    if let Some(v) = lookup("NOTEWISE_KEY_TABLE") {
        config.tables.key_signatures = Some(expand_path(&v));
        sources.env_overrides.push("NOTEWISE_KEY_TABLE".to_string());
    }

    if let Some(v) = lookup("NOTEWISE_TREBLE_SWITCH") {
        let value = v.trim().parse::<i64>().map_err(|e| ConfigError::Invalid {
            key: "NOTEWISE_TREBLE_SWITCH".to_string(),
            message: format!("{:?}: {}", v, e),
        })?;
        config.notation.treble_switch = midi_key("NOTEWISE_TREBLE_SWITCH", value)?;
        sources.env_overrides.push("NOTEWISE_TREBLE_SWITCH".to_string());
    }

    if let Some(v) = lookup("NOTEWISE_LOG_LEVEL") {
        config.logging.level = v;
        sources.env_overrides.push("NOTEWISE_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over NOTEWISE_LOG_LEVEL
    if let Some(v) = lookup("RUST_LOG") {
        config.logging.level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }

    Ok(())
}

/// Expand ~ and environment variables in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            home.join(stripped)
        } else {
            PathBuf::from(path)
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // Handle $VAR/rest/of/path
        if let Some(slash_pos) = stripped.find('/') {
            let var_name = &stripped[..slash_pos];
            if let Ok(var_value) = env::var(var_name) {
                PathBuf::from(var_value).join(&stripped[slash_pos + 1..])
            } else {
                PathBuf::from(path)
            }
        } else {
            env::var(stripped)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(path))
        }
    } else {
        PathBuf::from(path)
    }
}
