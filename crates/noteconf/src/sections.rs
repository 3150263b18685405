//! Configuration sections: lookup table locations, notation rules, logging.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the three lookup tables live on disk.
///
/// A `None` entry means the table compiled into notewise is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablesConfig {
    /// `channelNumber name` lines, channel numbers 1-based.
    #[serde(default)]
    pub channels: Option<PathBuf>,

    /// Undefined-code line followed by `code offLimit onLimit name` triples.
    #[serde(default)]
    pub control_changes: Option<PathBuf>,

    /// `sharps flats majorName <separator> minorName` lines.
    #[serde(default)]
    pub key_signatures: Option<PathBuf>,
}

/// Notation rules applied while naming notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationConfig {
    /// MIDI key number of the lowest pitch written in treble clef.
    /// Default: 60 (C4)
    #[serde(default = "NotationConfig::default_treble_switch")]
    pub treble_switch: u8,
}

impl NotationConfig {
    pub(crate) fn default_treble_switch() -> u8 {
        60
    }
}

impl Default for NotationConfig {
    fn default() -> Self {
        Self {
            treble_switch: Self::default_treble_switch(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or `target=level` lists).
    /// Default: info
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    pub(crate) fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}
