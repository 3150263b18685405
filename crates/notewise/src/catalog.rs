//! The catalog handle: every lookup table a decoder needs, loaded once.

use std::fmt;
use std::path::Path;

use noteconf::{NoteConfig, TablesConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::channels::ChannelCatalog;
use crate::control::ControlChangeCatalog;
use crate::key_signature::KeySignatureCatalog;
use crate::note::ClefBoundary;
use crate::{Error, Result};

const BUILTIN_CHANNELS: &str = include_str!("../tables/channels.txt");
const BUILTIN_CONTROL_CHANGES: &str = include_str!("../tables/control_changes.txt");
const BUILTIN_KEY_SIGNATURES: &str = include_str!("../tables/key_signatures.txt");

/// Which lookup table an error or log line refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Channels,
    ControlChanges,
    KeySignatures,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Channels => write!(f, "channel"),
            TableKind::ControlChanges => write!(f, "control change"),
            TableKind::KeySignatures => write!(f, "key signature"),
        }
    }
}

/// Read-only lookup tables shared by every tracker.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub channels: ChannelCatalog,
    pub control_changes: ControlChangeCatalog,
    pub key_signatures: KeySignatureCatalog,
    pub clef: ClefBoundary,
}

impl Catalogs {
    /// Catalogs from the tables compiled into this crate, C4 clef boundary.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            channels: ChannelCatalog::parse(BUILTIN_CHANNELS)?,
            control_changes: ControlChangeCatalog::parse(BUILTIN_CONTROL_CHANGES)?,
            key_signatures: KeySignatureCatalog::parse(BUILTIN_KEY_SIGNATURES)?,
            clef: ClefBoundary::default(),
        })
    }

    /// Catalogs from configured table files, falling back to built-ins.
    pub fn from_config(config: &NoteConfig) -> Result<Self> {
        let TablesConfig {
            channels,
            control_changes,
            key_signatures,
        } = &config.tables;

        let catalogs = Self {
            channels: match channels {
                Some(path) => ChannelCatalog::load(path)?,
                None => ChannelCatalog::parse(BUILTIN_CHANNELS)?,
            },
            control_changes: match control_changes {
                Some(path) => ControlChangeCatalog::load(path)?,
                None => ControlChangeCatalog::parse(BUILTIN_CONTROL_CHANGES)?,
            },
            key_signatures: match key_signatures {
                Some(path) => KeySignatureCatalog::load(path)?,
                None => KeySignatureCatalog::parse(BUILTIN_KEY_SIGNATURES)?,
            },
            clef: ClefBoundary::new(config.notation.treble_switch)?,
        };

        info!(
            channels = catalogs.channels.len(),
            control_changes = catalogs.control_changes.len(),
            key_signatures = catalogs.key_signatures.len(),
            treble_switch = catalogs.clef.key(),
            "catalogs loaded"
        );

        Ok(catalogs)
    }
}

/// Read a table file, mapping any I/O failure to `ConfigNotFound`.
pub(crate) fn read_table(table: TableKind, path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::ConfigNotFound {
        table,
        reason: format!("{}: {}", path.display(), e),
    })
}

/// Non-blank, non-comment lines with 1-based line numbers, split on whitespace.
pub(crate) fn table_lines(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| (n, line.split_whitespace().collect()))
}

pub(crate) fn malformed(table: TableKind, line: usize, reason: impl fmt::Display) -> Error {
    Error::ConfigNotFound {
        table,
        reason: format!("line {}: {}", line, reason),
    }
}

/// Parse one integer field of a table row.
pub(crate) fn int_field<T: std::str::FromStr>(
    table: TableKind,
    line: usize,
    what: &str,
    token: &str,
) -> Result<T> {
    token
        .parse()
        .map_err(|_| malformed(table, line, format!("expected {}, got {:?}", what, token)))
}
