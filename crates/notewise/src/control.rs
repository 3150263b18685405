//! Control-change codes: names and on/off thresholds.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{int_field, malformed, read_table, table_lines, TableKind};
use crate::{Error, Result};

pub const UNDEFINED: &str = "UNDEFINED";

/// Position of a switch-type controller (sustain pedal, local control, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    Off,
    On,
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchState::Off => write!(f, "OFF"),
            SwitchState::On => write!(f, "ON"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ControlEntry {
    name: String,
    off_limit: u8,
    on_limit: u8,
}

/// Control-change code → name and switch thresholds.
///
/// Text format: the first row lists every undefined code (an optional
/// leading label such as `UNDEFINED` is skipped); every later row holds one
/// or more `code offLimit onLimit name` groups. An `(0, 0)` threshold pair
/// marks a continuous controller with no on/off reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlChangeCatalog {
    entries: BTreeMap<u8, ControlEntry>,
}

impl ControlChangeCatalog {
    pub fn parse(text: &str) -> Result<Self> {
        let table = TableKind::ControlChanges;
        let mut entries = BTreeMap::new();
        let mut rows = table_lines(text);

        let (line, undefined) = rows
            .next()
            .ok_or_else(|| malformed(table, 1, "missing undefined-code row"))?;
        let codes = match undefined.first() {
            Some(label) if label.parse::<u8>().is_err() => &undefined[1..],
            _ => &undefined[..],
        };
        for token in codes {
            let code = int_field(table, line, "control code", token)?;
            insert(&mut entries, line, code, UNDEFINED, 0, 0)?;
        }

        for (line, tokens) in rows {
            if tokens.len() % 4 != 0 {
                return Err(malformed(
                    table,
                    line,
                    "expected `code offLimit onLimit name` groups",
                ));
            }
            for group in tokens.chunks(4) {
                let code = int_field(table, line, "control code", group[0])?;
                let off_limit = int_field(table, line, "off limit", group[1])?;
                let on_limit = int_field(table, line, "on limit", group[2])?;
                insert(&mut entries, line, code, group[3], off_limit, on_limit)?;
            }
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_table(TableKind::ControlChanges, path)?)
    }

    /// Name of `code` and, for switch controllers, whether `value` reads as on.
    ///
    /// `value <= offLimit` is OFF, anything above is ON.
    pub fn classify(&self, code: u8, value: u8) -> Result<(&str, Option<SwitchState>)> {
        let entry = self
            .entries
            .get(&code)
            .ok_or(Error::UnknownControlCode(code))?;

        let state = if entry.off_limit == 0 {
            None
        } else if value <= entry.off_limit {
            Some(SwitchState::Off)
        } else {
            Some(SwitchState::On)
        };

        Ok((&entry.name, state))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(code, name, offLimit, onLimit)` in code order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str, u8, u8)> {
        self.entries
            .iter()
            .map(|(code, e)| (*code, e.name.as_str(), e.off_limit, e.on_limit))
    }
}

fn insert(
    entries: &mut BTreeMap<u8, ControlEntry>,
    line: usize,
    code: u8,
    name: &str,
    off_limit: u8,
    on_limit: u8,
) -> Result<()> {
    let table = TableKind::ControlChanges;
    if code > 127 {
        return Err(malformed(table, line, format!("code {} exceeds 127", code)));
    }
    let switch = (off_limit, on_limit) != (0, 0);
    if switch && (off_limit == 0 || off_limit >= on_limit) {
        return Err(malformed(
            table,
            line,
            format!("code {}: off limit {} must sit below on limit {}", code, off_limit, on_limit),
        ));
    }
    let entry = ControlEntry {
        name: name.to_string(),
        off_limit,
        on_limit,
    };
    if entries.insert(code, entry).is_some() {
        return Err(malformed(table, line, format!("code {} listed twice", code)));
    }
    Ok(())
}

/// A decoded control-change message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlChangeEvent {
    pub tick: u64,
    pub channel: u8,
    pub channel_name: String,
    pub code: u8,
    pub value: u8,
    pub name: String,
    pub state: Option<SwitchState>,
}

impl fmt::Display for ControlChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) = {}", self.name, self.code, self.value)?;
        if let Some(state) = self.state {
            write!(f, " [{}]", state)?;
        }
        write!(f, " on {}", self.channel_name)
    }
}
