use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{int_field, malformed, read_table, table_lines, TableKind};
use crate::Result;

/// Channel number → display name.
///
/// The table is written with 1-based channel numbers (as printed on
/// hardware) and stored 0-based (as carried in MIDI status bytes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelCatalog {
    names: BTreeMap<u8, String>,
}

impl ChannelCatalog {
    /// Parse `channelNumber name` pairs; a line may hold several pairs.
    pub fn parse(text: &str) -> Result<Self> {
        let table = TableKind::Channels;
        let mut names = BTreeMap::new();

        for (line, tokens) in table_lines(text) {
            if tokens.len() % 2 != 0 {
                return Err(malformed(table, line, "expected `number name` pairs"));
            }
            for pair in tokens.chunks(2) {
                let number: u8 = int_field(table, line, "channel number", pair[0])?;
                if !(1..=16).contains(&number) {
                    return Err(malformed(
                        table,
                        line,
                        format!("channel {} outside 1-16", number),
                    ));
                }
                if names.insert(number - 1, pair[1].to_string()).is_some() {
                    return Err(malformed(table, line, format!("channel {} listed twice", number)));
                }
            }
        }

        Ok(Self { names })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_table(TableKind::Channels, path)?)
    }

    /// Name of a 0-based channel, or its decimal number when unnamed.
    pub fn resolve(&self, channel: u8) -> String {
        self.names
            .get(&channel)
            .cloned()
            .unwrap_or_else(|| channel.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(0-based channel, name)` in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.names.iter().map(|(ch, name)| (*ch, name.as_str()))
    }
}
