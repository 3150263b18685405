//! Key signatures: the finite catalog of sharps/flats fingerprints.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::{int_field, malformed, read_table, table_lines, TableKind};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySignature {
    pub sharps: u8,
    pub flats: u8,
    pub major: String,
    pub minor: String,
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} ({}#, {}b)",
            self.major, self.minor, self.sharps, self.flats
        )
    }
}

/// Every legal key signature, keyed by `(sharps, flats)`.
///
/// Rows read `sharps flats majorName <separator> minorName`. The set is
/// meant to be exhaustive, so a failed [`find`](Self::find) is a data fault
/// rather than an ordinary miss.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySignatureCatalog {
    keys: BTreeMap<(u8, u8), KeySignature>,
}

impl KeySignatureCatalog {
    pub fn parse(text: &str) -> Result<Self> {
        let table = TableKind::KeySignatures;
        let mut keys = BTreeMap::new();

        for (line, tokens) in table_lines(text) {
            let [sharps, flats, major, _separator, minor] = tokens[..] else {
                return Err(malformed(
                    table,
                    line,
                    "expected `sharps flats major <separator> minor`",
                ));
            };
            let sharps: u8 = int_field(table, line, "sharps count", sharps)?;
            let flats: u8 = int_field(table, line, "flats count", flats)?;
            if sharps > 7 || flats > 7 || (sharps > 0 && flats > 0) {
                return Err(malformed(
                    table,
                    line,
                    format!("{} sharps with {} flats is not a key signature", sharps, flats),
                ));
            }

            let key = KeySignature {
                sharps,
                flats,
                major: major.to_string(),
                minor: minor.to_string(),
            };
            if keys.insert((sharps, flats), key).is_some() {
                return Err(malformed(
                    table,
                    line,
                    format!("{} sharps / {} flats listed twice", sharps, flats),
                ));
            }
        }

        Ok(Self { keys })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_table(TableKind::KeySignatures, path)?)
    }

    pub fn find(&self, sharps: u8, flats: u8) -> Result<&KeySignature> {
        self.keys
            .get(&(sharps, flats))
            .ok_or(Error::UnknownKeySignature { sharps, flats })
    }

    /// Decode the two data bytes of a key-signature meta event.
    ///
    /// Byte 0 is a signed accidental count (positive sharps, negative flats),
    /// byte 1 is 0 for major and 1 for minor.
    pub fn decode(&self, tick: u64, bytes: &[u8]) -> Result<KeySignatureEvent> {
        let [accidentals, mode] = bytes[..] else {
            return Err(Error::MalformedKeySignature(format!(
                "expected 2 bytes, got {}",
                bytes.len()
            )));
        };
        let mode = match mode {
            0 => KeyMode::Major,
            1 => KeyMode::Minor,
            other => {
                return Err(Error::MalformedKeySignature(format!(
                    "mode byte {} is neither major (0) nor minor (1)",
                    other
                )))
            }
        };

        let accidentals = accidentals as i8;
        let (sharps, flats) = if accidentals >= 0 {
            (accidentals.unsigned_abs(), 0)
        } else {
            (0, accidentals.unsigned_abs())
        };

        Ok(KeySignatureEvent {
            tick,
            signature: self.find(sharps, flats)?.clone(),
            mode,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeySignature> {
        self.keys.values()
    }
}

/// A key-signature meta event resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignatureEvent {
    pub tick: u64,
    pub signature: KeySignature,
    pub mode: KeyMode,
}

impl KeySignatureEvent {
    /// The key name matching the event's mode.
    pub fn name(&self) -> &str {
        match self.mode {
            KeyMode::Major => &self.signature.major,
            KeyMode::Minor => &self.signature.minor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn builtin() -> KeySignatureCatalog {
        crate::Catalogs::builtin().unwrap().key_signatures
    }

    #[test]
    fn every_configured_pair_round_trips() {
        let text = include_str!("../tables/key_signatures.txt");
        let catalog = KeySignatureCatalog::parse(text).unwrap();

        for (_, tokens) in table_lines(text) {
            let sharps: u8 = tokens[0].parse().unwrap();
            let flats: u8 = tokens[1].parse().unwrap();
            let key = catalog.find(sharps, flats).unwrap();
            assert_eq!(key.major, tokens[2]);
            assert_eq!(key.minor, tokens[4]);
        }
    }

    #[test]
    fn pair_outside_table() {
        let catalog = builtin();
        assert!(matches!(
            catalog.find(8, 0),
            Err(Error::UnknownKeySignature { sharps: 8, flats: 0 })
        ));
        assert!(matches!(
            catalog.find(1, 1),
            Err(Error::UnknownKeySignature { .. })
        ));
    }

    #[test]
    fn decode_meta_bytes() {
        let catalog = builtin();

        let d_major = catalog.decode(0, &[2, 0]).unwrap();
        assert_eq!(d_major.signature.sharps, 2);
        assert_eq!(d_major.name(), "D_Major");

        // -3 as a signed byte: three flats, minor
        let c_minor = catalog.decode(960, &[0xFD, 1]).unwrap();
        assert_eq!(c_minor.signature.flats, 3);
        assert_eq!(c_minor.mode, KeyMode::Minor);
        assert_eq!(c_minor.name(), "C_Minor");
        assert_eq!(c_minor.tick, 960);
    }

    #[test]
    fn decode_rejects_bad_shapes() {
        let catalog = builtin();
        assert!(matches!(catalog.decode(0, &[0]), Err(Error::MalformedKeySignature(_))));
        assert!(matches!(catalog.decode(0, &[0, 2]), Err(Error::MalformedKeySignature(_))));
        assert!(matches!(
            catalog.decode(0, &[9, 0]),
            Err(Error::UnknownKeySignature { sharps: 9, .. })
        ));
    }

    #[test]
    fn malformed_rows_rejected() {
        for text in ["1 0 G_Major E_Minor\n", "8 0 X / Y\n", "1 1 X / Y\n", "0 0 C / a\n0 0 C / a\n"] {
            assert!(KeySignatureCatalog::parse(text).is_err(), "{text:?}");
        }
    }

    #[test]
    fn display() {
        let catalog = builtin();
        assert_eq!(catalog.find(0, 1).unwrap().to_string(), "F_Major / D_Minor (0#, 1b)");
    }
}
