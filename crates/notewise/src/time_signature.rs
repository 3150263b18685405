use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u32,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note (normally 8).
    pub thirty_seconds_per_quarter: u8,
}

impl TimeSignature {
    /// Decode the 4 data bytes of a time-signature meta event.
    ///
    /// The second byte is the denominator as a power of two.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let [numerator, exponent, clocks_per_click, thirty_seconds_per_quarter] = bytes[..] else {
            return Err(Error::MalformedTimeSignature(format!(
                "expected 4 bytes, got {}",
                bytes.len()
            )));
        };
        let denominator = 2u32.checked_pow(exponent as u32).ok_or_else(|| {
            Error::MalformedTimeSignature(format!("denominator 2^{} overflows", exponent))
        })?;

        Ok(Self {
            numerator,
            denominator,
            clocks_per_click,
            thirty_seconds_per_quarter,
        })
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn common_time() {
        let sig = TimeSignature::decode(&[4, 2, 24, 8]).unwrap();
        assert_eq!(sig.to_string(), "4/4");
        assert_eq!(sig.clocks_per_click, 24);
        assert_eq!(sig.thirty_seconds_per_quarter, 8);
    }

    #[test]
    fn compound_time() {
        let sig = TimeSignature::decode(&[6, 3, 36, 8]).unwrap();
        assert_eq!((sig.numerator, sig.denominator), (6, 8));
    }

    #[test]
    fn numerator_uses_full_byte() {
        let sig = TimeSignature::decode(&[200, 0, 24, 8]).unwrap();
        assert_eq!(sig.to_string(), "200/1");
    }

    #[test]
    fn wrong_length() {
        let cases: [&[u8]; 3] = [&[4, 2, 24], &[4, 2, 24, 8, 0], &[]];
        for bytes in cases {
            assert!(
                matches!(TimeSignature::decode(bytes), Err(Error::MalformedTimeSignature(_))),
                "{bytes:?}"
            );
        }
    }

    #[test]
    fn huge_exponent() {
        assert!(matches!(
            TimeSignature::decode(&[4, 40, 24, 8]),
            Err(Error::MalformedTimeSignature(_))
        ));
    }
}
