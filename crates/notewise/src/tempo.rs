use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const MICROS_PER_MINUTE: u32 = 60_000_000;

/// A tempo change and the tick/second conversions it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub ppq: u16,
    pub start_tick: u64,
    pub micros_per_quarter: u32,
    /// Whole beats per minute (integer division, as MIDI tools report it).
    pub bpm: u32,
    pub ticks_per_second: f64,
    pub seconds_per_tick: f64,
}

impl TempoMarker {
    /// Decode the 3 data bytes of a set-tempo meta event: a big-endian
    /// count of microseconds per quarter note.
    pub fn decode(start_tick: u64, ppq: u16, bytes: &[u8]) -> Result<Self> {
        let [hi, mid, lo] = bytes[..] else {
            return Err(Error::MalformedTempo(bytes.len()));
        };
        if ppq == 0 {
            return Err(Error::ZeroPpq);
        }

        let micros_per_quarter = u32::from_be_bytes([0, hi, mid, lo]);
        if micros_per_quarter == 0 {
            return Err(Error::DivideByZeroTempo);
        }

        let bpm = MICROS_PER_MINUTE / micros_per_quarter;
        let ticks_per_second = ppq as f64 * (bpm as f64 / 60.0);

        Ok(Self {
            ppq,
            start_tick,
            micros_per_quarter,
            bpm,
            ticks_per_second,
            seconds_per_tick: 1.0 / ticks_per_second,
        })
    }
}

impl fmt::Display for TempoMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} BPM at tick {} ({} ticks/s at {} PPQ)",
            self.bpm, self.start_tick, self.ticks_per_second, self.ppq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_twenty_bpm() {
        // 500000 = 0x07A120
        let tempo = TempoMarker::decode(0, 480, &[0x07, 0xA1, 0x20]).unwrap();
        assert_eq!(tempo.micros_per_quarter, 500_000);
        assert_eq!(tempo.bpm, 120);
        assert_eq!(tempo.ticks_per_second, 960.0);
        assert_eq!(tempo.seconds_per_tick, 1.0 / 960.0);
    }

    #[test]
    fn bpm_truncates() {
        // 700000 us/quarter is 85.7 BPM, reported as 85
        let tempo = TempoMarker::decode(1920, 96, &[0x0A, 0xAE, 0x60]).unwrap();
        assert_eq!(tempo.micros_per_quarter, 700_000);
        assert_eq!(tempo.bpm, 85);
        assert_eq!(tempo.start_tick, 1920);
    }

    #[test]
    fn zero_tempo_rejected() {
        assert!(matches!(
            TempoMarker::decode(0, 480, &[0, 0, 0]),
            Err(Error::DivideByZeroTempo)
        ));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!(
            TempoMarker::decode(0, 480, &[0x07, 0xA1]),
            Err(Error::MalformedTempo(2))
        ));
    }

    #[test]
    fn zero_ppq_rejected() {
        assert!(matches!(
            TempoMarker::decode(0, 0, &[0x07, 0xA1, 0x20]),
            Err(Error::ZeroPpq)
        ));
    }
}
