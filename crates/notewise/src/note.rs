use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Pitch-class names, indexed by `key % 12`.
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Upper velocity bound of each dynamic band, softest first.
///
/// Loosely after the common velocity/dynamic charts; 127 closes the last band.
const DYNAMIC_BOUNDS: [(u8, Dynamic); 8] = [
    (16, Dynamic::Ppp),
    (33, Dynamic::Pp),
    (49, Dynamic::P),
    (64, Dynamic::Mp),
    (80, Dynamic::Mf),
    (96, Dynamic::F),
    (112, Dynamic::Ff),
    (127, Dynamic::Fff),
];

/// Loudness class derived from note-on velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    /// Velocity 0: the note-on is really a note-off.
    Off,
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl Dynamic {
    pub fn from_velocity(velocity: u8) -> Result<Self> {
        if velocity == 0 {
            return Ok(Dynamic::Off);
        }
        DYNAMIC_BOUNDS
            .iter()
            .find(|(upper, _)| velocity <= *upper)
            .map(|(_, dynamic)| *dynamic)
            .ok_or(Error::VelocityOutOfRange(velocity))
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Dynamic::Off => "note-off",
            Dynamic::Ppp => "PPP",
            Dynamic::Pp => "PP",
            Dynamic::P => "P",
            Dynamic::Mp => "MP",
            Dynamic::Mf => "MF",
            Dynamic::F => "F",
            Dynamic::Ff => "FF",
            Dynamic::Fff => "FFF",
        }
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Suggested staff for a pitch. Only treble and bass are modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Clef {
    Bass,
    Treble,
}

impl fmt::Display for Clef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clef::Bass => write!(f, "BASS"),
            Clef::Treble => write!(f, "TREBLE"),
        }
    }
}

/// The lowest key written in treble clef; everything below goes to bass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClefBoundary(u8);

impl ClefBoundary {
    /// Middle C.
    pub const C4: ClefBoundary = ClefBoundary(60);

    pub fn new(key: u8) -> Result<Self> {
        if key > 127 {
            return Err(Error::KeyOutOfRange(key));
        }
        Ok(Self(key))
    }

    pub fn key(&self) -> u8 {
        self.0
    }

    pub fn clef_for(&self, key: u8) -> Clef {
        if key >= self.0 {
            Clef::Treble
        } else {
            Clef::Bass
        }
    }
}

impl Default for ClefBoundary {
    fn default() -> Self {
        Self::C4
    }
}

/// Everything a key number and velocity say about a note, timing aside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSymbol {
    pub key: u8,
    pub pitch_class: String,
    /// Scientific octave; keys 0-11 land in octave -1.
    pub octave: i8,
    /// Pitch class plus octave, e.g. `C4`, with ` (theoretical)` appended below octave 0.
    pub notation: String,
    pub clef: Clef,
    pub dynamic: Dynamic,
}

impl NoteSymbol {
    pub fn decode(key: u8, velocity: u8, boundary: ClefBoundary) -> Result<Self> {
        if key > 127 {
            return Err(Error::KeyOutOfRange(key));
        }
        let dynamic = Dynamic::from_velocity(velocity)?;

        let octave = (key / 12) as i8 - 1;
        let pitch_class = NOTE_NAMES[(key % 12) as usize];
        let notation = if octave < 0 {
            format!("{}{} (theoretical)", pitch_class, octave)
        } else {
            format!("{}{}", pitch_class, octave)
        };

        Ok(Self {
            key,
            pitch_class: pitch_class.to_string(),
            octave,
            notation,
            clef: boundary.clef_for(key),
            dynamic,
        })
    }
}

/// A note whose lifetime has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub channel: u8,
    pub channel_name: String,
    #[serde(flatten)]
    pub symbol: NoteSymbol,
    pub velocity: u8,
    pub ppq: u16,
    pub start_tick: u64,
    pub stop_tick: u64,
    /// Length in quarter notes, rounded to three decimals.
    pub duration: f64,
    /// False when the track ended before a matching note-off arrived.
    pub terminated: bool,
}

impl Note {
    pub fn notation(&self) -> &str {
        &self.symbol.notation
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {} on {} at tick {}, {} quarters",
            self.symbol.notation,
            self.symbol.clef,
            self.symbol.dynamic,
            self.channel_name,
            self.start_tick,
            self.duration
        )?;
        if !self.terminated {
            write!(f, " (unterminated)")?;
        }
        Ok(())
    }
}

/// `(stop - start) / ppq` rounded to three decimal places.
pub(crate) fn quarters(start: u64, stop: u64, ppq: u16) -> f64 {
    let ratio = (stop - start) as f64 / ppq as f64;
    (ratio * 1000.0).round() / 1000.0
}
