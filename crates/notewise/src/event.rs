//! Input events as handed over by a MIDI tokenizer, and the decoded records
//! produced from them.

use serde::{Deserialize, Serialize};

use crate::control::ControlChangeEvent;
use crate::key_signature::KeySignatureEvent;
use crate::note::Note;
use crate::tempo::TempoMarker;
use crate::time_signature::TimeSignature;

/// One tokenized event at an absolute tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub tick: u64,
    pub kind: EventKind,
}

impl TrackEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}

/// Channel-voice and meta events this crate understands.
///
/// Meta payloads stay as raw data bytes so their length can be checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    NoteOn { channel: u8, velocity: u8, key: u8 },
    NoteOff { channel: u8, key: u8 },
    ControlChange { channel: u8, code: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    Tempo(Vec<u8>),
    TimeSignature(Vec<u8>),
    KeySignature(Vec<u8>),
    Text { kind: TextKind, bytes: Vec<u8> },
    EndOfTrack,
    Port(u8),
}

/// Text-bearing meta event types. Types 0x0A-0x0F are reserved for
/// text and arrive as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Text,
    Copyright,
    TrackName,
    InstrumentName,
    Lyric,
    Marker,
    CuePoint,
    ProgramName,
    DeviceName,
    Other(u8),
}

impl TextKind {
    pub fn from_type(meta_type: u8) -> Self {
        match meta_type {
            0x01 => TextKind::Text,
            0x02 => TextKind::Copyright,
            0x03 => TextKind::TrackName,
            0x04 => TextKind::InstrumentName,
            0x05 => TextKind::Lyric,
            0x06 => TextKind::Marker,
            0x07 => TextKind::CuePoint,
            0x08 => TextKind::ProgramName,
            0x09 => TextKind::DeviceName,
            other => TextKind::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEvent {
    pub tick: u64,
    pub channel: u8,
    pub channel_name: String,
    pub program: u8,
}

/// A musical fact decoded from one or more input events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum Decoded {
    Note(Note),
    Tempo(TempoMarker),
    TimeSignature { tick: u64, signature: TimeSignature },
    KeySignature(KeySignatureEvent),
    ControlChange(ControlChangeEvent),
    Program(ProgramEvent),
    Text { tick: u64, kind: TextKind, text: String },
    Port { tick: u64, port: u8 },
    EndOfTrack { tick: u64 },
}

impl Decoded {
    pub fn as_note(&self) -> Option<&Note> {
        match self {
            Decoded::Note(note) => Some(note),
            _ => None,
        }
    }
}
