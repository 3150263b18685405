//! Adapter from `midly`'s tokenized tracks to [`TrackEvent`]s.
//!
//! `midly` owns the byte-level work (chunks, delta times, running status);
//! this module only converts delta ticks to absolute ticks and reshapes
//! the messages this crate decodes. Everything else is skipped.

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::Catalogs;
use crate::event::{Decoded, EventKind, TextKind, TrackEvent};
use crate::tracker::decode_track;
use crate::Result;

/// PPQ assumed for SMPTE-timed files, which carry no ticks-per-quarter.
pub const TIMECODE_FALLBACK_PPQ: u16 = 480;

/// Every record decoded from one track of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedTrack {
    pub track_index: usize,
    pub records: Vec<Decoded>,
}

/// Pulses per quarter note of a parsed file.
pub fn ppq(smf: &Smf) -> u16 {
    match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(_, _) => TIMECODE_FALLBACK_PPQ,
    }
}

/// Convert one `midly` track into absolute-tick events.
pub fn track_events(track: &[midly::TrackEvent]) -> Vec<TrackEvent> {
    let mut current_tick: u64 = 0;
    let mut events = Vec::with_capacity(track.len());

    for event in track {
        current_tick += event.delta.as_int() as u64;
        if let Some(kind) = convert(&event.kind) {
            events.push(TrackEvent::new(current_tick, kind));
        }
    }

    events
}

fn convert(kind: &TrackEventKind) -> Option<EventKind> {
    match *kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => Some(EventKind::NoteOn {
                    channel,
                    velocity: vel.as_int(),
                    key: key.as_int(),
                }),
                MidiMessage::NoteOff { key, .. } => Some(EventKind::NoteOff {
                    channel,
                    key: key.as_int(),
                }),
                MidiMessage::Controller { controller, value } => Some(EventKind::ControlChange {
                    channel,
                    code: controller.as_int(),
                    value: value.as_int(),
                }),
                MidiMessage::ProgramChange { program } => Some(EventKind::ProgramChange {
                    channel,
                    program: program.as_int(),
                }),
                _ => None,
            }
        }
        TrackEventKind::Meta(meta) => match meta {
            MetaMessage::Tempo(tempo) => {
                Some(EventKind::Tempo(tempo.as_int().to_be_bytes()[1..].to_vec()))
            }
            MetaMessage::TimeSignature(num, denom_pow, clocks, thirty_seconds) => Some(
                EventKind::TimeSignature(vec![num, denom_pow, clocks, thirty_seconds]),
            ),
            MetaMessage::KeySignature(accidentals, minor) => Some(EventKind::KeySignature(vec![
                accidentals as u8,
                u8::from(minor),
            ])),
            MetaMessage::Text(bytes) => Some(text(TextKind::Text, bytes)),
            MetaMessage::Copyright(bytes) => Some(text(TextKind::Copyright, bytes)),
            MetaMessage::TrackName(bytes) => Some(text(TextKind::TrackName, bytes)),
            MetaMessage::InstrumentName(bytes) => Some(text(TextKind::InstrumentName, bytes)),
            MetaMessage::Lyric(bytes) => Some(text(TextKind::Lyric, bytes)),
            MetaMessage::Marker(bytes) => Some(text(TextKind::Marker, bytes)),
            MetaMessage::CuePoint(bytes) => Some(text(TextKind::CuePoint, bytes)),
            MetaMessage::ProgramName(bytes) => Some(text(TextKind::ProgramName, bytes)),
            MetaMessage::DeviceName(bytes) => Some(text(TextKind::DeviceName, bytes)),
            MetaMessage::MidiPort(port) => Some(EventKind::Port(port.as_int())),
            MetaMessage::EndOfTrack => Some(EventKind::EndOfTrack),
            MetaMessage::Unknown(meta_type @ 0x01..=0x0F, bytes) => {
                Some(text(TextKind::from_type(meta_type), bytes))
            }
            _ => None,
        },
        TrackEventKind::SysEx(_) | TrackEventKind::Escape(_) => None,
    }
}

fn text(kind: TextKind, bytes: &[u8]) -> EventKind {
    EventKind::Text {
        kind,
        bytes: bytes.to_vec(),
    }
}

/// Decode every track of a parsed file, each with its own tracker.
pub fn decode_smf(catalogs: &Catalogs, smf: &Smf) -> Result<Vec<DecodedTrack>> {
    let ppq = ppq(smf);

    smf.tracks
        .iter()
        .enumerate()
        .map(|(track_index, track)| {
            let events = track_events(track);
            debug!(track_index, events = events.len(), ppq, "decoding track");
            Ok(DecodedTrack {
                track_index,
                records: decode_track(catalogs, ppq, events)?,
            })
        })
        .collect()
}
