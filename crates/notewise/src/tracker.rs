//! Note lifecycle tracking: pairs note-ons with their note-offs.
//!
//! A note-off closes an open note with the same pitch on a channel of the
//! same name, so channels that share a catalog name share open notes.
//! MIDI never says which sounding instance a note-off refers to when the
//! same key is struck twice before release. This tracker closes the
//! earliest-opened instance first (FIFO per channel name and key).
//! Stray note-offs with nothing open are dropped and counted.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info, warn};

use crate::catalog::Catalogs;
use crate::control::ControlChangeEvent;
use crate::event::{Decoded, EventKind, ProgramEvent, TrackEvent};
use crate::note::{quarters, Note, NoteSymbol};
use crate::tempo::TempoMarker;
use crate::time_signature::TimeSignature;
use crate::{Error, Result};

/// A note-on still waiting for its note-off.
#[derive(Debug, Clone)]
struct OpenNote {
    /// Global open order, so flushes are deterministic across keys.
    seq: u64,
    channel: u8,
    channel_name: String,
    symbol: NoteSymbol,
    velocity: u8,
    ppq: u16,
    start_tick: u64,
}

impl OpenNote {
    fn close(self, stop_tick: u64, terminated: bool) -> Note {
        Note {
            duration: quarters(self.start_tick, stop_tick, self.ppq),
            channel: self.channel,
            channel_name: self.channel_name,
            symbol: self.symbol,
            velocity: self.velocity,
            ppq: self.ppq,
            start_tick: self.start_tick,
            stop_tick,
            terminated,
        }
    }
}

/// Per-track note state. Use one tracker per track: channel numbers are
/// only meaningful within a track.
#[derive(Debug)]
pub struct NoteTracker<'a> {
    catalogs: &'a Catalogs,
    // (channel name, key) → open instances, oldest first
    open: HashMap<(String, u8), VecDeque<OpenNote>>,
    next_seq: u64,
    stray_note_offs: usize,
}

impl<'a> NoteTracker<'a> {
    pub fn new(catalogs: &'a Catalogs) -> Self {
        Self {
            catalogs,
            open: HashMap::new(),
            next_seq: 0,
            stray_note_offs: 0,
        }
    }

    /// Start a note. A velocity of 0 is a note-off by MIDI convention.
    pub fn on_note_on(
        &mut self,
        tick: u64,
        channel: u8,
        velocity: u8,
        key: u8,
        ppq: u16,
    ) -> Result<Option<Note>> {
        if velocity == 0 {
            return self.on_note_off(tick, channel, key, ppq);
        }
        if ppq == 0 {
            return Err(Error::ZeroPpq);
        }

        let symbol = NoteSymbol::decode(key, velocity, self.catalogs.clef)?;
        debug!(tick, channel, note = %symbol.notation, velocity, "note opened");

        let channel_name = self.catalogs.channels.resolve(channel);
        let note = OpenNote {
            seq: self.next_seq,
            channel,
            channel_name: channel_name.clone(),
            symbol,
            velocity,
            ppq,
            start_tick: tick,
        };
        self.next_seq += 1;
        self.open.entry((channel_name, key)).or_default().push_back(note);

        Ok(None)
    }

    /// Close the oldest open note on `key` whose channel resolves to the
    /// same name as `channel`.
    ///
    /// Returns `Ok(None)` when nothing is open for that pair.
    pub fn on_note_off(
        &mut self,
        tick: u64,
        channel: u8,
        key: u8,
        ppq: u16,
    ) -> Result<Option<Note>> {
        if ppq == 0 {
            return Err(Error::ZeroPpq);
        }

        let pair = (self.catalogs.channels.resolve(channel), key);
        let oldest = match self.open.get(&pair).and_then(VecDeque::front) {
            Some(oldest) => oldest,
            None => {
                self.stray_note_offs += 1;
                info!(tick, channel, key, "note-off without an open note, dropped");
                return Ok(None);
            }
        };

        if oldest.ppq != ppq {
            return Err(Error::PpqMismatch {
                expected: oldest.ppq,
                actual: ppq,
            });
        }
        if tick < oldest.start_tick {
            return Err(Error::NegativeDuration {
                start: oldest.start_tick,
                stop: tick,
            });
        }

        let Some(open) = self.open.get_mut(&pair).and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        if self.open.get(&pair).is_some_and(VecDeque::is_empty) {
            self.open.remove(&pair);
        }

        let note = open.close(tick, true);
        debug!(
            tick,
            channel,
            note = %note.symbol.notation,
            duration = note.duration,
            "note closed"
        );
        Ok(Some(note))
    }

    /// Emit every still-open note with a zero-length duration, marked
    /// unterminated, in the order the notes were opened.
    pub fn flush_unclosed(&mut self) -> Vec<Note> {
        let mut pending: Vec<OpenNote> = self.open.drain().flat_map(|(_, q)| q).collect();
        pending.sort_by_key(|n| (n.start_tick, n.seq));

        pending
            .into_iter()
            .map(|open| {
                warn!(
                    channel = open.channel,
                    note = %open.symbol.notation,
                    start_tick = open.start_tick,
                    "note never released"
                );
                let start = open.start_tick;
                open.close(start, false)
            })
            .collect()
    }

    /// Decode one event. Notes come out when they close; end-of-track
    /// flushes everything still open before the end marker.
    pub fn process(&mut self, event: TrackEvent, ppq: u16) -> Result<Vec<Decoded>> {
        let TrackEvent { tick, kind } = event;
        let catalogs = self.catalogs;

        let decoded: Vec<Decoded> = match kind {
            EventKind::NoteOn {
                channel,
                velocity,
                key,
            } => self
                .on_note_on(tick, channel, velocity, key, ppq)?
                .map(Decoded::Note)
                .into_iter()
                .collect(),
            EventKind::NoteOff { channel, key } => self
                .on_note_off(tick, channel, key, ppq)?
                .map(Decoded::Note)
                .into_iter()
                .collect(),
            EventKind::ControlChange {
                channel,
                code,
                value,
            } => {
                let (name, state) = catalogs.control_changes.classify(code, value)?;
                vec![Decoded::ControlChange(ControlChangeEvent {
                    tick,
                    channel,
                    channel_name: catalogs.channels.resolve(channel),
                    code,
                    value,
                    name: name.to_string(),
                    state,
                })]
            }
            EventKind::ProgramChange { channel, program } => {
                vec![Decoded::Program(ProgramEvent {
                    tick,
                    channel,
                    channel_name: catalogs.channels.resolve(channel),
                    program,
                })]
            }
            EventKind::Tempo(bytes) => {
                vec![Decoded::Tempo(TempoMarker::decode(tick, ppq, &bytes)?)]
            }
            EventKind::TimeSignature(bytes) => vec![Decoded::TimeSignature {
                tick,
                signature: TimeSignature::decode(&bytes)?,
            }],
            EventKind::KeySignature(bytes) => {
                vec![Decoded::KeySignature(
                    catalogs.key_signatures.decode(tick, &bytes)?,
                )]
            }
            EventKind::Text { kind, bytes } => vec![Decoded::Text {
                tick,
                kind,
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }],
            EventKind::Port(port) => vec![Decoded::Port { tick, port }],
            EventKind::EndOfTrack => {
                let mut out: Vec<Decoded> =
                    self.flush_unclosed().into_iter().map(Decoded::Note).collect();
                out.push(Decoded::EndOfTrack { tick });
                out
            }
        };

        Ok(decoded)
    }

    /// Number of notes currently sounding.
    pub fn open_count(&self) -> usize {
        self.open.values().map(VecDeque::len).sum()
    }

    /// Note-offs dropped because nothing matching was open.
    pub fn stray_note_offs(&self) -> usize {
        self.stray_note_offs
    }
}

/// Decode a whole track with a fresh tracker, flushing unreleased notes at
/// the end even when the track carries no end-of-track event.
pub fn decode_track<I>(catalogs: &Catalogs, ppq: u16, events: I) -> Result<Vec<Decoded>>
where
    I: IntoIterator<Item = TrackEvent>,
{
    let mut tracker = NoteTracker::new(catalogs);
    let mut decoded = Vec::new();

    for event in events {
        decoded.extend(tracker.process(event, ppq)?);
    }
    decoded.extend(tracker.flush_unclosed().into_iter().map(Decoded::Note));

    Ok(decoded)
}
