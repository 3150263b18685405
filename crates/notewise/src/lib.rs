//! Symbolic decoding of MIDI events.
//!
//! Turns an already-tokenized MIDI event stream into musical facts: which
//! pitch sounded on which channel for how long and how loud, under which
//! tempo, meter and key. Catalogs are loaded once with [`init`] (or built
//! directly with [`Catalogs::builtin`]) and shared read-only by any number of
//! [`NoteTracker`]s, one per track.
//!
//! # Example
//!
//! ```
//! use notewise::{Catalogs, Decoded, EventKind, NoteTracker, TrackEvent};
//!
//! let catalogs = Catalogs::builtin().unwrap();
//! let mut tracker = NoteTracker::new(&catalogs);
//!
//! let on = TrackEvent::new(0, EventKind::NoteOn { channel: 0, velocity: 80, key: 60 });
//! let off = TrackEvent::new(480, EventKind::NoteOff { channel: 0, key: 60 });
//!
//! assert!(tracker.process(on, 480).unwrap().is_empty());
//! match tracker.process(off, 480).unwrap().as_slice() {
//!     [Decoded::Note(note)] => assert_eq!(note.duration, 1.0),
//!     other => panic!("unexpected output: {other:?}"),
//! }
//! ```

pub mod catalog;
pub mod channels;
pub mod control;
pub mod event;
pub mod key_signature;
pub mod note;
pub mod source;
pub mod telemetry;
pub mod tempo;
pub mod time_signature;
pub mod tracker;

pub use noteconf;

pub use catalog::{Catalogs, TableKind};
pub use channels::ChannelCatalog;
pub use control::{ControlChangeCatalog, ControlChangeEvent, SwitchState};
pub use event::{Decoded, EventKind, ProgramEvent, TextKind, TrackEvent};
pub use key_signature::{KeyMode, KeySignature, KeySignatureCatalog, KeySignatureEvent};
pub use note::{Clef, ClefBoundary, Dynamic, Note, NoteSymbol};
pub use source::{decode_smf, DecodedTrack};
pub use tempo::TempoMarker;
pub use time_signature::TimeSignature;
pub use tracker::{decode_track, NoteTracker};

use std::sync::OnceLock;

use noteconf::{ConfigError, NoteConfig};
use tracing::debug;

/// Broad failure classes, for callers that route errors by cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A lookup table or config file is missing or malformed.
    Config,
    /// A value falls outside the domain the decoders model.
    DataIntegrity,
    /// Events arrived in an order or shape the caller promised not to send.
    Ordering,
}

/// Errors from catalog loading and event decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{table} table unavailable: {reason}")]
    ConfigNotFound { table: TableKind, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no catalog entry for control change code {0}")]
    UnknownControlCode(u8),

    #[error("no key signature with {sharps} sharps and {flats} flats")]
    UnknownKeySignature { sharps: u8, flats: u8 },

    #[error("malformed time signature: {0}")]
    MalformedTimeSignature(String),

    #[error("tempo must be 3 bytes, got {0}")]
    MalformedTempo(usize),

    #[error("malformed key signature: {0}")]
    MalformedKeySignature(String),

    #[error("tempo of zero microseconds per quarter note")]
    DivideByZeroTempo,

    #[error("velocity {0} exceeds 127")]
    VelocityOutOfRange(u8),

    #[error("key number {0} exceeds 127")]
    KeyOutOfRange(u8),

    #[error("pulses per quarter note must be non-zero")]
    ZeroPpq,

    #[error("note opened at {expected} PPQ closed at {actual} PPQ")]
    PpqMismatch { expected: u16, actual: u16 },

    #[error("note stops at tick {stop} before it starts at tick {start}")]
    NegativeDuration { start: u64, stop: u64 },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConfigNotFound { .. } | Error::Config(_) => ErrorKind::Config,
            Error::PpqMismatch { .. } | Error::NegativeDuration { .. } => ErrorKind::Ordering,
            Error::UnknownControlCode(_)
            | Error::UnknownKeySignature { .. }
            | Error::MalformedTimeSignature(_)
            | Error::MalformedTempo(_)
            | Error::MalformedKeySignature(_)
            | Error::DivideByZeroTempo
            | Error::VelocityOutOfRange(_)
            | Error::KeyOutOfRange(_)
            | Error::ZeroPpq => ErrorKind::DataIntegrity,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

static CATALOGS: OnceLock<Catalogs> = OnceLock::new();

/// Load the process-wide catalogs.
///
/// The first successful call reads the tables named by `config`; later calls
/// return the same handle without touching the filesystem again, whatever
/// config they pass. A failed load leaves nothing cached, so it can be retried.
pub fn init(config: &NoteConfig) -> Result<&'static Catalogs> {
    if let Some(catalogs) = CATALOGS.get() {
        debug!("catalogs already initialized");
        return Ok(catalogs);
    }

    let loaded = Catalogs::from_config(config)?;
    Ok(CATALOGS.get_or_init(|| loaded))
}
