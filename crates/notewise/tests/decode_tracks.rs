//! Whole-track decoding against built-in and fixture catalogs.

use std::path::{Path, PathBuf};

use noteconf::NoteConfig;
use notewise::{
    decode_track, Catalogs, Clef, Decoded, Dynamic, Error, ErrorKind, EventKind, KeyMode,
    NoteTracker, SwitchState, TrackEvent,
};
use pretty_assertions::assert_eq;

const PPQ: u16 = 480;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn on(tick: u64, channel: u8, key: u8, velocity: u8) -> TrackEvent {
    TrackEvent::new(
        tick,
        EventKind::NoteOn {
            channel,
            velocity,
            key,
        },
    )
}

fn off(tick: u64, channel: u8, key: u8) -> TrackEvent {
    TrackEvent::new(tick, EventKind::NoteOff { channel, key })
}

fn fixture_catalogs() -> Catalogs {
    let mut config = NoteConfig::default();
    config.tables.channels = Some(fixture("orchestra_channels.txt"));
    config.tables.control_changes = Some(fixture("pedals_only.txt"));
    config.tables.key_signatures = Some(fixture("modes.txt"));
    Catalogs::from_config(&config).unwrap()
}

#[test]
fn scale_fragment_with_meta() {
    let catalogs = Catalogs::builtin().unwrap();
    let events = vec![
        TrackEvent::new(0, EventKind::Tempo(vec![0x07, 0xA1, 0x20])),
        TrackEvent::new(0, EventKind::TimeSignature(vec![4, 2, 24, 8])),
        TrackEvent::new(0, EventKind::KeySignature(vec![1, 1])),
        on(0, 0, 60, 40),
        off(480, 0, 60),
        on(480, 0, 62, 90),
        off(720, 0, 62),
        on(720, 0, 64, 127),
        on(960, 0, 64, 0),
        TrackEvent::new(960, EventKind::EndOfTrack),
    ];

    let records = decode_track(&catalogs, PPQ, events).unwrap();

    assert!(matches!(&records[0], Decoded::Tempo(t) if t.bpm == 120 && t.ticks_per_second == 960.0));
    assert!(matches!(
        &records[1],
        Decoded::TimeSignature { tick: 0, signature } if signature.to_string() == "4/4"
    ));
    match &records[2] {
        Decoded::KeySignature(key) => {
            assert_eq!(key.mode, KeyMode::Minor);
            assert_eq!(key.name(), "E_Minor");
        }
        other => panic!("expected key signature, got {other:?}"),
    }

    let notes: Vec<_> = records.iter().filter_map(Decoded::as_note).collect();
    let summary: Vec<_> = notes
        .iter()
        .map(|n| (n.notation().to_string(), n.symbol.dynamic, n.duration))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("C4".to_string(), Dynamic::P, 1.0),
            ("D4".to_string(), Dynamic::F, 0.5),
            ("E4".to_string(), Dynamic::Fff, 0.5),
        ]
    );
    assert!(notes.iter().all(|n| n.symbol.clef == Clef::Treble && n.terminated));
    assert_eq!(records.last(), Some(&Decoded::EndOfTrack { tick: 960 }));
}

#[test]
fn stacked_repeats_pair_oldest_first() {
    let catalogs = Catalogs::builtin().unwrap();
    let events = vec![on(0, 0, 60, 80), on(10, 0, 60, 80), off(100, 0, 60), off(200, 0, 60)];

    let records = decode_track(&catalogs, PPQ, events).unwrap();
    let spans: Vec<_> = records
        .iter()
        .filter_map(Decoded::as_note)
        .map(|n| (n.start_tick, n.stop_tick))
        .collect();
    assert_eq!(spans, vec![(0, 100), (10, 200)]);
}

#[test]
fn stray_note_off_produces_nothing() {
    let catalogs = Catalogs::builtin().unwrap();
    let mut tracker = NoteTracker::new(&catalogs);

    let out = tracker.process(off(50, 3, 70), PPQ).unwrap();
    assert!(out.is_empty());
    assert_eq!(tracker.stray_note_offs(), 1);
}

#[test]
fn track_without_end_marker_still_flushes() {
    let catalogs = Catalogs::builtin().unwrap();
    let records = decode_track(&catalogs, PPQ, vec![on(0, 0, 36, 60), on(240, 0, 40, 60)]).unwrap();

    let notes: Vec<_> = records.iter().filter_map(Decoded::as_note).collect();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| !n.terminated && n.duration == 0.0));
    assert!(notes.iter().all(|n| n.symbol.clef == Clef::Bass));
}

#[test]
fn trackers_do_not_share_open_notes() {
    let catalogs = Catalogs::builtin().unwrap();
    let mut first = NoteTracker::new(&catalogs);
    let mut second = NoteTracker::new(&catalogs);

    first.process(on(0, 0, 60, 80), PPQ).unwrap();
    let out = second.process(off(480, 0, 60), PPQ).unwrap();

    assert!(out.is_empty());
    assert_eq!(first.open_count(), 1);
    assert_eq!(second.stray_note_offs(), 1);
}

#[test]
fn fixture_tables_drive_names() {
    let catalogs = fixture_catalogs();
    let events = vec![
        TrackEvent::new(
            0,
            EventKind::ControlChange {
                channel: 3,
                code: 64,
                value: 30,
            },
        ),
        TrackEvent::new(
            0,
            EventKind::ControlChange {
                channel: 1,
                code: 9,
                value: 30,
            },
        ),
        on(0, 1, 55, 70),
        off(960, 1, 55),
        TrackEvent::new(960, EventKind::KeySignature(vec![0xFF, 1])),
    ];

    let records = decode_track(&catalogs, PPQ, events).unwrap();

    match &records[0] {
        Decoded::ControlChange(cc) => {
            assert_eq!(cc.name, "Sustain");
            assert_eq!(cc.state, Some(SwitchState::Off));
            assert_eq!(cc.channel_name, "Cello");
        }
        other => panic!("expected control change, got {other:?}"),
    }
    assert!(matches!(&records[1], Decoded::ControlChange(cc) if cc.name == "UNDEFINED" && cc.state.is_none()));
    assert!(matches!(
        &records[2],
        Decoded::Note(n) if n.channel_name == "Violin_II" && n.duration == 2.0
    ));
    assert!(matches!(&records[3], Decoded::KeySignature(k) if k.name() == "d"));
}

#[test]
fn fixture_tables_reject_uncatalogued_values() {
    let catalogs = fixture_catalogs();

    // Pan is not in the pedals-only table
    let err = decode_track(
        &catalogs,
        PPQ,
        vec![TrackEvent::new(
            0,
            EventKind::ControlChange {
                channel: 0,
                code: 10,
                value: 64,
            },
        )],
    )
    .unwrap_err();
    assert!(matches!(err, Error::UnknownControlCode(10)));
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);

    // Two sharps are not in the three-key table
    let err = decode_track(&catalogs, PPQ, vec![TrackEvent::new(0, EventKind::KeySignature(vec![2, 0]))])
        .unwrap_err();
    assert!(matches!(err, Error::UnknownKeySignature { sharps: 2, flats: 0 }));
}

#[test]
fn ordering_faults_abort_the_track() {
    let catalogs = Catalogs::builtin().unwrap();
    let err = decode_track(&catalogs, PPQ, vec![on(500, 0, 60, 80), off(100, 0, 60)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ordering);
}

#[test]
fn clef_boundary_from_config() {
    let mut config = NoteConfig::default();
    config.notation.treble_switch = 55;
    let catalogs = Catalogs::from_config(&config).unwrap();

    let records = decode_track(&catalogs, PPQ, vec![on(0, 0, 55, 80), off(10, 0, 55)]).unwrap();
    assert!(matches!(&records[0], Decoded::Note(n) if n.symbol.clef == Clef::Treble));
}

#[test]
fn records_serialize_to_json() {
    let catalogs = Catalogs::builtin().unwrap();
    let records = decode_track(&catalogs, PPQ, vec![on(0, 0, 60, 80), off(480, 0, 60)]).unwrap();

    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["record"], "note");
    assert_eq!(json["notation"], "C4");
    assert_eq!(json["clef"], "TREBLE");
    assert_eq!(json["dynamic"], "mf");
    assert_eq!(json["duration"], 1.0);
}
