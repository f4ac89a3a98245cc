//! End-to-end scenarios through the public API

use tetratab::batch::{parse_batch, parse_batch_with, BatchError};
use tetratab::render::render_listing;
use tetratab::{
    build_tablature, find_positions, midi_to_frequency, note_name_to_midi, suggest_movements,
    InstrumentProfile, Observation, PitchError, Placement, ResolvePolicy, TabError,
    TablatureBuilder,
};

#[test]
fn test_a4_to_frequency() {
    let midi = note_name_to_midi("A4").unwrap();
    assert_eq!(midi, 69);
    assert_eq!(midi_to_frequency(midi), 440.0);
}

#[test]
fn test_a4_positions_on_bouzouki() {
    let profile = InstrumentProfile::default();
    let positions: Vec<(String, u8)> = find_positions(&profile, 69)
        .into_iter()
        .map(|p| (p.string, p.fret))
        .collect();
    assert_eq!(positions, [("Λα".to_string(), 12), ("Ρε".to_string(), 7)]);
}

#[test]
fn test_batch_to_listing() {
    let profile = InstrumentProfile::default();
    let observations = parse_batch("D4,0.5; F#4,1.0; A4,0.25").unwrap();
    let durations: Vec<f64> = observations.iter().map(|o| o.duration).collect();
    assert_eq!(durations, [0.5, 1.0, 0.25]);

    let tab = build_tablature(&profile, &observations).unwrap();
    assert_eq!(tab.len(), 3);
    assert_eq!(
        render_listing(&tab),
        "D4 → string: Φα, fret: 9, duration: 0.5\n\
         F#4 → string: Λα, fret: 9, duration: 1.0\n\
         A4 → string: Λα, fret: 12, duration: 0.25\n"
    );

    // Φα 9 → Λα 9 → Λα 12: no jump over 5 frets
    assert!(suggest_movements(&tab, profile.movement_threshold).is_empty());
}

#[test]
fn test_lenient_batch_keeps_parsed_entries() {
    let profile = InstrumentProfile::default();
    let (observations, malformed) =
        parse_batch_with("D4,0.5; oops; A4,1", ResolvePolicy::Lenient).unwrap();
    assert_eq!(
        malformed,
        [BatchError::MalformedEntry {
            index: 1,
            entry: "oops".to_string()
        }]
    );

    let outcome = TablatureBuilder::new(&profile, ResolvePolicy::Lenient)
        .build(&observations)
        .unwrap();
    assert!(outcome.rejected.is_empty());
    assert_eq!(
        render_listing(&outcome.tablature),
        "D4 → string: Φα, fret: 9, duration: 0.5\n\
         A4 → string: Λα, fret: 12, duration: 1.0\n"
    );

    assert!(parse_batch_with("D4,0.5; oops; A4,1", ResolvePolicy::Strict).is_err());
}

#[test]
fn test_jump_from_open_to_eighth_fret() {
    let profile = InstrumentProfile::default();
    let tab = build_tablature(
        &profile,
        &[Observation::note("C3", 1.0), Observation::note("G#3", 1.0)],
    )
    .unwrap();
    let frets: Vec<Option<u8>> = tab.iter().map(|e| e.placement.fret()).collect();
    assert_eq!(frets, [Some(0), Some(8)]);

    let advisories = suggest_movements(&tab, profile.movement_threshold);
    assert_eq!(advisories.len(), 1);
    assert_eq!(advisories[0].index, 1);
}

#[test]
fn test_invalid_letter() {
    assert_eq!(
        note_name_to_midi("H5"),
        Err(PitchError::InvalidNoteFormat("H5".to_string()))
    );

    let profile = InstrumentProfile::default();
    let observations = parse_batch("D4,1; H5,1").unwrap();
    assert!(matches!(
        build_tablature(&profile, &observations),
        Err(TabError::Observation { index: 1, .. })
    ));
}

#[test]
fn test_output_length_matches_input() {
    let profile = InstrumentProfile::default();
    let observations: Vec<Observation> = (0..=127)
        .map(|midi| Observation::frequency(midi_to_frequency(midi), 0.5))
        .chain(["Bb3", "X", "A#3"].iter().map(|n| Observation::note(*n, 1.0)))
        .collect();

    let outcome = TablatureBuilder::new(&profile, ResolvePolicy::Lenient)
        .build(&observations)
        .unwrap();
    assert_eq!(outcome.tablature.len(), observations.len());
    assert_eq!(outcome.rejected.len(), 2);

    let (low, high) = profile.playable_range().unwrap();
    for (midi, entry) in (0..=127).zip(outcome.tablature.iter()) {
        assert_eq!(entry.midi, Some(midi));
        let reachable = (low..=high).contains(&midi);
        assert_eq!(entry.is_playable(), reachable, "midi {}", midi);
        if !reachable {
            assert_eq!(entry.placement, Placement::Unplayable);
        }
    }
}

#[test]
fn test_custom_profile_is_respected() {
    let profile = InstrumentProfile::from_json_str(
        r#"{
            "strings": [
                { "name": "D", "open_midi": 50 },
                { "name": "A", "open_midi": 57 },
                { "name": "D'", "open_midi": 62 }
            ],
            "fret_span": 5,
            "movement_threshold": 2
        }"#,
    )
    .unwrap();

    let tab = build_tablature(
        &profile,
        &[
            Observation::note("D3", 1.0),
            Observation::note("G3", 1.0),
            Observation::note("B3", 1.0),
            Observation::note("C5", 1.0),
        ],
    )
    .unwrap();

    let placements: Vec<(Option<&str>, Option<u8>)> = tab
        .iter()
        .map(|e| (e.placement.string(), e.placement.fret()))
        .collect();
    assert_eq!(
        placements,
        [
            (Some("D"), Some(0)),
            (Some("D"), Some(5)),
            (Some("A"), Some(2)),
            (None, None),
        ]
    );

    // 0 → 5 fires, 5 → 2 fires with threshold 2
    assert_eq!(suggest_movements(&tab, profile.movement_threshold).len(), 2);
}
