//! Fretboard geometry: where a MIDI note can be played.

use serde::Serialize;

use crate::profile::InstrumentProfile;

/// A playable spot on the neck
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Position {
    /// Index of the string in the profile's declaration order
    pub string_index: usize,
    /// String name
    pub string: String,
    /// Fret number, 0 for the open string
    pub fret: u8,
}

/// Every position where `midi` can be played, in string declaration order.
///
/// A string is included when `0 <= midi - open <= fret_span`. No preference
/// among the results is expressed; callers choose.
pub fn find_positions(profile: &InstrumentProfile, midi: i32) -> Vec<Position> {
    profile
        .strings
        .iter()
        .enumerate()
        .filter_map(|(string_index, base)| {
            let fret = midi as i64 - base.open_midi as i64;
            (0..=profile.fret_span as i64)
                .contains(&fret)
                .then(|| Position {
                    string_index,
                    string: base.name.clone(),
                    fret: fret as u8,
                })
        })
        .collect()
}
