//! Note, frequency and recording to four-string bouzouki tablature.
//!
//! The core is a set of pure conversions: frequency ↔ MIDI note ↔ note
//! name ([`pitch`]), positions of a MIDI note on the neck ([`fretboard`]),
//! tablature construction ([`tablature`]) and a fret-jump advisor
//! ([`advisor`]). Everything instrument-specific lives in an
//! [`InstrumentProfile`] that is passed in explicitly.
//!
//! Around the core sit thin collaborators: a batch text parser
//! ([`batch`]), WAV pitch detection ([`audio`]), text rendering
//! ([`render`]) and Standard MIDI File export ([`midi_file`]).

#![warn(missing_docs)]

pub mod advisor;
pub mod audio;
pub mod batch;
pub mod fretboard;
pub mod midi_file;
pub mod pitch;
pub mod profile;
pub mod render;
pub mod tablature;

pub use advisor::{suggest_movements, Advisory};
pub use fretboard::{find_positions, Position};
pub use pitch::{
    frequency_to_midi, midi_to_frequency, midi_to_note_name, note_name_to_midi, Pitch, PitchError,
};
pub use profile::{InstrumentProfile, StringBase};
pub use tablature::{
    build_tablature, BuildOutcome, Observation, Placement, ResolvePolicy, TabEntry, TabError,
    Tablature, TablatureBuilder,
};
