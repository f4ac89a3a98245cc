//! Pitch conversion between frequency, MIDI note number and note name.
//!
//! MIDI note 69 is the reference pitch A4 at 440 Hz. Note names use the
//! sharp spelling of the twelve pitch classes (`C`, `C#`, ... `B`) followed
//! by a signed octave, so `C4` is 60 and `A4` is 69.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Reference frequency of A4 in Hz
pub const REFERENCE_FREQ: f64 = 440.0;

/// MIDI note number of the reference pitch (A4)
pub const REFERENCE_NOTE: i32 = 69;

/// Pitch class spellings indexed by `midi mod 12`
pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Errors raised by pitch conversion
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    /// Note text does not match `<A-G>[#]<octave>` with a sharp spelling from the pitch class table
    #[error("invalid note format: '{0}'")]
    InvalidNoteFormat(String),
    /// Frequency is zero, negative or not finite
    #[error("invalid frequency: {0} Hz")]
    InvalidFrequency(f64),
}

/// Convert a frequency in Hz to the nearest MIDI note number.
pub fn frequency_to_midi(freq: f64) -> Result<i32, PitchError> {
    if !freq.is_finite() || freq <= 0.0 {
        return Err(PitchError::InvalidFrequency(freq));
    }
    let midi = REFERENCE_NOTE as f64 + 12.0 * (freq / REFERENCE_FREQ).log2();
    Ok(midi.round() as i32)
}

/// Full precision frequency of a MIDI note number.
pub fn midi_to_frequency_exact(midi: i32) -> f64 {
    REFERENCE_FREQ * 2.0_f64.powf((midi as f64 - REFERENCE_NOTE as f64) / 12.0)
}

/// Frequency of a MIDI note number rounded to 2 decimals for display.
pub fn midi_to_frequency(midi: i32) -> f64 {
    (midi_to_frequency_exact(midi) * 100.0).round() / 100.0
}

/// Parse a note name such as `A4`, `F#3` or `C-1` into a MIDI note number.
pub fn note_name_to_midi(name: &str) -> Result<i32, PitchError> {
    name.parse::<NoteName>().map(|note| note.midi())
}

/// Spell a MIDI note number as a note name, e.g. 69 -> `A4`.
pub fn midi_to_note_name(midi: i32) -> String {
    NoteName::from_midi(midi).to_string()
}

/// A pitch class and octave, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteName {
    /// Index into [`PITCH_CLASSES`], always in 0..12
    pitch_class: u8,
    octave: i32,
}

impl NoteName {
    /// Note name for a MIDI note number.
    pub fn from_midi(midi: i32) -> Self {
        Self {
            pitch_class: midi.rem_euclid(12) as u8,
            octave: midi.div_euclid(12) - 1,
        }
    }

    /// MIDI note number of this note.
    pub fn midi(&self) -> i32 {
        (self.pitch_class as i64 + 12 * (self.octave as i64 + 1)) as i32
    }

    /// Index of the pitch class, 0 for `C` through 11 for `B`.
    pub fn pitch_class(&self) -> u8 {
        self.pitch_class
    }

    /// Octave number, 4 for the octave starting at middle C.
    pub fn octave(&self) -> i32 {
        self.octave
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PITCH_CLASSES[self.pitch_class as usize], self.octave)
    }
}

impl FromStr for NoteName {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PitchError::InvalidNoteFormat(s.to_string());
        let text = s.trim();

        let letter = text.chars().next().ok_or_else(invalid)?;
        if !('A'..='G').contains(&letter) {
            return Err(invalid());
        }

        let (spelling, octave_str) = if text[1..].starts_with('#') {
            (&text[..2], &text[2..])
        } else {
            (&text[..1], &text[1..])
        };

        // Only `-?[0-9]+` is an octave; `str::parse` alone would also take a leading `+`.
        let digits = octave_str.strip_prefix('-').unwrap_or(octave_str);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i32 = octave_str.parse().map_err(|_| invalid())?;

        // E#/B# pass the letter check but have no entry in the sharp table.
        let pitch_class = PITCH_CLASSES
            .iter()
            .position(|&pc| pc == spelling)
            .ok_or_else(invalid)?;

        // Reject octaves whose MIDI number would not fit
        let midi = pitch_class as i64 + 12 * (octave as i64 + 1);
        i32::try_from(midi).map_err(|_| invalid())?;

        Ok(Self {
            pitch_class: pitch_class as u8,
            octave,
        })
    }
}

/// A pitch as supplied by a caller: either a note name or a frequency.
///
/// Serializes as the bare note text or the bare number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Pitch {
    /// Note name text, parsed on resolution
    Note(String),
    /// Frequency in Hz
    Frequency(f64),
}

impl Pitch {
    /// Resolve to a MIDI note number.
    pub fn resolve(&self) -> Result<i32, PitchError> {
        match self {
            Pitch::Note(name) => note_name_to_midi(name),
            Pitch::Frequency(freq) => frequency_to_midi(*freq),
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pitch::Note(name) => write!(f, "{}", name.trim()),
            Pitch::Frequency(freq) => write!(f, "{} Hz", freq),
        }
    }
}
