//! Instrument tuning profile
//!
//! The open strings, the playable fret span and the movement threshold are
//! carried together as one immutable value that is handed to the fretboard,
//! tablature and advisor code. The default profile is the four-string
//! (tetrachord) bouzouki tuned C3 F3 A3 D4.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest fret reachable on the default instrument
pub const DEFAULT_FRET_SPAN: u8 = 12;

/// Fret distance above which the movement advisor speaks up
pub const DEFAULT_MOVEMENT_THRESHOLD: u8 = 5;

/// One open string: display name and MIDI note of the unfretted pitch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringBase {
    /// Name shown in tablature and diagrams
    pub name: String,

    /// MIDI note number of the open string
    pub open_midi: i32,
}

impl StringBase {
    /// Create a string definition
    pub fn new(name: impl Into<String>, open_midi: i32) -> Self {
        Self {
            name: name.into(),
            open_midi,
        }
    }
}

/// Errors raised while loading or validating a profile
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile file could not be read
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),
    /// Profile JSON is malformed
    #[error("failed to parse profile: {0}")]
    Json(#[from] serde_json::Error),
    /// Profile declares no strings
    #[error("profile has no strings")]
    NoStrings,
    /// Two strings share a name
    #[error("duplicate string name '{0}'")]
    DuplicateString(String),
    /// Open string pitch outside the MIDI range
    #[error("open pitch {midi} of string '{name}' is outside 0..=127")]
    OpenPitchOutOfRange {
        /// String name
        name: String,
        /// Offending MIDI note
        midi: i32,
    },
}

/// Immutable description of the instrument being tabbed
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    /// Open strings in declaration order; position search follows this order
    pub strings: Vec<StringBase>,

    /// Highest playable fret, inclusive
    #[serde(default = "default_fret_span")]
    pub fret_span: u8,

    /// Jumps larger than this many frets trigger a movement advisory
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: u8,
}

fn default_fret_span() -> u8 {
    DEFAULT_FRET_SPAN
}

fn default_movement_threshold() -> u8 {
    DEFAULT_MOVEMENT_THRESHOLD
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Self::tetrachord_bouzouki()
    }
}

impl InstrumentProfile {
    /// Four-string bouzouki: Ντο (C3), Φα (F3), Λα (A3), Ρε (D4)
    pub fn tetrachord_bouzouki() -> Self {
        Self {
            strings: vec![
                StringBase::new("Ντο", 48),
                StringBase::new("Φα", 53),
                StringBase::new("Λα", 57),
                StringBase::new("Ρε", 62),
            ],
            fret_span: DEFAULT_FRET_SPAN,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
        }
    }

    /// Parse and validate a profile from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a profile from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the invariants the rest of the crate relies on
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.strings.is_empty() {
            return Err(ProfileError::NoStrings);
        }

        let mut seen = HashSet::new();
        for string in &self.strings {
            if !seen.insert(string.name.as_str()) {
                return Err(ProfileError::DuplicateString(string.name.clone()));
            }
            if !(0..=127).contains(&string.open_midi) {
                return Err(ProfileError::OpenPitchOutOfRange {
                    name: string.name.clone(),
                    midi: string.open_midi,
                });
            }
        }

        Ok(())
    }

    /// Look up a string by name
    pub fn string(&self, name: &str) -> Option<&StringBase> {
        self.strings.iter().find(|s| s.name == name)
    }

    /// Lowest and highest MIDI notes reachable on any string
    pub fn playable_range(&self) -> Option<(i32, i32)> {
        let lowest = self.strings.iter().map(|s| s.open_midi).min()?;
        let highest = self.strings.iter().map(|s| s.open_midi).max()?;
        Some((lowest, highest + self.fret_span as i32))
    }
}
