//! Tablature construction
//!
//! Each observation (a pitch and a duration) becomes exactly one
//! [`TabEntry`], in input order. The first position in string declaration
//! order is chosen; notes that no string can reach are kept with the
//! [`Placement::Unplayable`] sentinel.
//!
//! What happens to an observation whose pitch cannot be resolved is decided
//! by [`ResolvePolicy`]: `Strict` aborts the whole batch, `Lenient` keeps an
//! unplayable entry in its place and reports the rejection alongside the
//! tablature.

use log::{debug, warn};
use serde::Serialize;
use thiserror::Error;

use crate::fretboard::find_positions;
use crate::pitch::{midi_to_frequency, midi_to_note_name, Pitch, PitchError};
use crate::profile::InstrumentProfile;

/// One input to the builder: a pitch and how long it sounds
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    /// Note name or frequency
    pub pitch: Pitch,
    /// Duration in arbitrary positive units (1.0 per detected audio note)
    pub duration: f64,
}

impl Observation {
    /// Observation of a note name
    pub fn note(name: impl Into<String>, duration: f64) -> Self {
        Self {
            pitch: Pitch::Note(name.into()),
            duration,
        }
    }

    /// Observation of a frequency in Hz
    pub fn frequency(freq: f64, duration: f64) -> Self {
        Self {
            pitch: Pitch::Frequency(freq),
            duration,
        }
    }
}

/// Where an entry is played
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// On a string at a fret
    Played {
        /// Index of the string in the profile
        string_index: usize,
        /// String name
        string: String,
        /// Fret number
        fret: u8,
    },
    /// Out of reach on every string, or the pitch could not be resolved
    Unplayable,
}

impl Placement {
    /// Fret, if the entry is playable
    pub fn fret(&self) -> Option<u8> {
        match self {
            Placement::Played { fret, .. } => Some(*fret),
            Placement::Unplayable => None,
        }
    }

    /// String name, if the entry is playable
    pub fn string(&self) -> Option<&str> {
        match self {
            Placement::Played { string, .. } => Some(string),
            Placement::Unplayable => None,
        }
    }
}

/// A single line of tablature
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TabEntry {
    /// Display label: the resolved note name, or the raw input if it could not be resolved
    pub label: String,
    /// The observation's pitch as given, before snapping to a MIDI note
    pub source: Pitch,
    /// MIDI note, when the pitch resolved
    pub midi: Option<i32>,
    /// Frequency of `midi` rounded to 2 decimals
    pub frequency: Option<f64>,
    /// String and fret, or the unplayable sentinel
    pub placement: Placement,
    /// Duration carried over from the observation
    pub duration: f64,
}

impl TabEntry {
    /// True unless the entry carries the unplayable sentinel
    pub fn is_playable(&self) -> bool {
        self.placement != Placement::Unplayable
    }
}

/// Ordered tablature; order is performance order and never changes
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Tablature {
    entries: Vec<TabEntry>,
}

impl Tablature {
    /// Entries in performance order
    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, TabEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Tablature {
    type Item = &'a TabEntry;
    type IntoIter = std::slice::Iter<'a, TabEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// What to do with an observation whose pitch does not resolve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResolvePolicy {
    /// Fail the whole batch on the first bad observation
    #[default]
    Strict,
    /// Keep an unplayable entry and record the rejection
    Lenient,
}

/// Build failure under [`ResolvePolicy::Strict`]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TabError {
    /// Observation at `index` could not be resolved
    #[error("observation {index}: {source}")]
    Observation {
        /// Position of the observation in the input
        index: usize,
        /// Conversion failure
        #[source]
        source: PitchError,
    },
}

/// An observation dropped to the unplayable sentinel under [`ResolvePolicy::Lenient`]
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position of the observation in the input
    pub index: usize,
    /// Why it did not resolve
    pub error: PitchError,
}

/// Result of a build: the tablature plus any lenient rejections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOutcome {
    /// One entry per observation
    pub tablature: Tablature,
    /// Observations that could not be resolved (always empty in strict mode)
    pub rejected: Vec<Rejection>,
}

/// Turns observations into tablature for one instrument profile
#[derive(Clone, Debug)]
pub struct TablatureBuilder<'a> {
    profile: &'a InstrumentProfile,
    policy: ResolvePolicy,
}

impl<'a> TablatureBuilder<'a> {
    /// Create a builder
    pub fn new(profile: &'a InstrumentProfile, policy: ResolvePolicy) -> Self {
        Self { profile, policy }
    }

    /// Policy in effect
    pub fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Build one entry per observation, in order
    pub fn build(&self, observations: &[Observation]) -> Result<BuildOutcome, TabError> {
        let mut entries = Vec::with_capacity(observations.len());
        let mut rejected = Vec::new();

        for (index, observation) in observations.iter().enumerate() {
            match observation.pitch.resolve() {
                Ok(midi) => entries.push(self.entry_for(observation, midi)),
                Err(error) => match self.policy {
                    ResolvePolicy::Strict => {
                        return Err(TabError::Observation {
                            index,
                            source: error,
                        })
                    }
                    ResolvePolicy::Lenient => {
                        warn!("observation {}: {}; keeping it as unplayable", index, error);
                        entries.push(TabEntry {
                            label: observation.pitch.to_string(),
                            source: observation.pitch.clone(),
                            midi: None,
                            frequency: None,
                            placement: Placement::Unplayable,
                            duration: observation.duration,
                        });
                        rejected.push(Rejection { index, error });
                    }
                },
            }
        }

        Ok(BuildOutcome {
            tablature: Tablature { entries },
            rejected,
        })
    }

    fn entry_for(&self, observation: &Observation, midi: i32) -> TabEntry {
        let label = midi_to_note_name(midi);

        let placement = match find_positions(self.profile, midi).into_iter().next() {
            Some(position) => Placement::Played {
                string_index: position.string_index,
                string: position.string,
                fret: position.fret,
            },
            None => Placement::Unplayable,
        };
        debug!("{} (midi {}) -> {:?}", label, midi, placement);

        TabEntry {
            label,
            source: observation.pitch.clone(),
            midi: Some(midi),
            frequency: Some(midi_to_frequency(midi)),
            placement,
            duration: observation.duration,
        }
    }
}

/// Build with [`ResolvePolicy::Strict`]
pub fn build_tablature(
    profile: &InstrumentProfile,
    observations: &[Observation],
) -> Result<Tablature, TabError> {
    TablatureBuilder::new(profile, ResolvePolicy::Strict)
        .build(observations)
        .map(|outcome| outcome.tablature)
}
