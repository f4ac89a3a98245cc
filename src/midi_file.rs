//! Standard MIDI File export of a tablature.
//!
//! Output is a format 0 file with one track at 480 ticks per quarter note.
//! Every entry with a MIDI note becomes a note-on immediately followed by a
//! note-off `round(duration * 480)` ticks later, both at velocity 64.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

use crate::tablature::Tablature;

/// Ticks per duration unit (one quarter note)
pub const TICKS_PER_UNIT: u16 = 480;

/// Velocity used for every note-on and note-off
pub const NOTE_VELOCITY: u8 = 64;

// Largest value a variable-length quantity can hold
const MAX_VLQ: u32 = 0x0FFF_FFFF;

/// One note of the exported track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteEvent {
    /// MIDI note number
    pub note: u8,
    /// Length in ticks
    pub ticks: u32,
}

/// A single-track MIDI export
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MidiExport {
    /// Notes in performance order
    pub notes: Vec<NoteEvent>,
}

impl MidiExport {
    /// Convert tablature entries, skipping entries without a MIDI note in 0..=127
    pub fn from_tablature(tab: &Tablature) -> Self {
        let notes = tab
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let Some(note) = entry
                    .midi
                    .and_then(|m| u8::try_from(m).ok())
                    .filter(|&m| m <= 127)
                else {
                    warn!(
                        "entry {} ({}) has no exportable MIDI note, skipping",
                        index, entry.label
                    );
                    return None;
                };
                let ticks = (entry.duration * TICKS_PER_UNIT as f64).round();
                let ticks = if ticks.is_finite() && ticks > 0.0 {
                    (ticks as u64).min(MAX_VLQ as u64) as u32
                } else {
                    0
                };
                Some(NoteEvent { note, ticks })
            })
            .collect();

        Self { notes }
    }

    /// Serialize to a complete MIDI file
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.track_chunk();

        let mut out = Vec::with_capacity(22 + track.len());
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // one track
        out.extend_from_slice(&TICKS_PER_UNIT.to_be_bytes());

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    /// Write the file to `path`
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())
            .with_context(|| format!("Failed to write MIDI file '{}'", path.display()))
    }

    fn track_chunk(&self) -> Vec<u8> {
        let mut t = Vec::with_capacity(self.notes.len() * 8 + 4);

        for note in &self.notes {
            t.push(0x00);
            t.extend_from_slice(&[0x90, note.note, NOTE_VELOCITY]);

            write_vlq(&mut t, note.ticks);
            t.extend_from_slice(&[0x80, note.note, NOTE_VELOCITY]);
        }

        // End of track
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 4];
    let mut i = 3;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 && i > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}
