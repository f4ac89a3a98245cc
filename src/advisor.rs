//! Movement advisor: flags large fret jumps between consecutive playable notes.
//!
//! This is a fixed-threshold notice, not a search for alternative
//! positions. Unplayable entries are transparent: they neither trigger an
//! advisory nor reset the last fret.

use std::fmt;

use crate::tablature::Tablature;

/// A jump larger than the threshold
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advisory {
    /// Index of the entry that jumps
    pub index: usize,
    /// Label of that entry
    pub label: String,
    /// Fret of the previous playable entry
    pub from_fret: u8,
    /// Fret of this entry
    pub to_fret: u8,
}

impl Advisory {
    /// Size of the jump in frets
    pub fn distance(&self) -> u8 {
        self.from_fret.abs_diff(self.to_fret)
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Play {} on another string to reduce movement (fret {} → {})",
            self.label, self.from_fret, self.to_fret
        )
    }
}

/// Scan the tablature once, in order, and report every jump of more than `threshold` frets.
pub fn suggest_movements(tab: &Tablature, threshold: u8) -> Vec<Advisory> {
    let mut last_fret: Option<u8> = None;
    let mut advisories = Vec::new();

    for (index, entry) in tab.iter().enumerate() {
        let Some(fret) = entry.placement.fret() else {
            continue;
        };

        if let Some(last) = last_fret {
            if last.abs_diff(fret) > threshold {
                advisories.push(Advisory {
                    index,
                    label: entry.label.clone(),
                    from_fret: last,
                    to_fret: fret,
                });
            }
        }
        last_fret = Some(fret);
    }

    advisories
}
