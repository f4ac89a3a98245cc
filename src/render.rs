//! Text rendering of tablature: listing lines, a printable document and
//! fretboard diagrams.

use std::collections::BTreeSet;

use crate::fretboard::find_positions;
use crate::profile::InstrumentProfile;
use crate::tablature::{Placement, TabEntry, Tablature};

/// Placeholder printed where an unplayable entry has no string or fret
pub const UNPLAYABLE_MARK: &str = "—";

/// Title and signature block of a printed tablature
#[derive(Clone, Debug, PartialEq)]
pub struct Cover {
    /// Document title
    pub title: String,
    /// Free-form date text
    pub date: Option<String>,
    /// Author or performer
    pub signature: Option<String>,
}

impl Default for Cover {
    fn default() -> Self {
        Self {
            title: "Tablature for Four-String Bouzouki".to_string(),
            date: None,
            signature: None,
        }
    }
}

/// One line per entry: `<label> → string: <s>, fret: <f>, duration: <d>`
///
/// Durations always carry a decimal point (`1.0`, not `1`).
pub fn tab_line(entry: &TabEntry) -> String {
    let string = entry.placement.string().unwrap_or(UNPLAYABLE_MARK);
    let fret = entry
        .placement
        .fret()
        .map(|f| f.to_string())
        .unwrap_or_else(|| UNPLAYABLE_MARK.to_string());

    format!(
        "{} → string: {}, fret: {}, duration: {:?}",
        entry.label, string, fret, entry.duration
    )
}

/// Every entry's line, in order
pub fn render_listing(tab: &Tablature) -> String {
    let mut ret = String::new();
    for entry in tab {
        ret.push_str(&tab_line(entry));
        ret.push('\n');
    }
    ret
}

/// Printable document: title, listing, cover block and a diagram of every played position
pub fn render_document(profile: &InstrumentProfile, tab: &Tablature, cover: &Cover) -> String {
    let mut ret = String::new();
    ret.push_str(&format!("{}\n", cover.title));
    ret.push_str(&format!("{}\n\n", "=".repeat(cover.title.chars().count())));

    ret.push_str(&render_listing(tab));

    ret.push_str("\nCover\n-----\n");
    ret.push_str(&format!("Title: {}\n", cover.title));
    ret.push_str(&format!("Date: {}\n", cover.date.as_deref().unwrap_or("")));
    ret.push_str(&format!(
        "Signature: {}\n",
        cover.signature.as_deref().unwrap_or("")
    ));

    ret.push('\n');
    ret.push_str(&render_fretboard(profile, tab));
    ret
}

/// Diagram of every position where `midi` can be played
pub fn render_positions(profile: &InstrumentProfile, midi: i32) -> String {
    let marks: BTreeSet<_> = find_positions(profile, midi)
        .into_iter()
        .map(|p| (p.string_index, p.fret))
        .collect();
    render_grid(profile, &marks)
}

/// Diagram of every position used by the tablature
pub fn render_fretboard(profile: &InstrumentProfile, tab: &Tablature) -> String {
    let marks: BTreeSet<_> = tab
        .iter()
        .filter_map(|entry| match &entry.placement {
            Placement::Played {
                string_index, fret, ..
            } => Some((*string_index, *fret)),
            Placement::Unplayable => None,
        })
        .collect();
    render_grid(profile, &marks)
}

// Highest string on top, frets 0..=fret_span left to right
fn render_grid(profile: &InstrumentProfile, marks: &BTreeSet<(usize, u8)>) -> String {
    let name_width = profile
        .strings
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0);

    let mut ret = format!("{:width$} ", "", width = name_width);
    for fret in 0..=profile.fret_span {
        ret.push_str(&format!("{:>3}", fret));
    }
    ret.push('\n');

    for (index, string) in profile.strings.iter().enumerate().rev() {
        ret.push_str(&format!("{:<width$} ", string.name, width = name_width));
        for fret in 0..=profile.fret_span {
            let cell = if marks.contains(&(index, fret)) { "●" } else { "·" };
            ret.push_str(&format!("{:>3}", cell));
        }
        ret.push('\n');
    }

    ret
}
