//! Parser for typed note batches such as `D4,0.5; F#4,1.0; A4,0.25`.
//!
//! Entries are separated by `;`, and each entry is `pitch,duration`.
//! Whitespace around tokens is ignored, as are empty entries (a trailing
//! `;`). A pitch that parses as a number is taken as a frequency in Hz.

use thiserror::Error;

use crate::pitch::Pitch;
use crate::tablature::{Observation, ResolvePolicy};

/// Problems with one batch entry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    /// Entry does not split into exactly two comma separated fields
    #[error("entry {index} '{entry}' is not of the form note,duration")]
    MalformedEntry {
        /// Position among the non-empty entries
        index: usize,
        /// Entry text, trimmed
        entry: String,
    },
    /// Duration is not a finite positive number
    #[error("entry {index} has invalid duration '{duration}'")]
    InvalidDuration {
        /// Position among the non-empty entries
        index: usize,
        /// Duration text, trimmed
        duration: String,
    },
}

/// Parse a batch, failing on the first bad entry.
pub fn parse_batch(text: &str) -> Result<Vec<Observation>, BatchError> {
    entries(text)
        .map(|(index, entry)| parse_entry(index, entry))
        .collect()
}

/// Parse a batch, keeping every good entry and collecting the errors.
pub fn parse_batch_lenient(text: &str) -> (Vec<Observation>, Vec<BatchError>) {
    let mut observations = Vec::new();
    let mut errors = Vec::new();

    for (index, entry) in entries(text) {
        match parse_entry(index, entry) {
            Ok(observation) => observations.push(observation),
            Err(e) => errors.push(e),
        }
    }

    (observations, errors)
}

/// Parse a batch under `policy`.
///
/// Strict fails on the first bad entry. Lenient never fails and returns the
/// rejected entries next to the observations that did parse.
pub fn parse_batch_with(
    text: &str,
    policy: ResolvePolicy,
) -> Result<(Vec<Observation>, Vec<BatchError>), BatchError> {
    match policy {
        ResolvePolicy::Strict => parse_batch(text).map(|observations| (observations, Vec::new())),
        ResolvePolicy::Lenient => Ok(parse_batch_lenient(text)),
    }
}

fn entries(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
}

fn parse_entry(index: usize, entry: &str) -> Result<Observation, BatchError> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    let [pitch, duration] = fields[..] else {
        return Err(BatchError::MalformedEntry {
            index,
            entry: entry.to_string(),
        });
    };

    if pitch.is_empty() {
        return Err(BatchError::MalformedEntry {
            index,
            entry: entry.to_string(),
        });
    }

    let invalid_duration = || BatchError::InvalidDuration {
        index,
        duration: duration.to_string(),
    };
    let duration_value: f64 = duration.parse().map_err(|_| invalid_duration())?;
    if !duration_value.is_finite() || duration_value <= 0.0 {
        return Err(invalid_duration());
    }

    let pitch = match pitch.parse::<f64>() {
        Ok(freq) => Pitch::Frequency(freq),
        Err(_) => Pitch::Note(pitch.to_string()),
    };

    Ok(Observation {
        pitch,
        duration: duration_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_entries() {
        let observations = parse_batch("D4,0.5; F#4,1.0; A4,0.25").unwrap();
        assert_eq!(
            observations,
            [
                Observation::note("D4", 0.5),
                Observation::note("F#4", 1.0),
                Observation::note("A4", 0.25),
            ]
        );
    }

    #[test]
    fn test_whitespace_and_trailing_separator() {
        let observations = parse_batch("  D4 , 0.5 ;\n A4,2 ; ").unwrap();
        assert_eq!(
            observations,
            [Observation::note("D4", 0.5), Observation::note("A4", 2.0)]
        );
        assert!(parse_batch("").unwrap().is_empty());
    }

    #[test]
    fn test_frequency_entries() {
        let observations = parse_batch("440,1; 261.63, 0.5").unwrap();
        assert_eq!(
            observations,
            [
                Observation::frequency(440.0, 1.0),
                Observation::frequency(261.63, 0.5),
            ]
        );
    }

    #[test]
    fn test_malformed_entries() {
        assert_eq!(
            parse_batch("D4,0.5; F#4"),
            Err(BatchError::MalformedEntry {
                index: 1,
                entry: "F#4".into()
            })
        );
        assert!(matches!(
            parse_batch("D4,0.5,1"),
            Err(BatchError::MalformedEntry { index: 0, .. })
        ));
        assert!(matches!(
            parse_batch(",1.0"),
            Err(BatchError::MalformedEntry { index: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_durations() {
        for text in ["D4,abc", "D4,0", "D4,-1", "D4,inf", "D4,NaN", "D4,"] {
            assert!(
                matches!(parse_batch(text), Err(BatchError::InvalidDuration { .. })),
                "expected InvalidDuration for {:?}",
                text
            );
        }
    }

    #[test]
    fn test_note_syntax_is_not_checked_here() {
        // Note names are resolved by the tablature builder
        assert_eq!(
            parse_batch("H5,1").unwrap(),
            [Observation::note("H5", 1.0)]
        );
    }

    #[test]
    fn test_lenient_keeps_good_entries() {
        let (observations, errors) = parse_batch_lenient("D4,0.5; oops; A4,x; F#4,1");
        assert_eq!(
            observations,
            [Observation::note("D4", 0.5), Observation::note("F#4", 1.0)]
        );
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], BatchError::MalformedEntry { index: 1, .. }));
        assert!(matches!(errors[1], BatchError::InvalidDuration { index: 2, .. }));
    }

    #[test]
    fn test_policy_selects_parser() {
        let text = "D4,0.5; oops; A4,1";
        assert!(matches!(
            parse_batch_with(text, ResolvePolicy::Strict),
            Err(BatchError::MalformedEntry { index: 1, .. })
        ));

        let (observations, errors) = parse_batch_with(text, ResolvePolicy::Lenient).unwrap();
        assert_eq!(
            observations,
            [Observation::note("D4", 0.5), Observation::note("A4", 1.0)]
        );
        assert_eq!(errors.len(), 1);

        let (observations, errors) =
            parse_batch_with("D4,0.5; A4,1", ResolvePolicy::Strict).unwrap();
        assert_eq!(observations.len(), 2);
        assert!(errors.is_empty());
    }
}
