//! Note names and equal-temperament pitch math.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Frequency of C0 in Hz, the anchor of the equal-temperament ladder.
pub const C0_FREQUENCY: f64 = 16.35;

/// Errors from note construction and parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("invalid note name: '{0}'")]
    InvalidNoteName(String),

    #[error("invalid octave in note spec: '{0}'")]
    InvalidOctave(String),
}

/// Semitone index of a pitch-class name within the octave.
///
/// Enharmonic aliases map to the same index (C# and Db are the same key).
fn pitch_class_index(name: &str) -> Option<u8> {
    let index = match name {
        "C" => 0,
        "C#" | "Db" => 1,
        "D" => 2,
        "D#" | "Eb" => 3,
        "E" | "Fb" => 4,
        "F" => 5,
        "F#" | "Gb" => 6,
        "G" => 7,
        "G#" | "Ab" => 8,
        "A" => 9,
        "A#" | "Bb" => 10,
        "B" => 11,
        _ => return None,
    };
    Some(index)
}

/// A musical note: a validated pitch-class name plus a relative octave
/// offset (the offset of the key within the playable key rows, added to the
/// keyboard's base octave when deriving frequency).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Note {
    name: String,
    pitch_class: u8,
    relative_octave: i32,
}

impl Note {
    /// Create a note from a pitch-class name and relative octave.
    pub fn new(name: &str, relative_octave: i32) -> Result<Self, PitchError> {
        let pitch_class = pitch_class_index(name)
            .ok_or_else(|| PitchError::InvalidNoteName(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            pitch_class,
            relative_octave,
        })
    }

    /// Get the pitch-class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the relative octave offset
    pub fn relative_octave(&self) -> i32 {
        self.relative_octave
    }

    /// Frequency in Hz at the given base octave.
    pub fn frequency(&self, base_octave: i32) -> f64 {
        let octave = self.relative_octave + base_octave;
        C0_FREQUENCY * 2f64.powf(f64::from(self.pitch_class) / 12.0 + f64::from(octave))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.relative_octave)
    }
}

impl FromStr for Note {
    type Err = PitchError;

    /// Parse the `Display` form: a pitch-class name with an optional
    /// `.octave` suffix (e.g. `"A"`, `"C#.1"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((name, octave)) => {
                let octave: i32 = octave
                    .parse()
                    .map_err(|_| PitchError::InvalidOctave(s.to_string()))?;
                Note::new(name, octave)
            }
            None => Note::new(s, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 18] = [
        "C", "C#", "Db", "D", "D#", "Eb", "E", "Fb", "F", "F#", "Gb", "G", "G#", "Ab", "A", "A#",
        "Bb", "B",
    ];

    #[test]
    fn test_all_names_construct() {
        for name in NAMES {
            assert!(Note::new(name, 0).is_ok(), "{} should be valid", name);
        }
    }

    #[test]
    fn test_invalid_name() {
        let err = Note::new("H", 0).unwrap_err();
        assert_eq!(err, PitchError::InvalidNoteName("H".to_string()));
    }

    #[test]
    fn test_enharmonic_aliases_same_frequency() {
        let sharp = Note::new("C#", 0).unwrap();
        let flat = Note::new("Db", 0).unwrap();
        assert_eq!(sharp.frequency(3), flat.frequency(3));
    }

    #[test]
    fn test_equality_by_name_and_octave() {
        assert_eq!(Note::new("A", 0).unwrap(), Note::new("A", 0).unwrap());
        assert_ne!(Note::new("A", 0).unwrap(), Note::new("A", 1).unwrap());
    }

    #[test]
    fn test_c0_frequency() {
        let c = Note::new("C", 0).unwrap();
        assert!((c.frequency(0) - C0_FREQUENCY).abs() < 1e-9);
    }

    #[test]
    fn test_a_is_concert_pitch_region() {
        let a = Note::new("A", 0).unwrap();
        // A over the default base octave 3 is A3 (~220 Hz); one octave up is
        // A4 (~440 Hz) in the 16.35 Hz C0 tuning.
        assert!((a.frequency(3) - 220.0).abs() < 0.1);
        assert!((a.frequency(4) - 440.0).abs() < 0.2);
    }

    #[test]
    fn test_octave_doubles_frequency() {
        for name in NAMES {
            let note = Note::new(name, 0).unwrap();
            for octave in 0..6 {
                let low = note.frequency(octave);
                let high = note.frequency(octave + 1);
                assert!(low > 0.0);
                assert!(
                    (high - 2.0 * low).abs() < 1e-6 * high,
                    "{} octave {} should double: {} vs {}",
                    name,
                    octave,
                    low,
                    high
                );
            }
        }
    }

    #[test]
    fn test_relative_octave_matches_base_octave_shift() {
        let shifted = Note::new("G", 1).unwrap();
        let base = Note::new("G", 0).unwrap();
        assert!((shifted.frequency(3) - base.frequency(4)).abs() < 1e-9);
    }

    #[test]
    fn test_display_roundtrip() {
        let note = Note::new("F#", 1).unwrap();
        assert_eq!(note.to_string(), "F#.1");
        assert_eq!("F#.1".parse::<Note>().unwrap(), note);
    }

    #[test]
    fn test_parse_without_octave() {
        let note: Note = "Bb".parse().unwrap();
        assert_eq!(note.relative_octave(), 0);
        assert_eq!(note.name(), "Bb");
    }

    #[test]
    fn test_parse_bad_octave() {
        let err = "C.x".parse::<Note>().unwrap_err();
        assert_eq!(err, PitchError::InvalidOctave("C.x".to_string()));
    }
}
