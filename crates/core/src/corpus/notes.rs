//! Scientific pitch notation ("C4", "D#5", "Bb3") to MIDI note numbers.

use std::collections::HashMap;

use super::CorpusError;

lazy_static::lazy_static! {
    /// Pitch-class letter to semitone offset from C.
    static ref PITCH_CLASSES: HashMap<char, i32> = [
        ('C', 0), ('D', 2), ('E', 4), ('F', 5), ('G', 7), ('A', 9), ('B', 11),
    ]
    .into_iter()
    .collect();
}

/// Parse one note name. C4 is middle C (60).
///
/// Accepts any number of `#` or `b` accidentals and octaves -1 to 9,
/// case-insensitive for the letter. Bare integers are taken as MIDI numbers.
pub fn parse_note_name(name: &str) -> Result<i32, CorpusError> {
    let invalid = || CorpusError::InvalidNoteName(name.to_string());
    let name = name.trim();

    let midi = if let Ok(number) = name.parse::<i32>() {
        number
    } else {
        let mut chars = name.chars();
        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        let base = *PITCH_CLASSES.get(&letter).ok_or_else(invalid)?;

        let rest = chars.as_str();
        let octave_start = rest
            .find(|c: char| c == '-' || c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (accidentals, octave) = rest.split_at(octave_start);

        let mut shift = 0;
        for c in accidentals.chars() {
            match c {
                '#' => shift += 1,
                'b' | 'B' => shift -= 1,
                _ => return Err(invalid()),
            }
        }

        let octave: i32 = octave.parse().map_err(|_| invalid())?;
        if !(-1..=9).contains(&octave) {
            return Err(invalid());
        }
        (octave + 1) * 12 + base + shift
    };

    if !(0..=127).contains(&midi) {
        return Err(CorpusError::NoteOutOfRange(midi));
    }
    Ok(midi)
}

/// Parse a whitespace-separated note list, skipping tokens that don't parse.
pub fn parse_note_list(text: &str) -> Vec<i32> {
    text.split_whitespace()
        .filter_map(|token| match parse_note_name(token) {
            Ok(midi) => Some(midi),
            Err(e) => {
                log::warn!("Could not parse note '{}': {}. Skipping.", token, e);
                None
            }
        })
        .collect()
}
