//! Source corpus handling: JAMS extraction, preprocessing and note names.

pub mod jams;
pub mod notes;
pub mod preprocess;

use thiserror::Error;

/// Typed failures from corpus parsing and validation.
#[derive(Debug, Error, PartialEq)]
pub enum CorpusError {
    #[error("Malformed corpus line {line}: invalid note '{token}'")]
    MalformedLine { line: usize, token: String },

    #[error("Invalid note name: '{0}'")]
    InvalidNoteName(String),

    #[error("Note {0} is outside the MIDI range 0-127")]
    NoteOutOfRange(i32),

    #[error("Tempo {0} BPM cannot be stored in a MIDI file (4 BPM or more)")]
    TempoOutOfRange(u32),

    #[error("Note length of {0} beats is too long for a MIDI delta time")]
    NoteLengthOutOfRange(f64),

    #[error("At least one genre must be configured")]
    NoGenres,
}

pub use jams::{read_jams, JamsFile};
pub use notes::{parse_note_list, parse_note_name};
pub use preprocess::{augment, limit_consecutive_notes, transpose_sequence};
