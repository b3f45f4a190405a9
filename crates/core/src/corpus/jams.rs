//! Extract MIDI note sequences from JAMS annotation files.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Annotation namespace holding MIDI-pitch note observations.
pub const NOTE_MIDI_NAMESPACE: &str = "note_midi";

/// The parts of a JAMS document this pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub struct JamsFile {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub namespace: String,
    #[serde(default)]
    pub data: Vec<Observation>,
}

/// One observation. Only `value` is read (timing fields are ignored); other
/// namespaces store labels or objects there.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Annotation {
    pub fn is_note_midi(&self) -> bool {
        self.namespace == NOTE_MIDI_NAMESPACE
    }

    /// Numeric observation values rounded to the nearest MIDI note,
    /// ties to even. Values that do not land in 0..=127 are dropped.
    pub fn notes(&self) -> Vec<i32> {
        self.data
            .iter()
            .filter_map(|obs| obs.value.as_f64())
            .filter_map(|v| {
                let rounded = v.round_ties_even();
                if (0.0..=127.0).contains(&rounded) {
                    Some(rounded as i32)
                } else {
                    log::warn!("Ignoring note_midi value {} outside 0-127", v);
                    None
                }
            })
            .collect()
    }
}

impl JamsFile {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid JAMS document")
    }

    /// One sequence per note_midi annotation, in file order.
    pub fn note_sequences(&self) -> Vec<Vec<i32>> {
        self.annotations
            .iter()
            .filter(|a| a.is_note_midi())
            .map(Annotation::notes)
            .collect()
    }

    /// Notes of the first note_midi annotation, if any.
    pub fn first_note_sequence(&self) -> Option<Vec<i32>> {
        self.annotations
            .iter()
            .find(|a| a.is_note_midi())
            .map(Annotation::notes)
    }

    /// All note_midi annotations joined end to end.
    pub fn concatenated_notes(&self) -> Vec<i32> {
        self.note_sequences().into_iter().flatten().collect()
    }
}

/// Read and parse a JAMS file.
pub fn read_jams(path: &Path) -> Result<JamsFile> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JAMS file: {}", path.display()))?;
    JamsFile::parse(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "annotations": [
            {"namespace": "chord", "data": [{"time": 0.0, "duration": 2.0, "value": "C:maj"}]},
            {"namespace": "note_midi", "data": [
                {"time": 0.1, "duration": 0.2, "value": 59.8},
                {"time": 0.3, "duration": 0.2, "value": 62.4},
                {"time": 0.5, "duration": 0.2, "value": 64.5}
            ]},
            {"namespace": "note_midi", "data": [
                {"time": 0.0, "duration": 0.5, "value": 40.0}
            ]}
        ],
        "file_metadata": {"title": "00_Rock1-90-C#_solo"}
    }"#;

    #[test]
    fn test_note_sequences_per_annotation() {
        let jams = JamsFile::parse(SAMPLE).unwrap();
        assert_eq!(jams.note_sequences(), vec![vec![60, 62, 64], vec![40]]);
    }

    #[test]
    fn test_first_and_concatenated() {
        let jams = JamsFile::parse(SAMPLE).unwrap();
        assert_eq!(jams.first_note_sequence(), Some(vec![60, 62, 64]));
        assert_eq!(jams.concatenated_notes(), vec![60, 62, 64, 40]);
    }

    #[test]
    fn test_no_note_annotations() {
        let jams = JamsFile::parse(r#"{"annotations": [{"namespace": "chord", "data": []}]}"#).unwrap();
        assert!(jams.note_sequences().is_empty());
        assert_eq!(jams.first_note_sequence(), None);
        assert!(jams.concatenated_notes().is_empty());
    }

    #[test]
    fn test_missing_annotations_key() {
        let jams = JamsFile::parse("{}").unwrap();
        assert!(jams.annotations.is_empty());
    }

    #[test]
    fn test_non_numeric_values_ignored() {
        let jams = JamsFile::parse(
            r#"{"annotations": [{"namespace": "note_midi", "data": [
                {"value": 61.2}, {"value": null}, {"value": "x"}, {"value": 63}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(jams.first_note_sequence(), Some(vec![61, 63]));
    }

    #[test]
    fn test_out_of_range_values_dropped() {
        let jams = JamsFile::parse(
            r#"{"annotations": [{"namespace": "note_midi", "data": [
                {"value": 1e12}, {"value": 64}, {"value": -3.0}, {"value": 127.4}, {"value": 127.6}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(jams.first_note_sequence(), Some(vec![64, 127]));
    }

    #[test]
    fn test_invalid_json() {
        assert!(JamsFile::parse("not json").is_err());
    }

    #[test]
    fn test_read_jams_nonexistent() {
        assert!(read_jams(Path::new("/nonexistent.jams")).is_err());
    }
}
