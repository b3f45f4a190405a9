//! Turn JAMS transcriptions into an augmented, line-per-sequence corpus.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::jams::read_jams;
use super::CorpusError;
use crate::config::PipelineConfig;

/// Cap runs of the same note at `max_consecutive` items.
pub fn limit_consecutive_notes(sequence: &[i32], max_consecutive: usize) -> Vec<i32> {
    let mut filtered = Vec::with_capacity(sequence.len());
    let mut current: Option<i32> = None;
    let mut run = 0usize;

    for &note in sequence {
        if current == Some(note) {
            run += 1;
        } else {
            current = Some(note);
            run = 1;
        }
        if run <= max_consecutive {
            filtered.push(note);
        }
    }
    filtered
}

/// Shift every note by `semitones`. No clamping to the MIDI range; only
/// the `i32` bounds saturate.
pub fn transpose_sequence(sequence: &[i32], semitones: i32) -> Vec<i32> {
    sequence.iter().map(|n| n.saturating_add(semitones)).collect()
}

/// The original sequence followed by one transposition per non-zero
/// offset in `range`.
pub fn augment(sequence: &[i32], range: RangeInclusive<i32>) -> Vec<Vec<i32>> {
    let mut out = vec![sequence.to_vec()];
    out.extend(
        range
            .filter(|&semitones| semitones != 0)
            .map(|semitones| transpose_sequence(sequence, semitones)),
    );
    out
}

/// Serialize sequences one per line, notes space-separated.
pub fn format_corpus(sequences: &[Vec<i32>]) -> String {
    let mut out = String::new();
    for seq in sequences {
        let line: Vec<String> = seq.iter().map(|n| n.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Parse the line-per-sequence corpus format. Blank lines are skipped.
pub fn parse_corpus(text: &str) -> Result<Vec<Vec<i32>>, CorpusError> {
    let mut sequences = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let seq = line
            .split_whitespace()
            .map(|token| {
                token.parse::<i32>().map_err(|_| CorpusError::MalformedLine {
                    line: i + 1,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        sequences.push(seq);
    }
    Ok(sequences)
}

/// Write through a sibling `.tmp` file and rename, so readers never see a
/// half-written file.
pub(crate) fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let tmp_path = target.with_extension("tmp");
    std::fs::write(&tmp_path, data)
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, target)
        .with_context(|| format!("Failed to move {} into place", target.display()))?;
    Ok(())
}

pub fn write_corpus(path: &Path, sequences: &[Vec<i32>]) -> Result<()> {
    atomic_write(path, format_corpus(sequences).as_bytes())
        .with_context(|| format!("Failed to write corpus: {}", path.display()))
}

pub fn read_corpus(path: &Path) -> Result<Vec<Vec<i32>>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus: {}", path.display()))?;
    parse_corpus(&text).with_context(|| format!("Failed to parse corpus: {}", path.display()))
}

/// Corpus file name for a genre, or for the whole data set with `None`.
pub fn corpus_file_name(genre: Option<&str>) -> String {
    format!(
        "processed_sequences_{}.txt",
        genre.map(|g| g.to_lowercase()).unwrap_or_else(|| "all".to_string())
    )
}

/// `.jams` files in `data_dir` whose name contains `genre`
/// (case-insensitive), sorted by path. `None` matches every file.
pub fn find_jams_files(data_dir: &Path, genre: Option<&str>) -> Result<Vec<PathBuf>> {
    let needle = genre.map(|g| g.to_lowercase());
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to list data directory: {}", data_dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().map(|e| e == "jams").unwrap_or(false))
        .filter(|p| match &needle {
            Some(n) => p
                .file_name()
                .map(|f| f.to_string_lossy().to_lowercase().contains(n.as_str()))
                .unwrap_or(false),
            None => true,
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Extract, limit and augment every note_midi annotation for one genre.
///
/// Files that fail to read or parse are skipped with a warning.
pub fn collect_genre_sequences(config: &PipelineConfig, genre: Option<&str>) -> Result<Vec<Vec<i32>>> {
    let mut sequences = Vec::new();
    for path in find_jams_files(&config.data_dir, genre)? {
        let jams = match read_jams(&path) {
            Ok(j) => j,
            Err(e) => {
                log::warn!("Skipping {}: {:#}", path.display(), e);
                continue;
            }
        };
        for notes in jams.note_sequences() {
            let filtered = limit_consecutive_notes(&notes, config.max_consecutive);
            if filtered.is_empty() {
                continue;
            }
            sequences.extend(augment(&filtered, config.transpose_range()));
        }
        log::debug!("{}: {} sequences so far", path.display(), sequences.len());
    }
    Ok(sequences)
}

/// Build the corpus for one genre (or all files) and write it into the
/// data directory. Returns the written path and the sequence count.
pub fn preprocess_genre(config: &PipelineConfig, genre: Option<&str>) -> Result<(PathBuf, usize)> {
    let sequences = collect_genre_sequences(config, genre)?;
    let path = config.data_dir.join(corpus_file_name(genre));
    write_corpus(&path, &sequences)?;
    log::info!(
        "Wrote {} sequences for {} to {}",
        sequences.len(),
        genre.unwrap_or("all genres"),
        path.display()
    );
    Ok((path, sequences.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_consecutive_notes() {
        let seq = [60, 60, 60, 60, 60, 60, 60, 62, 62, 60];
        assert_eq!(
            limit_consecutive_notes(&seq, 5),
            vec![60, 60, 60, 60, 60, 62, 62, 60]
        );
        assert_eq!(limit_consecutive_notes(&seq, 1), vec![60, 62, 60]);
        assert!(limit_consecutive_notes(&[], 5).is_empty());
    }

    #[test]
    fn test_limit_zero_drops_everything() {
        assert!(limit_consecutive_notes(&[60, 62], 0).is_empty());
    }

    #[test]
    fn test_transpose_sequence() {
        assert_eq!(transpose_sequence(&[60, 64, 67], -5), vec![55, 59, 62]);
        assert_eq!(transpose_sequence(&[125], 5), vec![130]);
        assert_eq!(transpose_sequence(&[i32::MAX - 1], 5), vec![i32::MAX]);
        assert_eq!(transpose_sequence(&[i32::MIN + 2], -5), vec![i32::MIN]);
    }

    #[test]
    fn test_augment_default_range() {
        let out = augment(&[60, 62], -5..=5);
        assert_eq!(out.len(), 11);
        assert_eq!(out[0], vec![60, 62]);
        assert_eq!(out[1], vec![55, 57]);
        assert_eq!(out[10], vec![65, 67]);
        assert!(!out[1..].contains(&vec![60, 62]));
    }

    #[test]
    fn test_corpus_text_format() {
        let text = format_corpus(&[vec![60, 62, 64], vec![40]]);
        assert_eq!(text, "60 62 64\n40\n");
        assert_eq!(parse_corpus(&text).unwrap(), vec![vec![60, 62, 64], vec![40]]);
    }

    #[test]
    fn test_write_corpus_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("processed_sequences_rock.txt");
        write_corpus(&path, &[vec![60, 62]]).unwrap();
        write_corpus(&path, &[vec![40], vec![41, 43]]).unwrap();

        assert_eq!(read_corpus(&path).unwrap(), vec![vec![40], vec![41, 43]]);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_parse_corpus_skips_blank_lines() {
        assert_eq!(parse_corpus("\n60 61\n\n  \n62\n").unwrap(), vec![vec![60, 61], vec![62]]);
    }

    #[test]
    fn test_parse_corpus_reports_line() {
        let err = parse_corpus("60 61\n62 x3\n").unwrap_err();
        assert_eq!(
            err,
            CorpusError::MalformedLine { line: 2, token: "x3".to_string() }
        );
    }

    #[test]
    fn test_corpus_file_name() {
        assert_eq!(corpus_file_name(Some("Rock")), "processed_sequences_rock.txt");
        assert_eq!(corpus_file_name(None), "processed_sequences_all.txt");
    }

    fn write_jams(dir: &Path, name: &str, notes: &[f64]) {
        let data: Vec<serde_json::Value> = notes
            .iter()
            .map(|v| serde_json::json!({"time": 0.0, "duration": 0.1, "value": v}))
            .collect();
        let doc = serde_json::json!({
            "annotations": [{"namespace": "note_midi", "data": data}]
        });
        std::fs::write(dir.join(name), doc.to_string()).unwrap();
    }

    #[test]
    fn test_find_jams_files_filters_genre() {
        let dir = tempfile::tempdir().unwrap();
        write_jams(dir.path(), "00_Rock1-90_solo.jams", &[60.0]);
        write_jams(dir.path(), "01_Jazz2-110_solo.jams", &[60.0]);
        std::fs::write(dir.path().join("rock_notes.txt"), "60").unwrap();

        let rock = find_jams_files(dir.path(), Some("rock")).unwrap();
        assert_eq!(rock.len(), 1);
        assert!(rock[0].ends_with("00_Rock1-90_solo.jams"));
        assert_eq!(find_jams_files(dir.path(), None).unwrap().len(), 2);
    }

    #[test]
    fn test_preprocess_genre_writes_augmented_corpus() {
        let dir = tempfile::tempdir().unwrap();
        write_jams(dir.path(), "00_Funk1_solo.jams", &[60.0, 60.0, 60.0, 62.0]);
        write_jams(dir.path(), "00_Rock1_solo.jams", &[50.0, 52.0]);
        std::fs::write(dir.path().join("01_Funk2_solo.jams"), "{broken").unwrap();

        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            max_consecutive: 2,
            ..Default::default()
        };
        let (path, count) = preprocess_genre(&config, Some("Funk")).unwrap();
        assert_eq!(count, 11);
        assert!(path.ends_with("processed_sequences_funk.txt"));

        let corpus = read_corpus(&path).unwrap();
        assert_eq!(corpus[0], vec![60, 60, 62]);
        assert_eq!(corpus[1], vec![55, 55, 57]);
    }

    #[test]
    fn test_preprocess_survives_huge_note_value() {
        let dir = tempfile::tempdir().unwrap();
        write_jams(dir.path(), "00_Rock1_solo.jams", &[1e12, 64.0]);
        write_jams(dir.path(), "01_Rock2_solo.jams", &[50.0, 52.0]);

        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let (path, count) = preprocess_genre(&config, Some("Rock")).unwrap();
        assert_eq!(count, 22);

        let corpus = read_corpus(&path).unwrap();
        assert_eq!(corpus[0], vec![64]);
        assert_eq!(corpus[11], vec![50, 52]);
    }

    #[test]
    fn test_preprocess_missing_dir_errors() {
        let config = PipelineConfig {
            data_dir: PathBuf::from("/nonexistent/riffnet-data"),
            ..Default::default()
        };
        assert!(preprocess_genre(&config, None).is_err());
    }
}
