//! Compare generated solos against the source corpus.
//!
//! Batch functions never abort on a single bad file: unreadable or empty
//! inputs are logged and skipped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::config::PipelineConfig;
use crate::corpus::jams::read_jams;
use crate::corpus::preprocess::{find_jams_files, limit_consecutive_notes};
use crate::midi::read_note_sequence;
use crate::network::{analyze_sequence, NetworkMetrics, METRIC_NAMES};

/// Per-metric arithmetic means over a set of sequences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricMeans {
    pub count: usize,
    /// In metric order; serialized as a name → mean object
    #[serde(serialize_with = "serialize_named_values")]
    pub values: Vec<(String, f64)>,
}

fn serialize_named_values<S: Serializer>(
    values: &[(String, f64)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(values.iter().map(|(name, value)| (name, value)))
}

impl MetricMeans {
    /// `None` for an empty slice.
    pub fn from_records(records: &[NetworkMetrics]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let mut sums = [0.0f64; METRIC_NAMES.len()];
        for record in records {
            for (sum, (_, value)) in sums.iter_mut().zip(record.fields()) {
                *sum += value;
            }
        }
        let n = records.len() as f64;
        Some(MetricMeans {
            count: records.len(),
            values: METRIC_NAMES
                .iter()
                .zip(sums)
                .map(|(name, sum)| (name.to_string(), sum / n))
                .collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }
}

/// Source-corpus summary for one genre.
#[derive(Debug, Clone, Serialize)]
pub struct GenreReport {
    pub genre: String,
    /// Files that produced a non-empty sequence
    pub files: usize,
    pub means: Option<MetricMeans>,
}

/// Metrics of one generated MIDI file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub metrics: NetworkMetrics,
}

/// The note sequence a source JAMS file contributes to evaluation:
/// every note_midi annotation joined, then run-limited.
pub fn source_sequence(path: &Path, max_consecutive: usize) -> Result<Vec<i32>> {
    let jams = read_jams(path)?;
    Ok(limit_consecutive_notes(&jams.concatenated_notes(), max_consecutive))
}

/// Average network metrics of the source files of one genre.
pub fn analyze_genre(config: &PipelineConfig, genre: &str) -> Result<GenreReport> {
    let mut records = Vec::new();
    for path in find_jams_files(&config.data_dir, Some(genre))? {
        match source_sequence(&path, config.max_consecutive) {
            Ok(seq) if seq.is_empty() => {
                log::warn!("Skipping {}: no notes after filtering", path.display());
            }
            Ok(seq) => {
                let metrics = analyze_sequence(&seq);
                log::debug!("{}: {:?}", path.display(), metrics);
                records.push(metrics);
            }
            Err(e) => log::warn!("Skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(GenreReport {
        genre: genre.to_string(),
        files: records.len(),
        means: MetricMeans::from_records(&records),
    })
}

/// One report per configured genre, in configuration order.
pub fn analyze_genre_corpus(config: &PipelineConfig) -> Result<Vec<GenreReport>> {
    config.validate()?;
    config
        .genres
        .iter()
        .map(|genre| {
            log::info!("Processing original {} data", genre);
            analyze_genre(config, genre)
        })
        .collect()
}

/// Metrics for every `.mid`/`.midi` file in `dir`, sorted by path.
pub fn evaluate_generated(dir: &Path) -> Result<Vec<FileReport>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list output directory: {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e == "mid" || e == "midi")
                    .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        log::warn!("No generated MIDI files found in {}", dir.display());
    }

    let mut reports = Vec::new();
    for path in paths {
        match read_note_sequence(&path) {
            Ok(notes) if notes.is_empty() => {
                log::warn!("Could not read notes from {}", path.display());
            }
            Ok(notes) => reports.push(FileReport {
                metrics: analyze_sequence(&notes),
                path,
            }),
            Err(e) => log::warn!("Skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(reports)
}

/// Side-by-side metrics of a generated and an original solo.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub generated: NetworkMetrics,
    pub original: NetworkMetrics,
}

impl Comparison {
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("| Metric                        | Generated Solo | Original Solo |\n");
        out.push_str("|-------------------------------|----------------|---------------|\n");
        for ((name, generated), (_, original)) in
            self.generated.fields().into_iter().zip(self.original.fields())
        {
            out.push_str(&format!(
                "| {:<29} | {:<14} | {:<13} |\n",
                name,
                format_metric(name, generated),
                format_metric(name, original)
            ));
        }
        out
    }
}

/// Counts print as integers, ratios with four decimals.
pub fn format_metric(name: &str, value: f64) -> String {
    match name {
        "sequence_length" | "num_nodes" | "num_edges" => format!("{}", value.round() as i64),
        _ => format!("{:.4}", value),
    }
}

/// Compare a generated MIDI file against the first note_midi annotation
/// of an original JAMS file.
pub fn compare_solos(generated_midi: &Path, original_jams: &Path) -> Result<Comparison> {
    let generated = read_note_sequence(generated_midi)?;
    let original = read_jams(original_jams)?.first_note_sequence().unwrap_or_else(|| {
        log::warn!("{} has no note_midi annotation", original_jams.display());
        Vec::new()
    });
    Ok(Comparison {
        generated: analyze_sequence(&generated),
        original: analyze_sequence(&original),
    })
}
