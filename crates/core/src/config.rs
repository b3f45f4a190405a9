//! Pipeline configuration: genres, directory layout and preprocessing limits.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusError;

/// Genres in the guitar-solo data set, matched against file names.
pub const DEFAULT_GENRES: &[&str] = &["Rock", "Jazz", "Funk", "BN", "SS"];

/// Explicit settings for preprocessing and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub genres: Vec<String>,
    /// Directory holding `.jams` sources and processed corpus files
    pub data_dir: PathBuf,
    /// Directory holding generated `.mid` files
    pub output_dir: PathBuf,
    /// Longest run of one repeated note kept by preprocessing
    pub max_consecutive: usize,
    /// Lowest transposition offset used for augmentation (semitones)
    pub transpose_min: i32,
    /// Highest transposition offset used for augmentation (semitones)
    pub transpose_max: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            genres: DEFAULT_GENRES.iter().map(|g| g.to_string()).collect(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            max_consecutive: 5,
            transpose_min: -5,
            transpose_max: 5,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file; missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&data)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.genres.is_empty() {
            return Err(CorpusError::NoGenres);
        }
        Ok(())
    }

    pub fn transpose_range(&self) -> RangeInclusive<i32> {
        self.transpose_min..=self.transpose_max
    }
}
