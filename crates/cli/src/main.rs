//! riffnet CLI: corpus preprocessing and network analysis of guitar solos.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use riffnet_core::config::PipelineConfig;
use riffnet_core::corpus::notes::parse_note_list;
use riffnet_core::corpus::preprocess::{find_jams_files, preprocess_genre, read_corpus};
use riffnet_core::evaluate::{
    analyze_genre_corpus, compare_solos, evaluate_generated, format_metric, source_sequence,
};
use riffnet_core::midi::{read_note_sequence, write_note_sequence, SoloMidiOptions};
use riffnet_core::network::{analyze_sequence, NetworkMetrics};

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "riffnet",
    about = "Guitar-solo corpus preprocessing and note-transition network analysis",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build augmented per-genre corpus files from JAMS annotations
    Preprocess(PreprocessArgs),
    /// Network metrics for MIDI, JAMS or corpus files
    Analyze(AnalyzeArgs),
    /// Network metrics for an inline note list
    AnalyzeNotes(AnalyzeNotesArgs),
    /// Per-genre source averages, then metrics of generated MIDI files
    Evaluate(EvaluateArgs),
    /// Compare a generated solo against an original transcription
    Compare(CompareArgs),
    /// Write a note list as a MIDI file
    Render(RenderArgs),
}

// ─── Shared arguments (embedded in each subcommand) ──────────────

#[derive(Parser, Debug)]
struct SharedArgs {
    /// JSON pipeline config (genres, directories, limits)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory with .jams sources and corpus files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory with generated .mid files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl SharedArgs {
    /// Config file (or defaults) with directory flags applied on top.
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(config)
    }
}

#[derive(Parser, Debug)]
struct PreprocessArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Genres to process (default: all configured genres plus the combined corpus)
    #[arg(long = "genre")]
    genres: Vec<String>,

    /// Write the combined all-genre corpus
    #[arg(long, default_value_t = false)]
    all: bool,
}

impl PreprocessArgs {
    /// Per-genre corpora to write, and whether to write the combined one.
    fn targets(&self, config: &PipelineConfig) -> (Vec<String>, bool) {
        match (self.genres.is_empty(), self.all) {
            (true, false) => (config.genres.clone(), true),
            (true, true) => (Vec::new(), true),
            (false, all) => (self.genres.clone(), all),
        }
    }
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// .mid/.midi, .jams, or corpus text files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Print JSON instead of a metric list
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct AnalyzeNotesArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Notes as names or MIDI numbers: "C4 E4 G4" or "60 64 67"
    notes: String,

    /// Print JSON instead of a metric list
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct EvaluateArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Print JSON instead of text reports
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Generated MIDI file
    generated: PathBuf,

    /// Original JAMS file (default: first .jams in the data directory)
    original: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Notes as names or MIDI numbers: "C4 E4 G4" or "60 64 67"
    notes: String,

    /// Output MIDI path
    #[arg(short, long)]
    output: PathBuf,

    /// Tempo in BPM
    #[arg(long, default_value_t = 120)]
    tempo: u32,

    /// Length of each note in beats
    #[arg(long, default_value_t = 0.5)]
    note_beats: f64,

    /// MIDI track name
    #[arg(long, default_value = "Generated Solo")]
    track_name: String,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Command::Preprocess(a) => a.shared.verbose,
        Command::Analyze(a) => a.shared.verbose,
        Command::AnalyzeNotes(a) => a.shared.verbose,
        Command::Evaluate(a) => a.shared.verbose,
        Command::Compare(a) => a.shared.verbose,
        Command::Render(a) => a.shared.verbose,
    };
    let log_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Preprocess(args) => run_preprocess(args),
        Command::Analyze(args) => run_analyze(args),
        Command::AnalyzeNotes(args) => run_analyze_notes(args),
        Command::Evaluate(args) => run_evaluate(args),
        Command::Compare(args) => run_compare(args),
        Command::Render(args) => run_render(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn print_metrics(label: &str, metrics: &NetworkMetrics, json: bool) -> Result<()> {
    if json {
        let value = serde_json::json!({ "input": label, "metrics": metrics });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("\n{}", label);
        for (name, value) in metrics.fields() {
            println!("- {}: {}", name, format_metric(name, value));
        }
    }
    Ok(())
}

/// Sequences contained in one analyze input, labelled for output.
fn input_sequences(path: &Path, config: &PipelineConfig) -> Result<Vec<(String, Vec<i32>)>> {
    let label = path.display().to_string();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mid" | "midi" => Ok(vec![(label, read_note_sequence(path)?)]),
        "jams" => Ok(vec![(label, source_sequence(path, config.max_consecutive)?)]),
        _ => Ok(read_corpus(path)?
            .into_iter()
            .enumerate()
            .map(|(i, seq)| (format!("{}:{}", label, i + 1), seq))
            .collect()),
    }
}

// ─── Runners ─────────────────────────────────────────────────────

fn run_preprocess(args: PreprocessArgs) -> Result<()> {
    let config = args.shared.pipeline_config()?;
    let (genres, combined) = args.targets(&config);

    for genre in &genres {
        log::info!("Processing {} genre", genre);
        let (path, count) = preprocess_genre(&config, Some(genre))?;
        println!("Saved {} {} sequences to {}", count, genre, path.display());
    }

    if combined {
        log::info!("Processing all genres");
        let (path, count) = preprocess_genre(&config, None)?;
        println!("Saved {} sequences (all genres) to {}", count, path.display());
    }
    Ok(())
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = args.shared.pipeline_config()?;
    for input in &args.inputs {
        if !input.exists() {
            bail!("File not found: {}", input.display());
        }
        for (label, seq) in input_sequences(input, &config)? {
            print_metrics(&label, &analyze_sequence(&seq), args.json)?;
        }
    }
    Ok(())
}

fn run_analyze_notes(args: AnalyzeNotesArgs) -> Result<()> {
    let notes = parse_note_list(&args.notes);
    log::debug!("Parsed notes: {:?}", notes);
    print_metrics(&args.notes, &analyze_sequence(&notes), args.json)
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    let config = args.shared.pipeline_config()?;

    let genres = analyze_genre_corpus(&config)?;
    let generated = if config.output_dir.is_dir() {
        evaluate_generated(&config.output_dir)?
    } else {
        log::warn!("Output directory {} not found", config.output_dir.display());
        Vec::new()
    };

    if args.json {
        let value = serde_json::json!({ "original": genres, "generated": generated });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("--- Average Original Data Metrics per Genre ---");
    for report in &genres {
        println!("\nGenre: {} ({} files)", report.genre, report.files);
        match &report.means {
            Some(means) => {
                for (name, value) in &means.values {
                    println!("- {}: {:.4}", name, value);
                }
            }
            None => println!("- N/A"),
        }
    }

    println!("\n--- Generated Solos ---");
    for report in &generated {
        let label = report
            .path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| report.path.display().to_string());
        print_metrics(&label, &report.metrics, false)?;
    }
    Ok(())
}

fn run_compare(args: CompareArgs) -> Result<()> {
    let config = args.shared.pipeline_config()?;
    let original = match args.original {
        Some(path) => path,
        None => find_jams_files(&config.data_dir, None)?
            .into_iter()
            .next()
            .with_context(|| {
                format!("No JAMS files found in {}", config.data_dir.display())
            })?,
    };
    log::info!("Comparing {} against {}", args.generated.display(), original.display());

    let comparison = compare_solos(&args.generated, &original)?;
    print!("{}", comparison.to_markdown());
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<()> {
    let notes = parse_note_list(&args.notes);
    if notes.is_empty() {
        bail!("No valid notes provided or parsed");
    }
    let options = SoloMidiOptions {
        track_name: args.track_name,
        tempo_bpm: args.tempo,
        note_beats: args.note_beats,
        ..Default::default()
    };
    write_note_sequence(&notes, &args.output, &options)?;
    println!("Output: {}", args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess_args(argv: &[&str]) -> PreprocessArgs {
        let mut full = vec!["riffnet", "preprocess"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Preprocess(args) => args,
            _ => panic!("expected preprocess"),
        }
    }

    #[test]
    fn test_preprocess_default_targets() {
        let config = PipelineConfig::default();
        let (genres, combined) = preprocess_args(&[]).targets(&config);
        assert_eq!(genres, config.genres);
        assert!(combined);
    }

    #[test]
    fn test_preprocess_all_only() {
        let (genres, combined) = preprocess_args(&["--all"]).targets(&PipelineConfig::default());
        assert!(genres.is_empty());
        assert!(combined);
    }

    #[test]
    fn test_preprocess_selected_genres() {
        let config = PipelineConfig::default();
        let (genres, combined) = preprocess_args(&["--genre", "Rock", "--genre", "Jazz"]).targets(&config);
        assert_eq!(genres, vec!["Rock", "Jazz"]);
        assert!(!combined);

        let (genres, combined) = preprocess_args(&["--genre", "Funk", "--all"]).targets(&config);
        assert_eq!(genres, vec!["Funk"]);
        assert!(combined);
    }
}
