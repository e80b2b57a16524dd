//! welllog-dataset - inspect the well-log training pipeline
//!
//! Loads a corpus using the dataset config, then reports on the training set
//! or on one well's full-length normalized view.
//!
//! # Usage
//!
//! ```bash
//! # Training set summary with the default or ./welllog.toml config
//! cargo run --release -- summary
//!
//! # Normalize one held-out well and check the inverse transform
//! cargo run --release -- --config wells.toml test-view --well 12 --json
//!
//! # Write the normalized test view as CSV
//! cargo run --release -- export-test --well 12 --out A12_normalized.csv
//! ```
//!
//! # Environment Variables
//!
//! - `WELLLOG_CONFIG`: Path to the dataset TOML config
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use welllog_dataset::config::{validation, DatasetConfig};
use welllog_dataset::{DatasetView, Scaler, TestView, WellCorpus};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "welllog-dataset")]
#[command(about = "Well-log windowing and normalization pipeline")]
#[command(version)]
struct CliArgs {
    /// Dataset config file (overrides WELLLOG_CONFIG and ./welllog.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override corpus.path_template, e.g. "data/A{}.csv"
    #[arg(long)]
    path_template: Option<String>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Build the training set and report its shape
    Summary {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Normalize one well at full length and verify the inverse transform
    TestView {
        /// 1-based well id
        #[arg(long)]
        well: usize,
        /// Print the report, including the target scaler, as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write one well's normalized test view to CSV
    ExportTest {
        /// 1-based well id
        #[arg(long)]
        well: usize,
        /// Output CSV path
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the effective config as TOML
    PrintConfig,
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Serialize)]
struct SegmentReport {
    well_id: usize,
    rows: usize,
    windows: usize,
}

#[derive(Debug, Serialize)]
struct TrainingSummary {
    wells: usize,
    samples: usize,
    window: usize,
    stride: usize,
    input_dim: usize,
    output_dim: usize,
    individual_normalization: bool,
    segments: Vec<SegmentReport>,
}

impl TrainingSummary {
    fn from_view(view: &DatasetView) -> Self {
        let corpus = view.corpus();
        let config = corpus.config();
        let segments = view
            .training_set()
            .segments
            .iter()
            .map(|s| SegmentReport {
                well_id: s.well_id,
                rows: corpus.well(s.well_id).map_or(0, |w| w.n_rows()),
                windows: s.windows,
            })
            .collect();

        Self {
            wells: corpus.well_count(),
            samples: view.len(),
            window: config.window.size,
            stride: config.window.stride,
            input_dim: view.input_dim(),
            output_dim: view.output_dim(),
            individual_normalization: config.normalization.individual,
            segments,
        }
    }

    fn print(&self) {
        println!("=== Training Set ===");
        println!("  Wells in corpus: {}", self.wells);
        println!("  Samples:         {}", self.samples);
        println!("  Window/stride:   {}/{}", self.window, self.stride);
        println!(
            "  Inputs:          ({}, {}, {})",
            self.samples, self.window, self.input_dim
        );
        println!(
            "  Targets:         ({}, {}, {})",
            self.samples, self.window, self.output_dim
        );
        println!("  Individual norm: {}", self.individual_normalization);
        for s in &self.segments {
            println!("    well {:>3}: {:>6} rows -> {:>4} windows", s.well_id, s.rows, s.windows);
        }
    }
}

#[derive(Debug, Serialize)]
struct TestViewReport<'a> {
    well_id: usize,
    source: &'a Path,
    input_shape: (usize, usize),
    target_shape: (usize, usize),
    latch: String,
    inverse_max_error: f64,
    target_scaler: &'a Scaler,
}

impl TestViewReport<'_> {
    fn print(&self) {
        println!("=== Test View: well {} ===", self.well_id);
        println!("  Source: {}", self.source.display());
        println!("  Input:  {:?}", self.input_shape);
        println!("  Target: {:?}", self.target_shape);
        println!("  Latch:  {}", self.latch);
        println!("  Inverse round-trip max error: {:.3e}", self.inverse_max_error);
    }
}

// ============================================================================
// Commands
// ============================================================================

fn load_config(args: &CliArgs) -> Result<DatasetConfig> {
    let mut config = match &args.config {
        Some(path) => DatasetConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DatasetConfig::load(),
    };
    if let Some(template) = &args.path_template {
        config.corpus.path_template.clone_from(template);
    }
    config.validate().context("Invalid dataset config")?;
    for w in validation::layout_warnings(&config) {
        warn!("{}", w);
    }
    Ok(config)
}

fn run_summary(config: DatasetConfig, json: bool) -> Result<()> {
    let train_ids = config.training.train_ids.clone();
    let (input_dim, output_dim) = (config.training.input_dim, config.training.output_dim);

    let corpus = WellCorpus::load(config).context("Failed to load well corpus")?;
    let view = DatasetView::new(corpus, train_ids, input_dim, output_dim)
        .context("Failed to build training set")?;

    let summary = TrainingSummary::from_view(&view);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}

fn build_test_view(config: DatasetConfig, well: usize) -> Result<(WellCorpus, TestView)> {
    let mut corpus = WellCorpus::load(config).context("Failed to load well corpus")?;
    let view = corpus
        .build_test_view(well)
        .with_context(|| format!("Failed to build test view for well {well}"))?;
    Ok((corpus, view))
}

fn run_test_view(config: DatasetConfig, well: usize, json: bool) -> Result<()> {
    let (corpus, view) = build_test_view(config, well)?;

    let table = corpus.well(well)?;
    let original = table.select(&corpus.schema().target_columns)?;
    let restored = corpus.inverse_target(view.target.view())?;
    let max_error = restored
        .iter()
        .zip(original.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);

    let report = TestViewReport {
        well_id: view.well_id,
        source: table.source(),
        input_shape: view.input.dim(),
        target_shape: view.target.dim(),
        latch: format!("{:?}", corpus.latch_state()),
        inverse_max_error: max_error,
        target_scaler: &view.target_scaler,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print();
    }
    Ok(())
}

fn run_export_test(config: DatasetConfig, well: usize, out: &Path) -> Result<()> {
    let (corpus, view) = build_test_view(config, well)?;
    let schema = corpus.schema();

    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    writer.write_record(schema.input_columns().iter().chain(&schema.target_columns))?;
    for (input, target) in view.input.outer_iter().zip(view.target.outer_iter()) {
        writer.write_record(input.iter().chain(target.iter()).map(f64::to_string))?;
    }
    writer.flush()?;

    info!(well, rows = view.input.nrows(), out = %out.display(), "Test view exported");
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    match &args.command {
        SubCommand::Summary { json } => run_summary(config, *json),
        SubCommand::TestView { well, json } => run_test_view(config, *well, *json),
        SubCommand::ExportTest { well, out } => run_export_test(config, *well, out),
        SubCommand::PrintConfig => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}
