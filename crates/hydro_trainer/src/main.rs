//! Hydroponics forest trainer CLI
//!
//! Trains the multi-output forest and both encoders, then writes the
//! artifact bundle that `hydro-cli` serves predictions from.

use anyhow::{Context, Result};
use clap::Parser;
use hydroponics_core::HydroConfig;
use hydroponics_trainer::TrainingPipeline;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hydro-train")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the hydroponic cultivation predictor", long_about = None)]
struct Args {
    /// Input CSV dataset path
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the model bundle
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trees per target
    #[arg(long)]
    trees: Option<usize>,

    /// Random seed for bootstrap sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Skip held-out evaluation
    #[arg(long)]
    no_eval: bool,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Write the held-out evaluation report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<HydroConfig> {
        let mut config = match &self.config {
            Some(path) => HydroConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => HydroConfig::default(),
        };
        config.apply_env().context("Invalid HYDRO_* environment override")?;

        if let Some(input) = &self.input {
            config.data.dataset_path = input.clone();
        }
        if let Some(output) = &self.output {
            config.artifacts.directory = output.clone();
        }
        if let Some(trees) = self.trees {
            config.forest.n_estimators = trees;
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }
        if let Some(fraction) = self.test_fraction {
            config.evaluation.test_fraction = fraction;
        }
        if self.no_eval {
            config.evaluation.enabled = false;
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }

        Ok(config)
    }
}

/// `RUST_LOG` wins unless `--verbose` forces the configured level
fn log_filter(level: &str, verbose: bool) -> Result<EnvFilter> {
    if verbose {
        return Ok(EnvFilter::try_new(level)?);
    }
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?)
}

fn init_logging(level: &str, verbose: bool) -> Result<()> {
    let filter = log_filter(level, verbose)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.resolve_config()?;
    init_logging(&config.logging.level, args.verbose)?;

    info!("Hydroponics Forest Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");
    info!("Dataset: {}", config.data.dataset_path.display());
    info!("Output: {}", config.artifacts.directory.display());

    let pipeline = TrainingPipeline::new(config);
    let (outcome, manifest) = pipeline.run().context("Training failed")?;

    info!("═══════════════════════════════════════════");
    info!("✓ Training completed successfully");
    info!("  Rows: {}", outcome.training_rows);
    if let Some(report) = &outcome.evaluation {
        info!("  Held-out average R2: {:.4}", report.average.r2);
        if let Some(path) = &args.report {
            report
                .save_json(path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("  Report: {}", path.display());
        }
    } else if args.report.is_some() {
        warn!("Evaluation did not run; no report written");
    }
    info!("  Bundle: {}", pipeline.config().artifacts.directory.display());

    println!("{}", manifest.bundle_hash);
    Ok(())
}
