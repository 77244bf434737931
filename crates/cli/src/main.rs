//! Hydroponic cultivation predictor CLI
//!
//! Serves predictions from the bundle written by `hydro-train`.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hydroponics_core::{recommend, HydroConfig, Predictor, RawInputs, INPUT_BOUNDS};
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod render;

use render::{BarChart, OptionsListing, PredictionReport, Summary, BAR_WIDTH};

#[derive(Parser)]
#[command(name = "hydro-cli")]
#[command(about = "Hydroponic cultivation and nutrient predictor", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the trained model bundle
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List plant types, growth stages and input ranges
    Options {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Predict cultivation days and nutrient totals
    Predict(PredictArgs),
    /// Show cultivation advice for a plant and stage
    Recommend {
        #[arg(long)]
        plant_type: String,
        #[arg(long)]
        growth_stage: String,
    },
}

#[derive(Args)]
struct PredictArgs {
    #[arg(long)]
    plant_type: String,
    #[arg(long)]
    growth_stage: String,
    /// Temperature in °C
    #[arg(long)]
    temperature: f64,
    /// Relative humidity in %
    #[arg(long)]
    humidity: f64,
    /// Light intensity in lux
    #[arg(long)]
    light_intensity: f64,
    #[arg(long)]
    plant_count: u32,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<HydroConfig> {
        let mut config = match &self.config {
            Some(path) => HydroConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => HydroConfig::default(),
        };
        config.apply_env().context("Invalid HYDRO_* environment override")?;

        if let Some(dir) = &self.model_dir {
            config.artifacts.directory = dir.clone();
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
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

fn load_predictor(config: &HydroConfig) -> Result<Predictor> {
    let dir = &config.artifacts.directory;
    debug!("Loading model bundle from {}", dir.display());
    Predictor::load(dir)
        .with_context(|| format!("Failed to load model bundle from {}", dir.display()))
}

fn handle_options(config: &HydroConfig, as_json: bool) -> Result<()> {
    let predictor = load_predictor(config)?;

    if as_json {
        let doc = json!({
            "plant_types": predictor.plant_types(),
            "growth_stages": predictor.growth_stages(),
            "ranges": INPUT_BOUNDS,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        let listing = OptionsListing {
            plant_types: predictor.plant_types(),
            growth_stages: predictor.growth_stages(),
            bounds: &INPUT_BOUNDS,
        };
        print!("{listing}");
    }
    Ok(())
}

fn handle_predict(config: &HydroConfig, args: PredictArgs) -> Result<()> {
    let inputs = RawInputs {
        plant_type: args.plant_type,
        growth_stage: args.growth_stage,
        temperature: args.temperature,
        humidity: args.humidity,
        light_intensity: args.light_intensity,
        plant_count: args.plant_count,
    };

    let violations = INPUT_BOUNDS.violations(&inputs);
    if !violations.is_empty() {
        bail!("Invalid inputs:\n  {}", violations.join("\n  "));
    }

    let predictor = load_predictor(config)?;
    let prediction = predictor.predict(&inputs)?;
    let advice = recommend(&inputs.plant_type, &inputs.growth_stage);

    if args.json {
        let report = PredictionReport::new(&inputs, &prediction, advice);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let summary = Summary {
        inputs: &inputs,
        prediction: &prediction,
    };
    let chart = BarChart {
        prediction: &prediction,
        width: BAR_WIDTH,
    };
    print!("{summary}");
    println!();
    println!("Nutrient requirements");
    print!("{chart}");
    println!();
    println!("Recommendation: {advice}");
    Ok(())
}

fn handle_recommend(plant_type: &str, growth_stage: &str) {
    println!("{}", recommend(plant_type, growth_stage));
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_logging(&config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Options { json } => handle_options(&config, json),
        Commands::Predict(args) => handle_predict(&config, args),
        Commands::Recommend {
            plant_type,
            growth_stage,
        } => {
            handle_recommend(&plant_type, &growth_stage);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::try_parse_from([
            "hydro-cli",
            "--model-dir",
            "bundle",
            "predict",
            "--plant-type",
            "Tomato",
            "--growth-stage",
            "Flowering",
            "--temperature",
            "28",
            "--humidity",
            "65",
            "--light-intensity",
            "20000",
            "--plant-count",
            "40",
        ])
        .unwrap();

        assert_eq!(cli.model_dir, Some(PathBuf::from("bundle")));
        match cli.command {
            Commands::Predict(args) => {
                assert_eq!(args.plant_type, "Tomato");
                assert_eq!(args.plant_count, 40);
                assert!(!args.json);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_verbose_overrides_rust_log() -> Result<()> {
        std::env::set_var("RUST_LOG", "error");
        assert_eq!(log_filter("debug", true)?.to_string(), "debug");
        assert_eq!(log_filter("debug", false)?.to_string(), "error");
        Ok(())
    }

    #[test]
    fn test_model_dir_flag_overrides_default() {
        let cli = Cli::try_parse_from(["hydro-cli", "options", "--model-dir", "elsewhere"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.artifacts.directory, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_out_of_range_inputs_fail_before_loading() {
        let config = HydroConfig {
            artifacts: hydroponics_core::ArtifactConfig {
                directory: PathBuf::from("/nonexistent/bundle"),
            },
            ..HydroConfig::default()
        };
        let args = PredictArgs {
            plant_type: "Tomato".to_string(),
            growth_stage: "Flowering".to_string(),
            temperature: 50.0,
            humidity: 65.0,
            light_intensity: 20_000.0,
            plant_count: 40,
            json: false,
        };

        let err = handle_predict(&config, args).unwrap_err();
        assert!(err.to_string().starts_with("Invalid inputs"));
    }

    #[test]
    fn test_missing_bundle_mentions_training() {
        let config = HydroConfig {
            artifacts: hydroponics_core::ArtifactConfig {
                directory: PathBuf::from("/nonexistent/bundle"),
            },
            ..HydroConfig::default()
        };
        let err = load_predictor(&config).unwrap_err();
        assert!(format!("{err:#}").contains("hydro-train"));
    }
}
