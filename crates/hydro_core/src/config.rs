//! Configuration for training and serving
//!
//! Values are layered: defaults, then an optional TOML file, then
//! `HYDRO_*` environment variables. Binaries apply their own flags last.

use crate::errors::{HydroError, Result};
use crate::features::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydroConfig {
    pub data: DataConfig,
    pub artifacts: ArtifactConfig,
    pub forest: ForestConfig,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

/// Training data location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dataset_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("Hydroponics_Indian_Plants_1000.csv"),
        }
    }
}

/// Where the model bundle lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub directory: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("models"),
        }
    }
}

/// Random forest hyperparameters, shared by every target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Trees per target
    pub n_estimators: usize,
    /// Base seed for bootstrap sampling and feature selection
    pub seed: u64,
    /// Maximum tree depth (unlimited when unset)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (all when unset)
    pub max_features: Option<usize>,
    /// Sample rows with replacement for each tree
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
        }
    }
}

/// Held-out evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub enabled: bool,
    /// Fraction of rows held out for scoring
    pub test_fraction: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HydroError::InvalidConfig(format!("{key}={value:?} could not be parsed")))
}

impl HydroConfig {
    /// Load configuration from a TOML file; missing sections keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            HydroError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `HYDRO_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HYDRO_DATASET_PATH") {
            self.data.dataset_path = PathBuf::from(val);
        }

        if let Some(val) = lookup("HYDRO_MODEL_DIR") {
            self.artifacts.directory = PathBuf::from(val);
        }

        if let Some(val) = lookup("HYDRO_TREES") {
            self.forest.n_estimators = parse_env("HYDRO_TREES", &val)?;
        }

        if let Some(val) = lookup("HYDRO_SEED") {
            self.forest.seed = parse_env("HYDRO_SEED", &val)?;
        }

        if let Some(val) = lookup("HYDRO_LOG_LEVEL") {
            self.logging.level = val;
        }

        if let Some(val) = lookup("HYDRO_EVALUATE") {
            self.evaluation.enabled = parse_env("HYDRO_EVALUATE", &val)?;
        }

        Ok(())
    }

    /// Reject impossible values and return warnings for odd ones
    pub fn validate(&self) -> Result<Vec<String>> {
        let forest = &self.forest;

        if forest.n_estimators == 0 {
            return Err(HydroError::InvalidConfig(
                "forest.n_estimators must be at least 1".to_string(),
            ));
        }

        if forest.min_samples_split < 2 {
            return Err(HydroError::InvalidConfig(
                "forest.min_samples_split must be at least 2".to_string(),
            ));
        }

        if forest.min_samples_leaf == 0 {
            return Err(HydroError::InvalidConfig(
                "forest.min_samples_leaf must be at least 1".to_string(),
            ));
        }

        if let Some(max_features) = forest.max_features {
            if max_features == 0 || max_features > FEATURE_COUNT {
                return Err(HydroError::InvalidConfig(format!(
                    "forest.max_features must be within 1..={FEATURE_COUNT}"
                )));
            }
        }

        let fraction = self.evaluation.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(HydroError::InvalidConfig(format!(
                "evaluation.test_fraction must be in (0, 1), got {fraction}"
            )));
        }

        let mut warnings = Vec::new();

        if forest.n_estimators < 10 {
            warnings.push(format!(
                "Only {} trees per target; predictions will be noisy",
                forest.n_estimators
            ));
        }

        if forest.max_depth == Some(0) {
            warnings.push("max_depth is 0, every tree is a single leaf".to_string());
        }

        if self.evaluation.enabled && fraction > 0.5 {
            warnings.push(format!("Holding out {fraction} of the data for evaluation"));
        }

        if warnings.is_empty() {
            info!("Configuration validation passed");
        } else {
            warn!("Configuration validation warnings: {:?}", warnings);
        }

        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = HydroConfig::default();
        assert_eq!(config.forest.n_estimators, 200);
        assert_eq!(config.forest.seed, 42);
        assert!(config.forest.bootstrap);
        assert_eq!(config.evaluation.test_fraction, 0.2);
        assert_eq!(config.artifacts.directory, PathBuf::from("models"));
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> anyhow::Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        std::fs::write(
            file.path(),
            "[forest]\nn_estimators = 50\n\n[evaluation]\nenabled = false\n",
        )?;

        let config = HydroConfig::load_from_file(file.path())?;
        assert_eq!(config.forest.n_estimators, 50);
        assert_eq!(config.forest.seed, 42);
        assert!(!config.evaluation.enabled);
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("HYDRO_MODEL_DIR", "/tmp/bundle"),
            ("HYDRO_TREES", "25"),
            ("HYDRO_EVALUATE", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = HydroConfig::default();
        config
            .apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.artifacts.directory, PathBuf::from("/tmp/bundle"));
        assert_eq!(config.forest.n_estimators, 25);
        assert!(!config.evaluation.enabled);
        assert_eq!(config.forest.seed, 42);
    }

    #[test]
    fn test_bad_override_is_an_error() {
        let mut config = HydroConfig::default();
        let result = config.apply_overrides_from(|key| {
            (key == "HYDRO_SEED").then(|| "forty-two".to_string())
        });
        assert!(matches!(result, Err(HydroError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = HydroConfig::default();
        config.forest.n_estimators = 0;
        assert!(config.validate().is_err());

        let mut config = HydroConfig::default();
        config.evaluation.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = HydroConfig::default();
        config.forest.max_features = Some(7);
        assert!(config.validate().is_err());

        let mut config = HydroConfig::default();
        config.forest.n_estimators = 3;
        assert_eq!(config.validate().unwrap().len(), 1);
    }
}
