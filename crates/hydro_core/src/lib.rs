//! Hydroponic cultivation predictor core
//!
//! Predicts cultivation days and total nutrient requirements (N, P, K, Ca,
//! Mg) from plant type, growth stage and growing conditions.
//!
//! Modules:
//! - `encoding`: Label encoders for the two nominal columns
//! - `features`: Feature/prediction vectors and advisory input bounds
//! - `forest`: Regression trees, random forests and the multi-output model
//! - `artifacts`: Bundle persistence with a hash-pinned manifest
//! - `inference`: Load-once prediction service
//! - `recommend`: Static cultivation advice
//! - `config`: Layered configuration
//! - `serde_canon`: Canonical JSON and BLAKE3 hashing

pub mod artifacts;
pub mod config;
pub mod encoding;
pub mod errors;
pub mod features;
pub mod forest;
pub mod inference;
pub mod recommend;
pub mod serde_canon;

pub use artifacts::{ArtifactBundle, ArtifactEntry, BundleManifest};
pub use config::{
    ArtifactConfig, DataConfig, EvaluationConfig, ForestConfig, HydroConfig, LoggingConfig,
};
pub use encoding::LabelEncoder;
pub use errors::{HydroError, Result};
pub use features::{
    FeatureVector, InputBounds, NumericRange, PredictionVector, RawInputs, FEATURE_COLUMNS,
    FEATURE_COUNT, GROWTH_STAGE_COLUMN, INPUT_BOUNDS, PLANT_TYPE_COLUMN, TARGET_COLUMNS,
    TARGET_COUNT,
};
pub use forest::{MultiOutputForest, Node, RandomForest, Tree};
pub use inference::Predictor;
pub use recommend::recommend;

/// Crate version string for manifests and reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
