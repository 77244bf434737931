//! Hydroponics trainer - deterministic offline random-forest trainer
//!
//! Loads the labelled dataset, fits the category encoders and one bagged
//! regression forest per target, scores a held-out split and produces an
//! [`ArtifactBundle`](hydroponics_core::ArtifactBundle) ready to persist.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod pipeline;
pub mod trainer;

pub use cart::{CartBuilder, GrownTree, TreeConfig};
pub use dataset::{Dataset, EncodedDataset, FeatureStats, TrainingRecord};
pub use deterministic::{derive_seed, shuffled_indices, LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use metrics::{EvaluationReport, RegressionMetrics, TargetMetrics};
pub use pipeline::{train_from_csv, TrainingOutcome, TrainingPipeline};
pub use trainer::ForestTrainer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
