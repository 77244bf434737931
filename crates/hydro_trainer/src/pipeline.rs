//! End-to-end training pipeline
//!
//! Load the dataset, fit both encoders, optionally score a model fitted on
//! a seeded 80/20 split, then fit the delivered model on every row.

use hydroponics_core::{ArtifactBundle, BundleManifest, HydroConfig};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::dataset::{Dataset, EncodedDataset};
use crate::errors::Result;
use crate::metrics::EvaluationReport;
use crate::trainer::ForestTrainer;

/// Everything a training run produces
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Model fitted on all rows, with its encoders
    pub bundle: ArtifactBundle,
    /// Held-out scores, when evaluation ran
    pub evaluation: Option<EvaluationReport>,
    pub training_rows: usize,
}

pub struct TrainingPipeline {
    config: HydroConfig,
}

impl TrainingPipeline {
    pub fn new(config: HydroConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HydroConfig {
        &self.config
    }

    /// Train from the configured dataset and persist to the configured directory
    pub fn run(&self) -> Result<(TrainingOutcome, BundleManifest)> {
        let outcome = self.train(&self.config.data.dataset_path)?;
        let manifest = outcome
            .bundle
            .save(&self.config.artifacts.directory, outcome.training_rows)?;
        Ok((outcome, manifest))
    }

    /// Train from a CSV file without persisting anything
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn train<P: AsRef<Path>>(&self, path: P) -> Result<TrainingOutcome> {
        let dataset = Dataset::from_csv(path)?;
        self.train_dataset(&dataset)
    }

    #[instrument(skip_all, fields(rows = dataset.len()))]
    pub fn train_dataset(&self, dataset: &Dataset) -> Result<TrainingOutcome> {
        self.config.validate()?;

        let (plant_encoder, stage_encoder) = dataset.fit_encoders();
        info!("Plant types: {:?}", plant_encoder.classes());
        info!("Growth stages: {:?}", stage_encoder.classes());

        let encoded = dataset.encode(&plant_encoder, &stage_encoder)?;
        for stats in encoded.feature_stats() {
            info!(
                "  {}: min={}, max={}, mean={:.3}",
                stats.column, stats.min, stats.max, stats.mean
            );
        }

        let forest = &self.config.forest;
        info!(
            "Forest: {} trees per target, seed {}, max_depth {:?}, min_samples_split {}, min_samples_leaf {}, max_features {:?}, bootstrap {}",
            forest.n_estimators,
            forest.seed,
            forest.max_depth,
            forest.min_samples_split,
            forest.min_samples_leaf,
            forest.max_features,
            forest.bootstrap
        );

        let trainer = ForestTrainer::new(forest.clone());

        let evaluation = if self.config.evaluation.enabled {
            self.evaluate(&trainer, &encoded)?
        } else {
            None
        };

        let model = trainer.fit_multi(&encoded.features, &encoded.targets)?;
        info!("Model hash: {}", model.hash_hex()?);

        for (target, importances) in model.feature_importances() {
            let ranked = importances
                .iter()
                .map(|(feature, value)| format!("{feature}={value:.3}"))
                .collect::<Vec<_>>()
                .join(" ");
            info!("Feature importance for {}: {}", target, ranked);
        }

        let bundle = ArtifactBundle::new(model, plant_encoder, stage_encoder)?;
        Ok(TrainingOutcome {
            bundle,
            evaluation,
            training_rows: encoded.len(),
        })
    }

    /// Fit on the train split and score the test split
    fn evaluate(
        &self,
        trainer: &ForestTrainer,
        encoded: &EncodedDataset,
    ) -> Result<Option<EvaluationReport>> {
        let settings = &self.config.evaluation;
        let Some((train, test)) = encoded.train_test_split(settings.test_fraction, settings.seed)
        else {
            warn!(
                "Skipping evaluation: {} rows cannot be split with test fraction {}",
                encoded.len(),
                settings.test_fraction
            );
            return Ok(None);
        };

        info!(
            "Evaluating on {} held-out rows ({} training rows)",
            test.len(),
            train.len()
        );
        let model = trainer.fit_multi(&train.features, &train.targets)?;
        let report = EvaluationReport::evaluate(&model, &test, train.len());

        for target in &report.per_target {
            info!(
                "  {}: R2={:.4} MAE={:.4} MSE={:.4}",
                target.target, target.metrics.r2, target.metrics.mae, target.metrics.mse
            );
        }
        info!(
            "  average: R2={:.4} MAE={:.4} MSE={:.4}",
            report.average.r2, report.average.mae, report.average.mse
        );

        Ok(Some(report))
    }
}

/// Train with default settings: 200 trees per target, seed 42
pub fn train_from_csv<P: AsRef<Path>>(path: P) -> Result<TrainingOutcome> {
    TrainingPipeline::new(HydroConfig::default()).train(path)
}
