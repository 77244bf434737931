//! Random forest trainer
//!
//! Grows bagged CART regression trees in parallel with rayon. Every tree
//! draws its bootstrap sample from a seed derived from the forest seed and
//! its own index, so results do not depend on thread scheduling.

use hydroponics_core::{
    FeatureVector, ForestConfig, MultiOutputForest, PredictionVector, RandomForest,
    FEATURE_COUNT, TARGET_COLUMNS, TARGET_COUNT,
};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::cart::{CartBuilder, GrownTree, TreeConfig};
use crate::deterministic::{derive_seed, LcgRng};
use crate::errors::{Result, TrainerError};

/// Random forest trainer
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit one forest to a single target column
    pub fn fit(&self, features: &[Vec<f64>], targets: &[f64]) -> Result<RandomForest> {
        let n_samples = features.len();
        if n_samples == 0 {
            return Err(TrainerError::shape("cannot fit a forest on zero rows"));
        }
        if targets.len() != n_samples {
            return Err(TrainerError::shape(format!(
                "{} feature rows but {} targets",
                n_samples,
                targets.len()
            )));
        }
        if self.config.n_estimators == 0 {
            return Err(TrainerError::Training(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let n_features = features[0].len();
        if let Some(row) = features.iter().position(|row| row.len() != n_features) {
            return Err(TrainerError::shape(format!(
                "row {} has {} features, expected {}",
                row,
                features[row].len(),
                n_features
            )));
        }

        let tree_config = TreeConfig::from(&self.config);
        let grown: Vec<GrownTree> = (0..self.config.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = LcgRng::new(derive_seed(self.config.seed, tree_idx as u64));
                let sample: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples).map(|_| rng.next_range(n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                CartBuilder::new(features, targets, &tree_config).build(sample, &mut rng)
            })
            .collect();

        let feature_importances = aggregate_importances(&grown, n_features);
        let trees = grown.into_iter().map(|g| g.tree).collect();

        Ok(RandomForest::new(trees, n_features, feature_importances))
    }

    /// Fit one forest per target column.
    ///
    /// `features` rows must have [`FEATURE_COUNT`] values and `targets` rows
    /// [`TARGET_COUNT`] values, all finite.
    pub fn fit_rows(&self, features: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<MultiOutputForest> {
        if features.len() != targets.len() {
            return Err(TrainerError::shape(format!(
                "{} feature rows but {} target rows",
                features.len(),
                targets.len()
            )));
        }

        for (i, (x, y)) in features.iter().zip(targets).enumerate() {
            if x.len() != FEATURE_COUNT || y.len() != TARGET_COUNT {
                return Err(TrainerError::shape(format!(
                    "row {} has {} features and {} targets, expected {} and {}",
                    i,
                    x.len(),
                    y.len(),
                    FEATURE_COUNT,
                    TARGET_COUNT
                )));
            }
            if !x.iter().chain(y).all(|v| v.is_finite()) {
                return Err(TrainerError::shape(format!("row {i} has a non-finite value")));
            }
        }

        info!(
            "Fitting {} forests of {} trees on {} rows",
            TARGET_COUNT,
            self.config.n_estimators,
            features.len()
        );

        let estimators = (0..TARGET_COUNT)
            .into_par_iter()
            .map(|t| {
                let column: Vec<f64> = targets.iter().map(|y| y[t]).collect();
                let forest = self.fit(features, &column)?;
                debug!("Fitted forest for {}", TARGET_COLUMNS[t]);
                Ok(forest)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(MultiOutputForest::new(estimators)?)
    }

    /// Fit the multi-output model from encoded rows
    pub fn fit_multi(
        &self,
        features: &[FeatureVector],
        targets: &[PredictionVector],
    ) -> Result<MultiOutputForest> {
        let x: Vec<Vec<f64>> = features.iter().map(|f| f.to_array().to_vec()).collect();
        let y: Vec<Vec<f64>> = targets.iter().map(|t| t.to_array().to_vec()).collect();
        self.fit_rows(&x, &y)
    }
}

/// Average of per-tree importances, each normalized to sum to one
fn aggregate_importances(grown: &[GrownTree], n_features: usize) -> Vec<f64> {
    let mut total = vec![0.0; n_features];

    for tree in grown {
        let sum: f64 = tree.importances.iter().sum();
        if sum > 0.0 {
            for (acc, value) in total.iter_mut().zip(&tree.importances) {
                *acc += value / sum;
            }
        }
    }

    let sum: f64 = total.iter().sum();
    if sum > 0.0 {
        for value in &mut total {
            *value /= sum;
        }
    }
    total
}
