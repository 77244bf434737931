//! Held-out regression metrics.
//!
//! Metrics are computed per target and then macro-averaged across the six
//! outputs. They are diagnostic only and never gate the delivered model.

use hydroponics_core::{HydroError, MultiOutputForest, TARGET_COLUMNS, TARGET_COUNT};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::dataset::EncodedDataset;
use crate::errors::Result;

/// R², mean absolute error and mean squared error for one target
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
}

impl RegressionMetrics {
    /// Score `predicted` against `actual`.
    ///
    /// A constant `actual` column has no variance; R² is then 1.0 for exact
    /// predictions and 0.0 otherwise.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        let n = actual.len().min(predicted.len());
        if n == 0 {
            return Self::default();
        }

        let (abs_sum, sq_sum) = actual
            .iter()
            .zip(predicted)
            .fold((0.0, 0.0), |(abs, sq), (&a, &p)| {
                let diff = p - a;
                (abs + diff.abs(), sq + diff * diff)
            });

        let mean = actual[..n].iter().sum::<f64>() / n as f64;
        let total: f64 = actual[..n].iter().map(|&a| (a - mean) * (a - mean)).sum();

        let r2 = if total > 0.0 {
            1.0 - sq_sum / total
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        Self {
            r2,
            mae: abs_sum / n as f64,
            mse: sq_sum / n as f64,
        }
    }

    /// Unweighted mean of several metric sets
    pub fn average(metrics: &[RegressionMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }

        let n = metrics.len() as f64;
        Self {
            r2: metrics.iter().map(|m| m.r2).sum::<f64>() / n,
            mae: metrics.iter().map(|m| m.mae).sum::<f64>() / n,
            mse: metrics.iter().map(|m| m.mse).sum::<f64>() / n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetMetrics {
    pub target: String,
    #[serde(flatten)]
    pub metrics: RegressionMetrics,
}

/// Held-out evaluation of a model fitted on the training split
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub per_target: Vec<TargetMetrics>,
    pub average: RegressionMetrics,
}

impl EvaluationReport {
    pub fn evaluate(model: &MultiOutputForest, test: &EncodedDataset, train_rows: usize) -> Self {
        let predictions: Vec<[f64; TARGET_COUNT]> = test
            .features
            .iter()
            .map(|features| model.predict(features).to_array())
            .collect();

        let per_target: Vec<TargetMetrics> = TARGET_COLUMNS
            .iter()
            .enumerate()
            .map(|(t, &target)| {
                let actual: Vec<f64> = test.targets.iter().map(|y| y.to_array()[t]).collect();
                let predicted: Vec<f64> = predictions.iter().map(|p| p[t]).collect();
                TargetMetrics {
                    target: target.to_string(),
                    metrics: RegressionMetrics::compute(&actual, &predicted),
                }
            })
            .collect();

        let all: Vec<RegressionMetrics> = per_target.iter().map(|t| t.metrics).collect();

        Self {
            train_rows,
            test_rows: test.len(),
            average: RegressionMetrics::average(&all),
            per_target,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(HydroError::from)?;
        fs::write(path, json).map_err(HydroError::from)?;
        Ok(())
    }
}
