//! Random forest and multi-output forest models
//!
//! A [`RandomForest`] predicts one target as the mean of its trees.
//! A [`MultiOutputForest`] owns one independent forest per target column
//! and maps a [`FeatureVector`] to a [`PredictionVector`].

use super::tree::Tree;
use crate::errors::{HydroError, Result};
use crate::features::{
    FeatureVector, PredictionVector, FEATURE_COLUMNS, FEATURE_COUNT, TARGET_COLUMNS, TARGET_COUNT,
};
use crate::serde_canon::{hash_canonical_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Model format version
pub const MODEL_VERSION: i32 = 1;

/// Tree ensemble regressor for a single target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    /// Number of input features every tree expects
    pub n_features: usize,

    /// Trees in the ensemble, averaged with equal weight
    pub trees: Vec<Tree>,

    /// Impurity-based importance per feature (sums to 1, or all zero)
    pub feature_importances: Vec<f64>,
}

impl RandomForest {
    pub fn new(trees: Vec<Tree>, n_features: usize, feature_importances: Vec<f64>) -> Self {
        Self {
            n_features,
            trees,
            feature_importances,
        }
    }

    /// Mean of all tree outputs.
    ///
    /// Trees are summed in order so the result is reproducible bit for bit.
    /// The sum is centered on the first tree, so trees that all agree
    /// return their shared value exactly.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut outputs = self.trees.iter().map(|tree| tree.evaluate(features));
        let Some(first) = outputs.next() else {
            return 0.0;
        };
        let offset: f64 = outputs.map(|value| value - first).sum();
        first + offset / self.trees.len() as f64
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Validate forest structure
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(HydroError::ValidationFailed(
                "Forest has no trees".to_string(),
            ));
        }

        if self.feature_importances.len() != self.n_features {
            return Err(HydroError::ValidationFailed(format!(
                "Expected {} feature importances, found {}",
                self.n_features,
                self.feature_importances.len()
            )));
        }

        if let Some(value) = self.feature_importances.iter().find(|v| !v.is_finite()) {
            return Err(HydroError::ValidationFailed(format!(
                "Non-finite feature importance: {}",
                value
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| {
                HydroError::ValidationFailed(format!("Tree {} validation failed: {}", i, e))
            })?;
        }

        Ok(())
    }
}

/// One independent forest per target column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MultiOutputForest {
    /// Model format version
    pub version: i32,

    /// Input columns, in feature order
    pub feature_columns: Vec<String>,

    /// Output columns, in prediction order
    pub target_columns: Vec<String>,

    /// One forest per entry of `target_columns`
    pub estimators: Vec<RandomForest>,
}

impl MultiOutputForest {
    /// Assemble a model from per-target forests given in [`TARGET_COLUMNS`] order
    pub fn new(estimators: Vec<RandomForest>) -> Result<Self> {
        let model = Self {
            version: MODEL_VERSION,
            feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            target_columns: TARGET_COLUMNS.iter().map(|c| c.to_string()).collect(),
            estimators,
        };
        model.validate()?;
        Ok(model)
    }

    /// Validate the schema contract and every estimator
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_VERSION {
            return Err(HydroError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.feature_columns != FEATURE_COLUMNS {
            return Err(HydroError::ValidationFailed(format!(
                "Feature columns {:?} do not match {:?}",
                self.feature_columns, FEATURE_COLUMNS
            )));
        }

        if self.target_columns != TARGET_COLUMNS {
            return Err(HydroError::ValidationFailed(format!(
                "Target columns {:?} do not match {:?}",
                self.target_columns, TARGET_COLUMNS
            )));
        }

        if self.estimators.len() != TARGET_COUNT {
            return Err(HydroError::ShapeMismatch(format!(
                "expected {} estimators, found {}",
                TARGET_COUNT,
                self.estimators.len()
            )));
        }

        for (target, estimator) in self.target_columns.iter().zip(&self.estimators) {
            if estimator.n_features != FEATURE_COUNT {
                return Err(HydroError::ShapeMismatch(format!(
                    "{} estimator expects {} features, schema has {}",
                    target, estimator.n_features, FEATURE_COUNT
                )));
            }
            estimator.validate().map_err(|e| {
                HydroError::ValidationFailed(format!("{} estimator: {}", target, e))
            })?;
        }

        Ok(())
    }

    /// Predict all targets for one encoded row. Never mutates the model.
    pub fn predict(&self, features: &FeatureVector) -> PredictionVector {
        let row = features.to_array();
        let mut values = [0.0; TARGET_COUNT];
        for (value, estimator) in values.iter_mut().zip(&self.estimators) {
            *value = estimator.predict(&row);
        }
        PredictionVector::from_array(values)
    }

    /// Trees per estimator (all estimators share the ensemble size)
    pub fn trees_per_target(&self) -> usize {
        self.estimators.first().map_or(0, RandomForest::num_trees)
    }

    /// Feature importances per target, paired with column names
    pub fn feature_importances(&self) -> Vec<(&str, Vec<(&str, f64)>)> {
        self.target_columns
            .iter()
            .zip(&self.estimators)
            .map(|(target, estimator)| {
                let pairs = self
                    .feature_columns
                    .iter()
                    .map(String::as_str)
                    .zip(estimator.feature_importances.iter().copied())
                    .collect();
                (target.as_str(), pairs)
            })
            .collect()
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String> {
        Ok(to_canonical_json(self)?)
    }

    /// Compute model hash as hex string
    pub fn hash_hex(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Save model to JSON file with canonical serialization
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_canonical_json()?)?;
        Ok(())
    }

    /// Load and validate a model from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let model: MultiOutputForest = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::tree::Node;

    /// Forest whose trees split on the plant code (feature 5)
    pub(crate) fn plant_forest(low: f64, high: f64) -> RandomForest {
        let tree = Tree::new(vec![
            Node::internal(0, 5, 0.5, 1, 2),
            Node::leaf(1, low),
            Node::leaf(2, high),
        ]);
        let mut importances = vec![0.0; FEATURE_COUNT];
        importances[5] = 1.0;
        RandomForest::new(vec![tree.clone(), tree], FEATURE_COUNT, importances)
    }

    fn constant_forest(value: f64) -> RandomForest {
        RandomForest::new(
            vec![Tree::new(vec![Node::leaf(0, value)])],
            FEATURE_COUNT,
            vec![0.0; FEATURE_COUNT],
        )
    }

    fn create_test_model() -> MultiOutputForest {
        MultiOutputForest::new(vec![
            plant_forest(40.0, 90.0),
            plant_forest(1.0, 2.0),
            constant_forest(3.0),
            constant_forest(4.0),
            constant_forest(5.0),
            constant_forest(6.0),
        ])
        .unwrap()
    }

    fn row(plant_type: u32) -> FeatureVector {
        FeatureVector {
            temperature: 28.0,
            humidity: 65.0,
            light_intensity: 20_000.0,
            plant_count: 40,
            growth_stage: 0,
            plant_type,
        }
    }

    #[test]
    fn test_forest_averages_trees() {
        let forest = RandomForest::new(
            vec![
                Tree::new(vec![Node::leaf(0, 1.0)]),
                Tree::new(vec![Node::leaf(0, 2.0)]),
                Tree::new(vec![Node::leaf(0, 6.0)]),
            ],
            FEATURE_COUNT,
            vec![0.0; FEATURE_COUNT],
        );
        assert_eq!(forest.predict(&[0.0; FEATURE_COUNT]), 3.0);
    }

    #[test]
    fn test_agreeing_trees_return_exact_value() {
        let trees = (0..200).map(|i| Tree::new(vec![Node::leaf(i, 0.1)])).collect();
        let forest = RandomForest::new(trees, FEATURE_COUNT, vec![0.0; FEATURE_COUNT]);
        assert_eq!(forest.predict(&[0.0; FEATURE_COUNT]), 0.1);
    }

    #[test]
    fn test_multi_output_prediction_order() {
        let model = create_test_model();

        let tomato = model.predict(&row(1));
        assert_eq!(tomato.to_array(), [90.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let chilli = model.predict(&row(0));
        assert_eq!(chilli.cultivation_days, 40.0);
        assert_eq!(chilli.nitrogen, 1.0);
    }

    #[test]
    fn test_rejects_wrong_estimator_count() {
        let result = MultiOutputForest::new(vec![constant_forest(1.0)]);
        assert!(matches!(result, Err(HydroError::ShapeMismatch(_))));
    }

    #[test]
    fn test_rejects_empty_forest() {
        let mut estimators: Vec<RandomForest> =
            (0..TARGET_COUNT).map(|_| constant_forest(1.0)).collect();
        estimators[3].trees.clear();
        assert!(MultiOutputForest::new(estimators).is_err());
    }

    #[test]
    fn test_feature_importances_are_labelled() {
        let model = create_test_model();
        let importances = model.feature_importances();
        assert_eq!(importances.len(), TARGET_COUNT);
        assert_eq!(importances[0].0, "Predicted_Cultivation_Days");
        assert_eq!(importances[0].1[5], ("Plant_Type", 1.0));
    }

    #[test]
    fn test_save_load_json() {
        use tempfile::NamedTempFile;

        let model = create_test_model();
        let temp_file = NamedTempFile::new().unwrap();

        model.save_json(temp_file.path()).unwrap();
        let loaded = MultiOutputForest::load_json(temp_file.path()).unwrap();

        assert_eq!(model, loaded);
        assert_eq!(model.hash_hex().unwrap(), loaded.hash_hex().unwrap());
    }

    #[test]
    fn test_load_rejects_reordered_features() {
        let mut model = create_test_model();
        model.feature_columns.swap(4, 5);
        assert!(model.validate().is_err());
    }
}
