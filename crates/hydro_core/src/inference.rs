//! Inference service
//!
//! [`Predictor`] is built once per process from a loaded or freshly trained
//! bundle and then shared read-only by whoever serves requests.

use crate::artifacts::ArtifactBundle;
use crate::errors::{HydroError, Result};
use crate::features::{FeatureVector, PredictionVector, RawInputs};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Load-once handle over a fitted bundle
#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: Arc<ArtifactBundle>,
}

impl Predictor {
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self::from_shared(Arc::new(bundle))
    }

    pub fn from_shared(bundle: Arc<ArtifactBundle>) -> Self {
        Self { bundle }
    }

    /// Load and verify the bundle stored in `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self::new(ArtifactBundle::load(dir)?))
    }

    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Selectable plant types, in code order
    pub fn plant_types(&self) -> &[String] {
        self.bundle.plant_encoder.classes()
    }

    /// Selectable growth stages, in code order
    pub fn growth_stages(&self) -> &[String] {
        self.bundle.stage_encoder.classes()
    }

    /// Encode raw inputs into the model's feature order
    pub fn encode(&self, inputs: &RawInputs) -> Result<FeatureVector> {
        let plant_type = self.bundle.plant_encoder.transform(&inputs.plant_type)?;
        let growth_stage = self.bundle.stage_encoder.transform(&inputs.growth_stage)?;

        let features = FeatureVector {
            temperature: inputs.temperature,
            humidity: inputs.humidity,
            light_intensity: inputs.light_intensity,
            plant_count: inputs.plant_count,
            growth_stage,
            plant_type,
        };

        if !features.is_finite() {
            return Err(HydroError::ValidationFailed(
                "numeric inputs must be finite".to_string(),
            ));
        }

        Ok(features)
    }

    /// Predict from an already encoded row
    pub fn predict_features(&self, features: &FeatureVector) -> PredictionVector {
        self.bundle.model.predict(features)
    }

    pub fn predict(&self, inputs: &RawInputs) -> Result<PredictionVector> {
        let features = self.encode(inputs)?;
        let prediction = self.predict_features(&features);
        debug!(
            plant_type = %inputs.plant_type,
            growth_stage = %inputs.growth_stage,
            days = prediction.cultivation_days,
            "prediction served"
        );
        Ok(prediction)
    }

    /// Raw prediction, no clamping or rounding
    pub fn predict_from_inputs(
        &self,
        plant_type: &str,
        growth_stage: &str,
        temperature: f64,
        humidity: f64,
        light_intensity: f64,
        plant_count: u32,
    ) -> Result<PredictionVector> {
        self.predict(&RawInputs {
            plant_type: plant_type.to_string(),
            growth_stage: growth_stage.to_string(),
            temperature,
            humidity,
            light_intensity,
            plant_count,
        })
    }
}
