//! Feature and prediction vectors
//!
//! The column order defined here is the contract between training and
//! inference: categorical codes come last, growth stage before plant type.

use serde::{Deserialize, Serialize};

/// Number of model input features
pub const FEATURE_COUNT: usize = 6;

/// Number of regression targets
pub const TARGET_COUNT: usize = 6;

/// Input feature columns, in model order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Temperature",
    "Humidity",
    "Light_Intensity",
    "Plant_Count",
    "Growth_Stage",
    "Plant_Type",
];

/// Target columns, in prediction order
pub const TARGET_COLUMNS: [&str; TARGET_COUNT] = [
    "Predicted_Cultivation_Days",
    "Total_N",
    "Total_P",
    "Total_K",
    "Total_Ca",
    "Total_Mg",
];

/// Nominal column holding the plant type
pub const PLANT_TYPE_COLUMN: &str = "Plant_Type";

/// Nominal column holding the growth stage
pub const GROWTH_STAGE_COLUMN: &str = "Growth_Stage";

/// Encoded model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative humidity in %
    pub humidity: f64,
    /// Light intensity in lux
    pub light_intensity: f64,
    pub plant_count: u32,
    /// Growth stage code from the stage encoder
    pub growth_stage: u32,
    /// Plant type code from the plant encoder
    pub plant_type: u32,
}

impl FeatureVector {
    /// Values in [`FEATURE_COLUMNS`] order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.temperature,
            self.humidity,
            self.light_intensity,
            f64::from(self.plant_count),
            f64::from(self.growth_stage),
            f64::from(self.plant_type),
        ]
    }

    /// True when every numeric field is finite
    pub fn is_finite(&self) -> bool {
        self.temperature.is_finite() && self.humidity.is_finite() && self.light_intensity.is_finite()
    }
}

/// Model output: cultivation duration and total nutrient requirements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionVector {
    pub cultivation_days: f64,
    /// Total nitrogen (N)
    pub nitrogen: f64,
    /// Total phosphorus (P)
    pub phosphorus: f64,
    /// Total potassium (K)
    pub potassium: f64,
    /// Total calcium (Ca)
    pub calcium: f64,
    /// Total magnesium (Mg)
    pub magnesium: f64,
}

impl PredictionVector {
    /// Build from values in [`TARGET_COLUMNS`] order
    pub fn from_array(values: [f64; TARGET_COUNT]) -> Self {
        let [cultivation_days, nitrogen, phosphorus, potassium, calcium, magnesium] = values;
        Self {
            cultivation_days,
            nitrogen,
            phosphorus,
            potassium,
            calcium,
            magnesium,
        }
    }

    /// Values in [`TARGET_COLUMNS`] order
    pub fn to_array(&self) -> [f64; TARGET_COUNT] {
        [
            self.cultivation_days,
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.calcium,
            self.magnesium,
        ]
    }

    /// Nutrient totals with their chart labels
    pub fn nutrients(&self) -> [(&'static str, f64); 5] {
        [
            ("N", self.nitrogen),
            ("P", self.phosphorus),
            ("K", self.potassium),
            ("Ca", self.calcium),
            ("Mg", self.magnesium),
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

/// Raw, unencoded inference request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    pub plant_type: String,
    pub growth_stage: String,
    pub temperature: f64,
    pub humidity: f64,
    pub light_intensity: f64,
    pub plant_count: u32,
}

/// Advisory range for one numeric input
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
    /// Required increment from `min`, if any
    pub step: Option<f64>,
}

impl NumericRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            step: None,
        }
    }

    pub const fn stepped(min: f64, max: f64, step: f64) -> Self {
        Self {
            min,
            max,
            step: Some(step),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() || value < self.min || value > self.max {
            return false;
        }

        match self.step {
            Some(step) => ((value - self.min) / step).fract() == 0.0,
            None => true,
        }
    }
}

/// Input constraints offered to front ends.
///
/// The core never enforces these; presentation layers use them to bound
/// their widgets and reject out-of-range requests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputBounds {
    pub temperature: NumericRange,
    pub humidity: NumericRange,
    pub light_intensity: NumericRange,
    pub plant_count: NumericRange,
}

pub const INPUT_BOUNDS: InputBounds = InputBounds {
    temperature: NumericRange::new(22.0, 38.0),
    humidity: NumericRange::new(40.0, 90.0),
    light_intensity: NumericRange::stepped(5_000.0, 40_000.0, 1_000.0),
    plant_count: NumericRange::new(10.0, 100.0),
};

impl InputBounds {
    /// Describe every input that falls outside its advisory range
    pub fn violations(&self, inputs: &RawInputs) -> Vec<String> {
        let checks = [
            ("temperature", self.temperature, inputs.temperature),
            ("humidity", self.humidity, inputs.humidity),
            ("light_intensity", self.light_intensity, inputs.light_intensity),
            ("plant_count", self.plant_count, f64::from(inputs.plant_count)),
        ];

        checks
            .iter()
            .filter(|(_, range, value)| !range.contains(*value))
            .map(|(name, range, value)| match range.step {
                Some(step) => format!(
                    "{name} = {value} must be within [{}, {}] in steps of {step}",
                    range.min, range.max
                ),
                None => format!("{name} = {value} must be within [{}, {}]", range.min, range.max),
            })
            .collect()
    }
}
