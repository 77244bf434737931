//! CSV dataset loading and preprocessing
//!
//! Reads the labelled hydroponics dataset, fits the two category encoders
//! and builds the encoded feature and target matrices.

use hydroponics_core::{
    FeatureVector, LabelEncoder, PredictionVector, FEATURE_COLUMNS, GROWTH_STAGE_COLUMN,
    PLANT_TYPE_COLUMN, TARGET_COLUMNS,
};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::deterministic::shuffled_indices;
use crate::errors::{Result, TrainerError};

/// One labelled row of the training file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(rename = "Plant_Type")]
    pub plant_type: String,
    #[serde(rename = "Growth_Stage")]
    pub growth_stage: String,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Humidity")]
    pub humidity: f64,
    #[serde(rename = "Light_Intensity")]
    pub light_intensity: f64,
    #[serde(rename = "Plant_Count")]
    pub plant_count: u32,
    #[serde(rename = "Predicted_Cultivation_Days")]
    pub cultivation_days: f64,
    #[serde(rename = "Total_N")]
    pub total_n: f64,
    #[serde(rename = "Total_P")]
    pub total_p: f64,
    #[serde(rename = "Total_K")]
    pub total_k: f64,
    #[serde(rename = "Total_Ca")]
    pub total_ca: f64,
    #[serde(rename = "Total_Mg")]
    pub total_mg: f64,
}

impl TrainingRecord {
    pub fn targets(&self) -> PredictionVector {
        PredictionVector {
            cultivation_days: self.cultivation_days,
            nitrogen: self.total_n,
            phosphorus: self.total_p,
            potassium: self.total_k,
            calcium: self.total_ca,
            magnesium: self.total_mg,
        }
    }

    fn numeric_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("Temperature", self.temperature),
            ("Humidity", self.humidity),
            ("Light_Intensity", self.light_intensity),
            ("Predicted_Cultivation_Days", self.cultivation_days),
            ("Total_N", self.total_n),
            ("Total_P", self.total_p),
            ("Total_K", self.total_k),
            ("Total_Ca", self.total_ca),
            ("Total_Mg", self.total_mg),
        ]
    }
}

/// Every column the training file must provide
pub fn required_columns() -> impl Iterator<Item = &'static str> {
    [PLANT_TYPE_COLUMN, GROWTH_STAGE_COLUMN]
        .into_iter()
        .chain(FEATURE_COLUMNS.iter().copied().take(4))
        .chain(TARGET_COLUMNS.iter().copied())
}

/// Labelled training data, in file order
#[derive(Clone, Debug)]
pub struct Dataset {
    pub records: Vec<TrainingRecord>,
}

impl Dataset {
    /// Load dataset from CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            TrainerError::data_load(format!("cannot open {}: {}", path.display(), e))
        })?;

        let dataset = Self::from_reader(file)?;
        info!(
            "Loaded {} records from {}",
            dataset.len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row. Column order is free; extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| TrainerError::data_load(format!("cannot read header: {e}")))?
            .clone();

        let missing: Vec<&str> = required_columns()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(TrainerError::data_load(format!(
                "missing required columns: {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = headers
            .iter()
            .filter(|h| !required_columns().any(|column| column == *h))
            .collect();
        if !extra.is_empty() {
            warn!("Ignoring extra columns: {}", extra.join(", "));
        }

        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<TrainingRecord>().enumerate() {
            // Header is line 1
            let line = i + 2;
            let record =
                row.map_err(|e| TrainerError::data_load(format!("line {line}: {e}")))?;

            if let Some((column, value)) =
                record.numeric_fields().into_iter().find(|(_, v)| !v.is_finite())
            {
                return Err(TrainerError::data_load(format!(
                    "line {line}: {column} is not finite ({value})"
                )));
            }

            records.push(record);
        }

        if records.is_empty() {
            return Err(TrainerError::data_load("dataset is empty"));
        }

        Ok(Self { records })
    }

    /// Get number of samples
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if dataset is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Fit the plant-type and growth-stage encoders, in that order
    pub fn fit_encoders(&self) -> (LabelEncoder, LabelEncoder) {
        let plant = LabelEncoder::fit(
            PLANT_TYPE_COLUMN,
            self.records.iter().map(|r| r.plant_type.as_str()),
        );
        let stage = LabelEncoder::fit(
            GROWTH_STAGE_COLUMN,
            self.records.iter().map(|r| r.growth_stage.as_str()),
        );
        (plant, stage)
    }

    /// Replace nominal columns with their codes
    pub fn encode(&self, plant: &LabelEncoder, stage: &LabelEncoder) -> Result<EncodedDataset> {
        let mut features = Vec::with_capacity(self.len());
        let mut targets = Vec::with_capacity(self.len());

        for record in &self.records {
            features.push(FeatureVector {
                temperature: record.temperature,
                humidity: record.humidity,
                light_intensity: record.light_intensity,
                plant_count: record.plant_count,
                growth_stage: stage.transform(&record.growth_stage)?,
                plant_type: plant.transform(&record.plant_type)?,
            });
            targets.push(record.targets());
        }

        Ok(EncodedDataset { features, targets })
    }
}

/// Per-feature summary for logging
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureStats {
    pub column: &'static str,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Encoded feature matrix with aligned targets
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedDataset {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<PredictionVector>,
}

impl EncodedDataset {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Rows at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Seeded shuffle split into `(train, test)`.
    ///
    /// The test side gets `ceil(len * test_fraction)` rows. Returns `None`
    /// when either side would be empty.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> Option<(Self, Self)> {
        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return None;
        }

        let order = shuffled_indices(n, seed);
        let (test, train) = order.split_at(n_test);
        Some((self.subset(train), self.subset(test)))
    }

    /// Min, max and mean of each feature column
    pub fn feature_stats(&self) -> Vec<FeatureStats> {
        FEATURE_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, &column)| {
                let values = self.features.iter().map(|f| f.to_array()[i]);
                let (min, max, sum) = values.fold(
                    (f64::INFINITY, f64::NEG_INFINITY, 0.0),
                    |(min, max, sum), v| (min.min(v), max.max(v), sum + v),
                );
                FeatureStats {
                    column,
                    min,
                    max,
                    mean: sum / self.len().max(1) as f64,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use hydroponics_core::HydroError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Plant_Type,Growth_Stage,Temperature,Humidity,Light_Intensity,Plant_Count,Predicted_Cultivation_Days,Total_N,Total_P,Total_K,Total_Ca,Total_Mg";

    fn create_test_csv() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{HEADER}")?;
        writeln!(file, "Tomato,Flowering,28.5,65,20000,40,95,120.5,40.2,180.0,90.1,5.0")?;
        writeln!(file, "Chilli,Vegetative,30,60,18000,25,110,100.0,35.5,150.0,80.0,5.0")?;
        writeln!(file, "Tomato,Seedling,24,70,15000,60,70,80.0,30.0,120.0,60.0,5.0")?;
        file.flush()?;
        Ok(file)
    }

    fn expect_data_load<T: std::fmt::Debug>(result: super::Result<T>) -> String {
        match result {
            Err(TrainerError::Core(HydroError::DataLoad(message))) => message,
            other => panic!("expected DataLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_load_csv() -> Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;

        assert_eq!(dataset.len(), 3);
        let first = &dataset.records[0];
        assert_eq!(first.plant_type, "Tomato");
        assert_eq!(first.temperature, 28.5);
        assert_eq!(first.plant_count, 40);
        assert_eq!(first.targets().potassium, 180.0);

        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let message = expect_data_load(Dataset::from_csv("does/not/exist.csv"));
        assert!(message.contains("does/not/exist.csv"));
    }

    #[test]
    fn test_missing_column() {
        let csv = "Plant_Type,Growth_Stage,Temperature\nTomato,Flowering,28\n";
        let message = expect_data_load(Dataset::from_reader(csv.as_bytes()));
        assert!(message.contains("Humidity"));
        assert!(message.contains("Total_Mg"));
    }

    #[test]
    fn test_extra_and_reordered_columns() -> Result<()> {
        let csv = "Notes,Total_Mg,Total_Ca,Total_K,Total_P,Total_N,Predicted_Cultivation_Days,Plant_Count,Light_Intensity,Humidity,Temperature,Growth_Stage,Plant_Type\n\
                   ok,5,90,180,40,120,95,40,20000,65,28,Flowering,Tomato\n";
        let dataset = Dataset::from_reader(csv.as_bytes())?;
        assert_eq!(dataset.records[0].plant_type, "Tomato");
        assert_eq!(dataset.records[0].total_mg, 5.0);
        Ok(())
    }

    #[test]
    fn test_bad_values() {
        let blank = format!("{HEADER}\nTomato,Flowering,,65,20000,40,95,120,40,180,90,5\n");
        let message = expect_data_load(Dataset::from_reader(blank.as_bytes()));
        assert!(message.starts_with("line 2"));

        let nan = format!("{HEADER}\nTomato,Flowering,28,NaN,20000,40,95,120,40,180,90,5\n");
        let message = expect_data_load(Dataset::from_reader(nan.as_bytes()));
        assert!(message.contains("Humidity"));

        let empty = format!("{HEADER}\n");
        expect_data_load(Dataset::from_reader(empty.as_bytes()));
    }

    #[test]
    fn test_encode() -> Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;
        let (plant, stage) = dataset.fit_encoders();

        assert_eq!(plant.classes(), &["Chilli", "Tomato"]);
        assert_eq!(stage.classes(), &["Flowering", "Seedling", "Vegetative"]);

        let encoded = dataset.encode(&plant, &stage)?;
        assert_eq!(encoded.len(), 3);
        assert_eq!(encoded.features[0].plant_type, 1);
        assert_eq!(encoded.features[0].growth_stage, 0);
        assert_eq!(encoded.features[1].growth_stage, 2);
        assert_eq!(encoded.targets[1].cultivation_days, 110.0);

        // Encoders are independent: swapping them fails to encode
        assert!(dataset.encode(&stage, &plant).is_err());
        Ok(())
    }

    #[test]
    fn test_split_sizes_and_determinism() -> Result<()> {
        let rows = (0..10)
            .map(|i| format!("Tomato,Flowering,{},65,20000,40,{},1,1,1,1,5", 22 + i, 90 + i))
            .collect::<Vec<_>>()
            .join("\n");
        let dataset = Dataset::from_reader(format!("{HEADER}\n{rows}\n").as_bytes())?;
        let (plant, stage) = dataset.fit_encoders();
        let encoded = dataset.encode(&plant, &stage)?;

        let (train, test) = encoded.train_test_split(0.2, 42).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        assert_eq!(Some((train.clone(), test.clone())), encoded.train_test_split(0.2, 42));

        let mut days: Vec<f64> = train
            .targets
            .iter()
            .chain(&test.targets)
            .map(|t| t.cultivation_days)
            .collect();
        days.sort_by(f64::total_cmp);
        assert_eq!(days, (90..100).map(f64::from).collect::<Vec<_>>());

        assert!(encoded.subset(&[0]).train_test_split(0.2, 42).is_none());
        Ok(())
    }

    #[test]
    fn test_feature_stats() -> Result<()> {
        let file = create_test_csv()?;
        let dataset = Dataset::from_csv(file.path())?;
        let (plant, stage) = dataset.fit_encoders();
        let stats = dataset.encode(&plant, &stage)?.feature_stats();

        assert_eq!(stats.len(), 6);
        assert_eq!(stats[0].column, "Temperature");
        assert_eq!(stats[0].min, 24.0);
        assert_eq!(stats[0].max, 30.0);
        assert_eq!(stats[3].mean, 125.0 / 3.0);
        Ok(())
    }
}
