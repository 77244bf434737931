//! Persisted model bundle
//!
//! A bundle is the fitted model plus both category encoders, stored as
//! three canonical JSON files and a manifest that pins their BLAKE3 hashes.
//! The manifest is written last and checked on load, so a model can never
//! be served with encoders from a different training run.

use crate::encoding::LabelEncoder;
use crate::errors::{HydroError, Result};
use crate::features::{GROWTH_STAGE_COLUMN, PLANT_TYPE_COLUMN};
use crate::forest::MultiOutputForest;
use crate::serde_canon::{hash_bytes_hex, to_canonical_json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const MODEL_FILE: &str = "hydroponics_model.json";
pub const PLANT_ENCODER_FILE: &str = "plant_encoder.json";
pub const STAGE_ENCODER_FILE: &str = "stage_encoder.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Manifest format version
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Fitted model and the two encoders it was trained with
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactBundle {
    pub model: MultiOutputForest,
    pub plant_encoder: LabelEncoder,
    pub stage_encoder: LabelEncoder,
}

/// One file recorded in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub file: String,
    /// BLAKE3 of the file contents, hex encoded
    pub blake3: String,
}

/// Description of a complete saved bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    /// RFC 3339 creation time
    pub created_at: String,
    pub training_rows: usize,
    pub feature_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub model: ArtifactEntry,
    pub plant_encoder: ArtifactEntry,
    pub stage_encoder: ArtifactEntry,
    /// BLAKE3 over the three file hashes, in the order above
    pub bundle_hash: String,
}

impl BundleManifest {
    fn entries(&self) -> [&ArtifactEntry; 3] {
        [&self.model, &self.plant_encoder, &self.stage_encoder]
    }
}

fn bundle_hash(model: &str, plant: &str, stage: &str) -> String {
    hash_bytes_hex(format!("{model}:{plant}:{stage}").as_bytes())
}

impl ArtifactBundle {
    pub fn new(
        model: MultiOutputForest,
        plant_encoder: LabelEncoder,
        stage_encoder: LabelEncoder,
    ) -> Result<Self> {
        let bundle = Self {
            model,
            plant_encoder,
            stage_encoder,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check the model and that each encoder sits in its own slot
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;

        for (encoder, expected) in [
            (&self.plant_encoder, PLANT_TYPE_COLUMN),
            (&self.stage_encoder, GROWTH_STAGE_COLUMN),
        ] {
            if encoder.field() != expected {
                return Err(HydroError::ValidationFailed(format!(
                    "encoder for {} was fitted on column {}",
                    expected,
                    encoder.field()
                )));
            }
            encoder.validate()?;
        }

        Ok(())
    }

    /// Write the bundle into `dir`, creating it if needed.
    ///
    /// Each file is written to a temporary file and renamed into place.
    /// The manifest goes last.
    pub fn save<P: AsRef<Path>>(&self, dir: P, training_rows: usize) -> Result<BundleManifest> {
        let dir = dir.as_ref();
        self.validate()?;
        fs::create_dir_all(dir)?;

        let model = write_artifact(dir, MODEL_FILE, &self.model)?;
        let plant_encoder = write_artifact(dir, PLANT_ENCODER_FILE, &self.plant_encoder)?;
        let stage_encoder = write_artifact(dir, STAGE_ENCODER_FILE, &self.stage_encoder)?;

        let manifest = BundleManifest {
            format_version: BUNDLE_FORMAT_VERSION,
            created_at: chrono::Utc::now().to_rfc3339(),
            training_rows,
            feature_columns: self.model.feature_columns.clone(),
            target_columns: self.model.target_columns.clone(),
            bundle_hash: bundle_hash(&model.blake3, &plant_encoder.blake3, &stage_encoder.blake3),
            model,
            plant_encoder,
            stage_encoder,
        };

        let json = to_canonical_json(&manifest)?;
        write_atomic(&dir.join(MANIFEST_FILE), json.as_bytes())?;

        info!(
            "Saved model bundle to {} (bundle hash {})",
            dir.display(),
            manifest.bundle_hash
        );
        Ok(manifest)
    }

    /// Load and verify a bundle previously written by [`ArtifactBundle::save`]
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_with_manifest(dir).map(|(bundle, _)| bundle)
    }

    pub fn load_with_manifest<P: AsRef<Path>>(dir: P) -> Result<(Self, BundleManifest)> {
        let dir = dir.as_ref();

        for file in [MODEL_FILE, PLANT_ENCODER_FILE, STAGE_ENCODER_FILE, MANIFEST_FILE] {
            let path = dir.join(file);
            if !path.is_file() {
                return Err(HydroError::ArtifactMissing { path });
            }
        }

        let manifest: BundleManifest =
            serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;
        if manifest.format_version != BUNDLE_FORMAT_VERSION {
            return Err(HydroError::ValidationFailed(format!(
                "Unsupported bundle format version: {}",
                manifest.format_version
            )));
        }

        let expected_bundle = bundle_hash(
            &manifest.model.blake3,
            &manifest.plant_encoder.blake3,
            &manifest.stage_encoder.blake3,
        );
        if expected_bundle != manifest.bundle_hash {
            return Err(HydroError::ArtifactMismatch {
                name: MANIFEST_FILE.to_string(),
                expected: expected_bundle,
                actual: manifest.bundle_hash,
            });
        }

        let [model_entry, plant_entry, stage_entry] = manifest.entries();
        let bundle = Self {
            model: read_artifact(dir, MODEL_FILE, model_entry)?,
            plant_encoder: read_artifact(dir, PLANT_ENCODER_FILE, plant_entry)?,
            stage_encoder: read_artifact(dir, STAGE_ENCODER_FILE, stage_entry)?,
        };
        bundle.validate()?;

        info!(
            "Loaded model bundle from {} ({} plant types, {} growth stages, {} trees per target)",
            dir.display(),
            bundle.plant_encoder.len(),
            bundle.stage_encoder.len(),
            bundle.model.trees_per_target()
        );
        Ok((bundle, manifest))
    }
}

fn write_artifact<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<ArtifactEntry> {
    let json = to_canonical_json(value)?;
    write_atomic(&dir.join(file), json.as_bytes())?;

    let entry = ArtifactEntry {
        file: file.to_string(),
        blake3: hash_bytes_hex(json.as_bytes()),
    };
    debug!("Wrote {} ({} bytes, blake3 {})", file, json.len(), entry.blake3);
    Ok(entry)
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, file: &str, entry: &ArtifactEntry) -> Result<T> {
    if entry.file != file {
        return Err(HydroError::ValidationFailed(format!(
            "manifest lists {} where {} was expected",
            entry.file, file
        )));
    }

    let bytes = fs::read(dir.join(file))?;
    let actual = hash_bytes_hex(&bytes);
    if actual != entry.blake3 {
        return Err(HydroError::ArtifactMismatch {
            name: file.to_string(),
            expected: entry.blake3.clone(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&bytes)?)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| HydroError::Io(e.error))?;
    Ok(())
}
