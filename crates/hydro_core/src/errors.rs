//! Error types for the hydroponics core

use crate::serde_canon::CanonicalError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while training, loading or serving the predictor
#[derive(Error, Debug)]
pub enum HydroError {
    /// Training data missing, unreadable or not matching the expected schema
    #[error("Failed to load training data: {0}")]
    DataLoad(String),

    /// A persisted model or encoder file is absent
    #[error(
        "Model artifact not found: {}. Run `hydro-train` first to train the model and encoders.",
        path.display()
    )]
    ArtifactMissing { path: PathBuf },

    /// A persisted artifact does not belong to the bundle described by the manifest
    #[error("Artifact {name} does not match the bundle manifest (expected hash {expected}, found {actual}). Retrain to regenerate a consistent bundle.")]
    ArtifactMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// An inference request named a category that was never seen during training
    #[error("Unknown {field} category {value:?}; valid values are: {}", known.join(", "))]
    UnknownCategory {
        field: String,
        value: String,
        known: Vec<String>,
    },

    /// Feature and target matrices disagree in rows or columns
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Model or encoder structure is invalid
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Canonical serialization error
    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Result type for hydroponics core operations
pub type Result<T> = std::result::Result<T, HydroError>;
