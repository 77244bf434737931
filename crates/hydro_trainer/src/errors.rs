use hydroponics_core::HydroError;
use thiserror::Error;

/// Errors returned by the trainer.
#[derive(Debug, Error)]
pub enum TrainerError {
    /// Data loading, shape and artifact failures shared with the core
    #[error(transparent)]
    Core(#[from] HydroError),

    #[error("training error: {0}")]
    Training(String),
}

impl TrainerError {
    pub(crate) fn data_load(message: impl Into<String>) -> Self {
        Self::Core(HydroError::DataLoad(message.into()))
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Core(HydroError::ShapeMismatch(message.into()))
    }
}

pub type Result<T> = std::result::Result<T, TrainerError>;
