//! Label encoding for nominal columns
//!
//! A [`LabelEncoder`] maps a closed, data-derived vocabulary of category
//! strings onto dense integer codes. Codes are assigned by lexical order of
//! the distinct values, so the same training data always yields the same
//! codes and the same `classes()` listing.

use crate::errors::{HydroError, Result};
use serde::{Deserialize, Serialize};

/// Fitted bijection between category strings and `0..len()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    /// Column this encoder was fitted on (e.g. `Plant_Type`)
    field: String,

    /// Vocabulary in code order (strictly ascending)
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder from the observed values of one column.
    pub fn fit<I, S>(field: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = categories
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect();
        classes.sort();
        classes.dedup();

        Self {
            field: field.into(),
            classes,
        }
    }

    /// Look up the code of a known category.
    pub fn transform(&self, category: &str) -> Result<u32> {
        self.classes
            .binary_search_by(|probe| probe.as_str().cmp(category))
            .map(|idx| idx as u32)
            .map_err(|_| HydroError::UnknownCategory {
                field: self.field.clone(),
                value: category.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Decode a code back to its category.
    pub fn inverse_transform(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    /// Fitted vocabulary, in the order used to assign codes
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Column name this encoder belongs to
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Check invariants of a deserialized encoder.
    pub fn validate(&self) -> Result<()> {
        if self.classes.is_empty() {
            return Err(HydroError::ValidationFailed(format!(
                "{} encoder has an empty vocabulary",
                self.field
            )));
        }

        if let Some(pair) = self.classes.windows(2).find(|w| w[0] >= w[1]) {
            return Err(HydroError::ValidationFailed(format!(
                "{} encoder vocabulary is not strictly sorted near {:?}",
                self.field, pair[1]
            )));
        }

        Ok(())
    }
}
