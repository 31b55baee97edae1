//! Column normalization
//!
//! Reference: <https://en.wikipedia.org/wiki/Normalization_(statistics)>

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Dataset;
use crate::stats::{mean, min_max, sample_std};
use crate::{Error, Result};

/// Normalization method applied before clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormMethod {
    /// Subtract the column mean and divide by the sample standard deviation.
    /// Applies to every column of the table.
    StandardScore,
    /// Min-max rescale to `[0, 1]`. Applies only to the selected columns.
    FeatureScale,
}

impl NormMethod {
    /// Name used in configuration files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StandardScore => "standard_score",
            Self::FeatureScale => "feature_scale",
        }
    }
}

impl fmt::Display for NormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standard_score" => Ok(Self::StandardScore),
            "feature_scale" => Ok(Self::FeatureScale),
            other => Err(Error::UnsupportedNormalization(other.to_string())),
        }
    }
}

/// Normalize a dataset.
///
/// `columns` are positions in `dataset` and are only consulted by
/// [`NormMethod::FeatureScale`]. Zero-variance columns map to all zeros under
/// either method.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a selected column is out of range
pub fn normalize(dataset: &Dataset, method: NormMethod, columns: &[usize]) -> Result<Dataset> {
    let scaled = match method {
        NormMethod::StandardScore => (0..dataset.num_columns())
            .map(|i| standard_score(dataset.column(i)))
            .collect(),
        NormMethod::FeatureScale => {
            if let Some(&bad) = columns.iter().find(|&&c| c >= dataset.num_columns()) {
                return Err(Error::InvalidInput(format!(
                    "feature_scale column {bad} out of range for {} columns",
                    dataset.num_columns()
                )));
            }
            (0..dataset.num_columns())
                .map(|i| {
                    let values = dataset.column(i);
                    if columns.contains(&i) {
                        feature_scale(values)
                    } else {
                        values.to_vec()
                    }
                })
                .collect()
        }
    };
    dataset.with_columns(scaled)
}

fn standard_score(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let sd = sample_std(values);
    if sd == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - m) / sd).collect()
}

fn feature_scale(values: &[f64]) -> Vec<f64> {
    let Some((lo, hi)) = min_max(values) else {
        return Vec::new();
    };
    let span = hi - lo;
    if span == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - lo) / span).collect()
}
