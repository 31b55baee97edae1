//! Parameter sweeps and the swept hyperparameter

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Slack applied to the inclusive upper bound of a float range.
const RANGE_EPSILON: f64 = 1e-9;

/// Which HDBSCAN hyperparameter a sweep varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOption {
    /// Neighbourhood size used for core distances
    #[default]
    MinSamples,
    /// Smallest group the algorithm will report as a cluster
    MinClusterSize,
}

impl SweepOption {
    /// Name used in configuration files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinSamples => "min_samples",
            Self::MinClusterSize => "min_cluster_size",
        }
    }
}

impl fmt::Display for SweepOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SweepOption {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min_samples" => Ok(Self::MinSamples),
            "min_cluster_size" => Ok(Self::MinClusterSize),
            other => Err(Error::UnsupportedOption(other.to_string())),
        }
    }
}

/// Ordered sequence of parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSweep {
    values: Vec<f64>,
}

impl ParameterSweep {
    /// Build a sweep from the `parameters.min` list.
    ///
    /// In range mode `min` must be `[start, stop, step]` and the sweep is
    /// `start, start + step, ...` up to and including `stop`. Otherwise the
    /// 1-3 values are used literally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] on a malformed list, a non-positive
    /// step, `stop < start`, or two values that truncate to the same integer
    /// (they would share a `min_<int>` result directory)
    pub fn from_spec(range: bool, min: &[f64]) -> Result<Self> {
        let sweep = Self::expand(range, min)?;
        sweep.check_distinct_parameters()?;
        Ok(sweep)
    }

    fn expand(range: bool, min: &[f64]) -> Result<Self> {
        if min.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "parameter values must be finite, got {min:?}"
            )));
        }
        if !range {
            if min.is_empty() || min.len() > 3 {
                return Err(Error::InvalidConfig(format!(
                    "expected 1 to 3 parameter values, got {}",
                    min.len()
                )));
            }
            return Ok(Self {
                values: min.to_vec(),
            });
        }

        let [start, stop, step] = min else {
            return Err(Error::InvalidConfig(format!(
                "range mode expects [start, stop, step], got {} values",
                min.len()
            )));
        };
        let (start, stop, step) = (*start, *stop, *step);
        if step <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "range step must be positive, got {step}"
            )));
        }
        if stop < start {
            return Err(Error::InvalidConfig(format!(
                "range stop {stop} is below start {start}"
            )));
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let values = {
            let steps = ((stop - start) / step + RANGE_EPSILON).floor() as usize;
            (0..=steps).map(|i| start + i as f64 * step).collect()
        };
        Ok(Self { values })
    }

    fn check_distinct_parameters(&self) -> Result<()> {
        let values = &self.values;
        let mut seen = HashSet::with_capacity(values.len());
        for &value in values {
            // Bit pattern of the truncated value; all values are finite here
            if !seen.insert(value.trunc().to_bits()) {
                return Err(Error::InvalidConfig(format!(
                    "parameter value {value} truncates onto an earlier value in {values:?}"
                )));
            }
        }
        Ok(())
    }

    /// Swept values in order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values in the sweep.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the sweep is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parameter value as passed to the clustering library (truncated).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for values below 1
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn integer_parameter(value: f64) -> Result<usize> {
    if !value.is_finite() || value < 1.0 {
        return Err(Error::InvalidInput(format!(
            "parameter value must be at least 1, got {value}"
        )));
    }
    Ok(value.trunc() as usize)
}
