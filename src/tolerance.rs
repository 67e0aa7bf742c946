//! The threshold below which two solved values are considered equal.
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// The tolerance used if none is configured.
///
/// Absolute units: MW, MWh or currency depending on the quantity compared.
pub const DEFAULT_TOLERANCE: f64 = 0.01;

/// An absolute, non-negative numeric tolerance
#[derive(PartialEq, PartialOrd, Clone, Copy, Debug, Serialize, derive_more::Display)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Create a new [`Tolerance`], checking that the value is finite and non-negative
    pub fn new(value: f64) -> Result<Self> {
        ensure!(
            value.is_finite() && value >= 0.0,
            "Tolerance must be a finite, non-negative number (got {value})"
        );
        Ok(Self(value))
    }

    /// The tolerance as a plain number
    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether a signed difference is large enough to count as a discrepancy.
    ///
    /// A difference whose magnitude equals the tolerance counts as a discrepancy. Identical values
    /// never do, even with a zero tolerance.
    pub fn is_violated_by(self, difference: f64) -> bool {
        difference != 0.0 && difference.abs() >= self.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self(DEFAULT_TOLERANCE)
    }
}

impl<'de> Deserialize<'de> for Tolerance {
    fn deserialize<D>(deserialiser: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f64::deserialize(deserialiser)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

/// How the objective values of the two models are compared
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectivePolicy {
    /// Any difference at all is reported
    #[default]
    Exact,
    /// Differences are gated by the same tolerance as every other quantity
    Tolerance,
}
