use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Tolerance – when do two peaks count as the same feature?
// ---------------------------------------------------------------------------

/// Matching thresholds, passed explicitly into every comparison.
///
/// There is no process-wide default in play anywhere; callers either build
/// one or take [`Tolerance::default`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Maximum |Δposition| in cm⁻¹ for two same-kind peaks to pair up.
    pub position_delta: f64,
    /// Maximum |Δintensity| in normalized intensity units.
    pub intensity_delta: f64,
    /// Scores within this many points of 100 still count as an exact match.
    pub exact_match_epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            // Band positions reported by the extractor wobble by a few cm⁻¹
            // between scans of the same compound.
            position_delta: 10.0,
            intensity_delta: 0.05,
            exact_match_epsilon: 0.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ToleranceError {
    #[error("position_delta must be non-negative, got {0}")]
    NegativePositionDelta(f64),
    #[error("intensity_delta must be non-negative, got {0}")]
    NegativeIntensityDelta(f64),
    #[error("exact_match_epsilon must lie in [0, 100], got {0}")]
    EpsilonOutOfRange(f64),
}

impl Tolerance {
    /// Reject invalid configurations before any comparison runs.
    ///
    /// The negated comparisons also catch NaN fields.
    pub fn validate(&self) -> Result<(), ToleranceError> {
        if !(self.position_delta >= 0.0) {
            return Err(ToleranceError::NegativePositionDelta(self.position_delta));
        }
        if !(self.intensity_delta >= 0.0) {
            return Err(ToleranceError::NegativeIntensityDelta(self.intensity_delta));
        }
        if !(0.0..=100.0).contains(&self.exact_match_epsilon) {
            return Err(ToleranceError::EpsilonOutOfRange(self.exact_match_epsilon));
        }
        Ok(())
    }
}
