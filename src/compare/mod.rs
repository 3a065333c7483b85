/// Spectral comparator: greedy peak matching and Dice-style scoring.
///
/// ```text
///   Spectrum A ─┐
///               ├─► match_peaks ─► matched count ─► similarity score 0–100
///   Spectrum B ─┘       │
///                  Tolerance
/// ```
///
/// `compare` is a pure function of its inputs: no shared state, no
/// side effects, safe on any number of worker threads (see [`crate::batch`]).
pub mod matching;
pub mod tolerance;

use thiserror::Error;

use crate::data::model::{ComparisonResult, Spectrum};

pub use tolerance::{Tolerance, ToleranceError};

#[derive(Debug, Error)]
pub enum CompareError {
    /// Overlap against zero peaks is undefined; batch callers degrade this
    /// to a zero-score result instead of failing the whole run.
    #[error("spectrum '{source_id}' has no peaks")]
    EmptySpectrum { source_id: String },
    #[error(transparent)]
    InvalidTolerance(#[from] ToleranceError),
}

/// Compare two spectra under the given tolerance.
///
/// The score is symmetric bit-for-bit under operand swap, and peak order in
/// the inputs is irrelevant: the matcher sorts internal copies and never
/// mutates caller data.
pub fn compare(
    a: &Spectrum,
    b: &Spectrum,
    tolerance: &Tolerance,
) -> Result<ComparisonResult, CompareError> {
    tolerance.validate()?;
    for sp in [a, b] {
        if sp.is_empty() {
            return Err(CompareError::EmptySpectrum {
                source_id: sp.source_id.clone(),
            });
        }
    }
    Ok(score_pair(a, b, tolerance))
}

/// Score a pair already known to be non-empty, under a validated tolerance.
pub(crate) fn score_pair(a: &Spectrum, b: &Spectrum, tolerance: &Tolerance) -> ComparisonResult {
    let matched = matching::match_peaks(&a.peaks, &b.peaks, tolerance);
    let total = a.len() + b.len();
    let similarity_score = (100.0 * (2 * matched) as f64 / total as f64).clamp(0.0, 100.0);

    ComparisonResult {
        source_a: a.source_id.clone(),
        source_b: b.source_id.clone(),
        similarity_score,
        matched_peaks: matched,
        is_exact_match: similarity_score >= 100.0 - tolerance.exact_match_epsilon,
    }
}
