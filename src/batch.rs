use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compare::{self, Tolerance, ToleranceError};
use crate::data::extractor::ExtractionError;
use crate::data::model::{ComparisonResult, Spectrum};

// ---------------------------------------------------------------------------
// Batch limits and pair planning
// ---------------------------------------------------------------------------

/// A comparison needs at least two spectra.
pub const MIN_SPECTRA: usize = 2;
/// Upload cap per batch; all-pairs over 400 spectra is ~80k comparisons.
pub const MAX_SPECTRA: usize = 400;

/// Which pairs of a batch get compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairMode {
    /// Every unordered pair, C(N,2) of them.
    AllPairs,
    /// Consecutive uploads only: (0,1), (1,2), ...
    Sequential,
    /// Everything against the first upload.
    VsFirst,
}

/// Index pairs to compare, in deterministic plan order. Always `i < j`.
pub fn plan_pairs(n: usize, mode: PairMode) -> Vec<(usize, usize)> {
    match mode {
        PairMode::AllPairs => (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect(),
        PairMode::Sequential => (1..n).map(|j| (j - 1, j)).collect(),
        PairMode::VsFirst => (1..n).map(|j| (0, j)).collect(),
    }
}

// ---------------------------------------------------------------------------
// Batch execution
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("need at least {MIN_SPECTRA} spectra, got {0}")]
    TooFew(usize),
    #[error("at most {MAX_SPECTRA} spectra per batch, got {0}")]
    TooMany(usize),
    #[error(transparent)]
    InvalidTolerance(#[from] ToleranceError),
}

/// Compare the planned pairs of a batch on the rayon worker pool.
///
/// Pairwise comparisons share no mutable state, so they fan out freely;
/// results come back in plan order regardless of completion order, each
/// attributable by its (source_a, source_b) ids. Spectra without peaks
/// degrade to zero-score results rather than aborting the batch.
pub fn compare_batch(
    spectra: &[Spectrum],
    tolerance: &Tolerance,
    mode: PairMode,
) -> Result<Vec<ComparisonResult>, BatchError> {
    tolerance.validate()?;
    check_bounds(spectra.len())?;

    let pairs = plan_pairs(spectra.len(), mode);
    let results: Vec<ComparisonResult> = pairs
        .par_iter()
        .map(|&(i, j)| score_or_zero(&spectra[i], &spectra[j], tolerance))
        .collect();

    log::info!(
        "compared {} pairs across {} spectra ({mode:?})",
        results.len(),
        spectra.len()
    );
    Ok(results)
}

fn check_bounds(n: usize) -> Result<(), BatchError> {
    if n < MIN_SPECTRA {
        return Err(BatchError::TooFew(n));
    }
    if n > MAX_SPECTRA {
        return Err(BatchError::TooMany(n));
    }
    Ok(())
}

/// Empty spectra have no defined overlap; inside a batch that becomes a
/// zero-score row instead of an error.
fn score_or_zero(a: &Spectrum, b: &Spectrum, tolerance: &Tolerance) -> ComparisonResult {
    if a.is_empty() || b.is_empty() {
        log::warn!(
            "pair ({}, {}) has a peak-less spectrum, scoring 0",
            a.source_id,
            b.source_id
        );
        return ComparisonResult::no_overlap(&a.source_id, &b.source_id);
    }
    compare::score_pair(a, b, tolerance)
}

// ---------------------------------------------------------------------------
// Partial-failure isolation over extractor outcomes
// ---------------------------------------------------------------------------

/// One upload the extractor could not handle.
#[derive(Debug)]
pub struct SourceFailure {
    pub source_id: String,
    pub error: ExtractionError,
}

/// Outcome of a batch over per-upload extraction results.
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<ComparisonResult>,
    pub failures: Vec<SourceFailure>,
}

/// Compare whatever the extractor managed to extract.
///
/// Failed uploads are reported alongside the results; they never abort the
/// comparisons among the spectra that did extract. Bounds apply to the
/// upload count, not the success count; a batch left with fewer than two
/// usable spectra simply yields no comparison rows.
pub fn compare_extracted(
    outcomes: Vec<(String, Result<Spectrum, ExtractionError>)>,
    tolerance: &Tolerance,
    mode: PairMode,
) -> Result<BatchReport, BatchError> {
    tolerance.validate()?;
    check_bounds(outcomes.len())?;

    let mut spectra = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (source_id, outcome) in outcomes {
        match outcome {
            Ok(sp) => spectra.push(sp),
            Err(error) => {
                log::warn!("extraction failed for '{source_id}': {error}");
                failures.push(SourceFailure { source_id, error });
            }
        }
    }

    let results = if spectra.len() < MIN_SPECTRA {
        log::warn!(
            "only {} of the uploads extracted, nothing to compare",
            spectra.len()
        );
        Vec::new()
    } else {
        let pairs = plan_pairs(spectra.len(), mode);
        pairs
            .par_iter()
            .map(|&(i, j)| score_or_zero(&spectra[i], &spectra[j], tolerance))
            .collect()
    };

    Ok(BatchReport { results, failures })
}
