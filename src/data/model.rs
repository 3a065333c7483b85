use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PeakKind – crest or trough
// ---------------------------------------------------------------------------

/// Direction of a spectral feature: a local maximum (`Crest`) or a local
/// minimum (`Trough`) of intensity vs. wavenumber. In transmittance-mode IR
/// spectra the chemically meaningful absorption bands are troughs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakKind {
    Crest,
    Trough,
}

impl fmt::Display for PeakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakKind::Crest => write!(f, "crest"),
            PeakKind::Trough => write!(f, "trough"),
        }
    }
}

// ---------------------------------------------------------------------------
// Peak – a single spectral feature
// ---------------------------------------------------------------------------

/// One extracted spectral feature. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Wavenumber in cm⁻¹ (mid-IR spectra span roughly 400–4000).
    pub position: f64,
    /// Normalized intensity in [0, 1].
    pub intensity: f64,
    pub kind: PeakKind,
}

impl Peak {
    pub fn new(position: f64, intensity: f64, kind: PeakKind) -> Self {
        Peak {
            position,
            intensity,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – an ordered peak set plus upload metadata
// ---------------------------------------------------------------------------

/// The peak set extracted from one uploaded spectrum image.
///
/// Peaks are kept sorted by ascending position; [`Spectrum::new`] restores
/// the order no matter how the extractor returned them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// Identifies the originating upload (its file name).
    pub source_id: String,
    /// Compound identified by the extractor, when it committed to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compound_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// Extractor's identification confidence, kept as free text
    /// ("High" / "Medium" / "Low").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    pub peaks: Vec<Peak>,
}

impl Spectrum {
    /// Build a spectrum, sorting the peaks by ascending position.
    pub fn new(source_id: impl Into<String>, mut peaks: Vec<Peak>) -> Self {
        peaks.sort_by(|a, b| a.position.total_cmp(&b.position));
        Spectrum {
            source_id: source_id.into(),
            compound_name: None,
            formula: None,
            confidence: None,
            peaks,
        }
    }

    /// Number of peaks.
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    /// Whether the spectrum has no peaks at all.
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ComparisonResult – the outcome of one pairwise comparison
// ---------------------------------------------------------------------------

/// Similarity of one spectrum pair. Immutable; consumed by export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub source_a: String,
    pub source_b: String,
    /// Dice-style overlap score in [0, 100].
    pub similarity_score: f64,
    /// Peak pairs accepted by the matcher.
    pub matched_peaks: usize,
    /// True when every peak in both spectra found a partner
    /// (score within epsilon of 100).
    pub is_exact_match: bool,
}

impl ComparisonResult {
    /// Zero-score result for pairs where no overlap is possible
    /// (one or both spectra carry no peaks).
    pub fn no_overlap(source_a: impl Into<String>, source_b: impl Into<String>) -> Self {
        ComparisonResult {
            source_a: source_a.into(),
            source_b: source_b.into(),
            similarity_score: 0.0,
            matched_peaks: 0,
            is_exact_match: false,
        }
    }
}
