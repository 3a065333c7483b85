use serde::Deserialize;
use thiserror::Error;

use super::model::{Peak, PeakKind, Spectrum};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure while turning an uploaded image into a peak set.
///
/// Extraction depends on an external network service; errors are surfaced
/// per item and never retried here. One bad upload must not take down the
/// comparisons among the remaining spectra (see [`crate::batch`]).
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("malformed extractor response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("extractor found no peaks in '{source_id}'")]
    NoPeaks { source_id: String },
    #[error("extraction service failure: {0}")]
    Service(String),
    #[error("reading image: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// FeatureExtractor – the consumed boundary
// ---------------------------------------------------------------------------

/// Turns raw image bytes into a [`Spectrum`].
///
/// Implemented by the caller on top of whatever vision service it talks to;
/// this crate only owns the response-parsing half of the boundary
/// ([`parse_response`]).
pub trait FeatureExtractor {
    fn extract(&self, source_id: &str, image: &[u8]) -> Result<Spectrum, ExtractionError>;
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Wire shape of one identified spectrum in the vision model's reply.
///
/// ```json
/// {
///   "compound_name": "Ethanol",
///   "chemical_formula": "C2H5OH",
///   "identification_confidence": "High",
///   "major_peaks": [
///     {"wavenumber": 3408, "transmittance": 5, "kind": "trough"}
///   ]
/// }
/// ```
#[derive(Debug, Deserialize)]
struct ResponseSpectrum {
    compound_name: Option<String>,
    chemical_formula: Option<String>,
    identification_confidence: Option<String>,
    #[serde(default)]
    major_peaks: Vec<ResponsePeak>,
}

#[derive(Debug, Deserialize)]
struct ResponsePeak {
    wavenumber: f64,
    /// Percent transmittance, 0–100 on the wire.
    transmittance: f64,
    /// Absent in most replies; IR absorption bands are troughs.
    kind: Option<PeakKind>,
}

/// Parse one extractor reply into a [`Spectrum`].
///
/// Vision models frequently wrap their JSON in markdown code fences;
/// those are stripped before parsing. Transmittance is normalized from
/// percent to [0, 1], and peaks come out sorted by position.
pub fn parse_response(source_id: &str, body: &str) -> Result<Spectrum, ExtractionError> {
    let raw: ResponseSpectrum = serde_json::from_str(strip_code_fences(body))?;

    if raw.major_peaks.is_empty() {
        return Err(ExtractionError::NoPeaks {
            source_id: source_id.to_string(),
        });
    }

    let peaks = raw
        .major_peaks
        .iter()
        .map(|p| Peak {
            position: p.wavenumber,
            intensity: (p.transmittance / 100.0).clamp(0.0, 1.0),
            kind: p.kind.unwrap_or(PeakKind::Trough),
        })
        .collect();

    let mut spectrum = Spectrum::new(source_id, peaks);
    spectrum.compound_name = raw.compound_name;
    spectrum.formula = raw.chemical_formula;
    spectrum.confidence = raw.identification_confidence;
    Ok(spectrum)
}

/// Strip a leading/trailing markdown fence (```json ... ```) if present.
fn strip_code_fences(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline.
    let inner = match inner.find('\n') {
        Some(nl) => &inner[nl + 1..],
        None => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
