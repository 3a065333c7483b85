use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

use crate::data::model::{ComparisonResult, Spectrum};

// ---------------------------------------------------------------------------
// History schema
// ---------------------------------------------------------------------------

/// Column order of the history CSV. Fixed: downstream tooling reads it
/// positionally.
pub const HISTORY_HEADER: [&str; 10] = [
    "timestamp",
    "source_a",
    "source_b",
    "compound_a",
    "formula_a",
    "compound_b",
    "formula_b",
    "similarity_score",
    "matched_peaks",
    "is_exact_match",
];

/// Compound metadata for a source id, `"?"` when the extractor did not
/// commit to an identification.
fn compound_and_formula<'a>(spectra: &'a [Spectrum], source_id: &str) -> (&'a str, &'a str) {
    spectra
        .iter()
        .find(|sp| sp.source_id == source_id)
        .map(|sp| {
            (
                sp.compound_name.as_deref().unwrap_or("?"),
                sp.formula.as_deref().unwrap_or("?"),
            )
        })
        .unwrap_or(("?", "?"))
}

fn history_row(timestamp: &str, spectra: &[Spectrum], r: &ComparisonResult) -> [String; 10] {
    let (compound_a, formula_a) = compound_and_formula(spectra, &r.source_a);
    let (compound_b, formula_b) = compound_and_formula(spectra, &r.source_b);
    [
        timestamp.to_string(),
        r.source_a.clone(),
        r.source_b.clone(),
        compound_a.to_string(),
        formula_a.to_string(),
        compound_b.to_string(),
        formula_b.to_string(),
        format!("{:.2}", r.similarity_score),
        r.matched_peaks.to_string(),
        r.is_exact_match.to_string(),
    ]
}

fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// History file: append + tail
// ---------------------------------------------------------------------------

/// Append one batch to the history file, creating it (and its parent
/// directory) with a header row on first use.
pub fn append_history(
    path: &Path,
    spectra: &[Spectrum],
    results: &[ComparisonResult],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("creating history directory")?;
        }
    }

    let is_new = !path.exists();
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("opening history file")?;
    let mut writer = csv::Writer::from_writer(file);

    if is_new {
        writer
            .write_record(HISTORY_HEADER)
            .context("writing history header")?;
    }

    let timestamp = now_stamp();
    for r in results {
        writer
            .write_record(history_row(&timestamp, spectra, r))
            .context("writing history row")?;
    }
    writer.flush().context("flushing history file")?;
    Ok(())
}

/// The last `limit` data rows of the history file (header excluded),
/// oldest first. A missing file reads as empty history.
pub fn read_history_tail(path: &Path, limit: usize) -> Result<Vec<Vec<String>>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).context("opening history file")?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("reading history row")?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    let skip = rows.len().saturating_sub(limit);
    Ok(rows.split_off(skip))
}

// ---------------------------------------------------------------------------
// Full-batch serialization
// ---------------------------------------------------------------------------

/// Serialize one batch (header + rows) to any writer, same schema as the
/// history file.
pub fn write_results_csv<W: Write>(
    writer: W,
    spectra: &[Spectrum],
    results: &[ComparisonResult],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(HISTORY_HEADER)
        .context("writing CSV header")?;

    let timestamp = now_stamp();
    for r in results {
        csv_writer
            .write_record(history_row(&timestamp, spectra, r))
            .context("writing CSV row")?;
    }
    csv_writer.flush().context("flushing CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Peak, PeakKind};

    fn spectrum(id: &str, compound: Option<&str>, formula: Option<&str>) -> Spectrum {
        let mut sp = Spectrum::new(id, vec![Peak::new(1000.0, 0.5, PeakKind::Trough)]);
        sp.compound_name = compound.map(|s| s.to_string());
        sp.formula = formula.map(|s| s.to_string());
        sp
    }

    fn result(a: &str, b: &str, score: f64, matched: usize) -> ComparisonResult {
        ComparisonResult {
            source_a: a.to_string(),
            source_b: b.to_string(),
            similarity_score: score,
            matched_peaks: matched,
            is_exact_match: score >= 100.0,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("spectralens_export_{name}"));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn history_row_joins_metadata_with_question_mark_defaults() {
        let spectra = vec![
            spectrum("a.png", Some("Ethanol"), Some("C2H5OH")),
            spectrum("b.png", None, None),
        ];
        let row = history_row(
            "2026-08-06 12:00:00",
            &spectra,
            &result("a.png", "b.png", 66.666, 2),
        );
        assert_eq!(row[1], "a.png");
        assert_eq!(row[3], "Ethanol");
        assert_eq!(row[4], "C2H5OH");
        assert_eq!(row[5], "?");
        assert_eq!(row[7], "66.67");
        assert_eq!(row[8], "2");
        assert_eq!(row[9], "false");
    }

    #[test]
    fn append_writes_the_header_exactly_once() {
        let path = temp_path("header_once.csv");
        let spectra = vec![spectrum("a.png", None, None), spectrum("b.png", None, None)];
        let results = vec![result("a.png", "b.png", 100.0, 1)];

        append_history(&path, &spectra, &results).unwrap();
        append_history(&path, &spectra, &results).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let header_lines = text
            .lines()
            .filter(|l| l.starts_with("timestamp,"))
            .count();
        assert_eq!(header_lines, 1);
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn tail_returns_the_most_recent_rows_in_order() {
        let path = temp_path("tail.csv");
        let spectra = vec![spectrum("a.png", None, None), spectrum("b.png", None, None)];
        let results: Vec<ComparisonResult> = (0..5)
            .map(|i| result("a.png", "b.png", i as f64 * 10.0, i))
            .collect();
        append_history(&path, &spectra, &results).unwrap();

        let tail = read_history_tail(&path, 2).unwrap();
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0][8], "3");
        assert_eq!(tail[1][8], "4");
    }

    #[test]
    fn missing_history_reads_as_empty() {
        let tail = read_history_tail(Path::new("does_not_exist.csv"), 200).unwrap();
        assert!(tail.is_empty());
    }

    #[test]
    fn write_results_csv_emits_header_and_rows() {
        let spectra = vec![
            spectrum("a.png", Some("Acetone"), Some("C3H6O")),
            spectrum("b.png", Some("Acetone"), Some("C3H6O")),
        ];
        let results = vec![result("a.png", "b.png", 100.0, 1)];

        let mut buf = Vec::new();
        write_results_csv(&mut buf, &spectra, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HISTORY_HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains("Acetone"));
        assert!(row.ends_with("100.00,1,true"));
    }
}
