use std::path::Path;

use anyhow::{bail, Context, Result};

use super::model::{Peak, PeakKind, Spectrum};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load previously extracted peak sets from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.json` – array of spectrum records, the shape [`Spectrum`] serializes to
/// * `.csv`  – one spectrum per row, peaks packed into semicolon-separated
///   `positions` / `intensities` / `kinds` columns
pub fn load_file(path: &Path) -> Result<Vec<Spectrum>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema:
///
/// ```json
/// [
///   {
///     "source_id": "ethanol.png",
///     "compound_name": "Ethanol",
///     "formula": "C2H5OH",
///     "peaks": [
///       { "position": 3400.0, "intensity": 0.12, "kind": "trough" }
///     ]
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<Spectrum>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let mut spectra: Vec<Spectrum> = serde_json::from_str(&text).context("parsing JSON")?;

    // Files written by hand may list peaks in any order.
    for sp in &mut spectra {
        sp.peaks
            .sort_by(|a, b| a.position.total_cmp(&b.position));
    }
    Ok(spectra)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names. `positions` and `intensities`
/// contain semicolon-separated floats, `kinds` semicolon-separated
/// `crest`/`trough` labels (the whole column may be omitted, defaulting every
/// peak to a trough). `compound_name` and `formula` columns are optional.
fn load_csv(path: &Path) -> Result<Vec<Spectrum>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = |name: &str| headers.iter().position(|h| h == name);
    let source_idx = col("source_id").context("CSV missing 'source_id' column")?;
    let pos_idx = col("positions").context("CSV missing 'positions' column")?;
    let int_idx = col("intensities").context("CSV missing 'intensities' column")?;
    let kinds_idx = col("kinds");
    let compound_idx = col("compound_name");
    let formula_idx = col("formula");

    let mut spectra = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let positions =
            parse_semicolon_floats(record.get(pos_idx).unwrap_or(""), row_no, "positions")?;
        let intensities =
            parse_semicolon_floats(record.get(int_idx).unwrap_or(""), row_no, "intensities")?;

        if positions.len() != intensities.len() {
            bail!(
                "CSV row {row_no}: {} positions but {} intensities",
                positions.len(),
                intensities.len()
            );
        }

        let kinds = match kinds_idx.and_then(|i| record.get(i)) {
            Some(cell) if !cell.is_empty() => parse_kinds(cell, row_no, positions.len())?,
            _ => vec![PeakKind::Trough; positions.len()],
        };

        let peaks = positions
            .iter()
            .zip(&intensities)
            .zip(&kinds)
            .map(|((&position, &intensity), &kind)| Peak::new(position, intensity, kind))
            .collect();

        let source_id = record.get(source_idx).unwrap_or("").to_string();
        if source_id.is_empty() {
            bail!("CSV row {row_no}: empty 'source_id'");
        }

        let mut sp = Spectrum::new(source_id, peaks);
        sp.compound_name = nonempty(compound_idx.and_then(|i| record.get(i)));
        sp.formula = nonempty(formula_idx.and_then(|i| record.get(i)));
        spectra.push(sp);
    }

    Ok(spectra)
}

fn parse_semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

fn parse_kinds(s: &str, row: usize, expected: usize) -> Result<Vec<PeakKind>> {
    let kinds: Vec<PeakKind> = s
        .split(';')
        .enumerate()
        .map(|(j, tok)| match tok.trim() {
            "crest" => Ok(PeakKind::Crest),
            "trough" => Ok(PeakKind::Trough),
            other => bail!("Row {row}, kinds[{j}]: '{other}' is neither crest nor trough"),
        })
        .collect::<Result<_>>()?;

    if kinds.len() != expected {
        bail!(
            "Row {row}: {} kinds for {} positions",
            kinds.len(),
            expected
        );
    }
    Ok(kinds)
}

fn nonempty(cell: Option<&str>) -> Option<String> {
    cell.filter(|s| !s.is_empty()).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("spectralens_loader_{name}"));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_json_and_restores_peak_order() {
        let path = write_temp(
            "ok.json",
            r#"[
              {
                "source_id": "b.png",
                "compound_name": "Acetone",
                "peaks": [
                  {"position": 1715.0, "intensity": 0.1, "kind": "trough"},
                  {"position": 1220.0, "intensity": 0.4, "kind": "trough"}
                ]
              }
            ]"#,
        );
        let spectra = load_file(&path).unwrap();
        assert_eq!(spectra.len(), 1);
        assert_eq!(spectra[0].compound_name.as_deref(), Some("Acetone"));
        assert_eq!(spectra[0].peaks[0].position, 1220.0);
    }

    #[test]
    fn loads_csv_with_and_without_kinds() {
        let path = write_temp(
            "ok.csv",
            "source_id,compound_name,formula,positions,intensities,kinds\n\
             a.png,Ethanol,C2H5OH,3400.0;1050.0,0.12;0.30,trough;trough\n\
             b.png,,,2950.0,0.55,\n",
        );
        let spectra = load_file(&path).unwrap();
        assert_eq!(spectra.len(), 2);
        assert_eq!(spectra[0].peaks.len(), 2);
        assert_eq!(spectra[1].compound_name, None);
        assert_eq!(spectra[1].peaks[0].kind, PeakKind::Trough);
    }

    #[test]
    fn csv_length_mismatch_is_rejected() {
        let path = write_temp(
            "bad.csv",
            "source_id,positions,intensities\na.png,3400.0;1050.0,0.12\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("positions"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("spectra.parquet")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
