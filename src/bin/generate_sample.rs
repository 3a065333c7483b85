use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use spectralens::batch::{compare_batch, PairMode};
use spectralens::compare::Tolerance;
use spectralens::data::loader;
use spectralens::data::model::{Peak, PeakKind, Spectrum};
use spectralens::export;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Absorption bands per compound: (position cm⁻¹, normalized transmittance).
fn compound_bands() -> Vec<(&'static str, &'static str, Vec<(f64, f64)>)> {
    vec![
        (
            "Ethanol",
            "C2H5OH",
            vec![(3400.0, 0.15), (2950.0, 0.35), (1050.0, 0.20), (880.0, 0.55)],
        ),
        (
            "Acetone",
            "C3H6O",
            vec![(2970.0, 0.45), (1715.0, 0.08), (1360.0, 0.40), (1220.0, 0.30)],
        ),
        (
            "Benzaldehyde",
            "C7H6O",
            vec![
                (3060.0, 0.50),
                (2820.0, 0.45),
                (1700.0, 0.10),
                (1600.0, 0.35),
                (745.0, 0.25),
            ],
        ),
    ]
}

/// One jittered scan of a compound, the way repeat measurements of the same
/// sample wobble between uploads.
fn jittered_scan(
    rng: &mut SimpleRng,
    source_id: String,
    compound: &str,
    formula: &str,
    bands: &[(f64, f64)],
) -> Spectrum {
    let peaks = bands
        .iter()
        .map(|&(position, intensity)| {
            Peak::new(
                position + rng.gauss(0.0, 2.0),
                (intensity + rng.gauss(0.0, 0.01)).clamp(0.0, 1.0),
                PeakKind::Trough,
            )
        })
        .collect();

    let mut sp = Spectrum::new(source_id, peaks);
    sp.compound_name = Some(compound.to_string());
    sp.formula = Some(formula.to_string());
    sp.confidence = Some("High".to_string());
    sp
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // Two scans per compound
    let mut spectra = Vec::new();
    for (compound, formula, bands) in compound_bands() {
        for scan in 1..=2 {
            let source_id = format!("{}_{scan}.png", compound.to_lowercase());
            spectra.push(jittered_scan(&mut rng, source_id, compound, formula, &bands));
        }
    }

    let dataset_path = Path::new("sample_extractions.json");
    let json = serde_json::to_string_pretty(&spectra).context("serializing sample dataset")?;
    fs::write(dataset_path, json).context("writing sample dataset")?;

    // Round-trip through the loader, then compare everything pairwise.
    let loaded = loader::load_file(dataset_path)?;
    let results = compare_batch(&loaded, &Tolerance::default(), PairMode::AllPairs)?;

    let results_path = Path::new("sample_results.csv");
    let file = fs::File::create(results_path).context("creating results CSV")?;
    export::write_results_csv(file, &loaded, &results)?;

    let exact = results.iter().filter(|r| r.is_exact_match).count();
    println!(
        "Wrote {} spectra to {} and {} comparisons ({exact} exact matches) to {}",
        loaded.len(),
        dataset_path.display(),
        results.len(),
        results_path.display()
    );
    Ok(())
}
