use std::cmp::Ordering;

use super::tolerance::Tolerance;
use crate::data::model::Peak;

// ---------------------------------------------------------------------------
// Greedy one-to-one peak matching
// ---------------------------------------------------------------------------

/// An admissible pairing between one peak of each spectrum.
///
/// `key` orders candidates for greedy acceptance: ascending position
/// distance first, then a tie-break built from min/max of the two peaks'
/// coordinates. Every component is invariant under swapping the operand
/// spectra, so the match count is too.
struct Candidate {
    key: [f64; 5],
    left: usize,
    right: usize,
}

/// Count the one-to-one peak matches between two peak lists.
///
/// A pair is admissible when both peaks share a kind, their positions differ
/// by at most `position_delta`, and their intensities by at most
/// `intensity_delta`. Admissible pairs are accepted closest-first, each peak
/// used at most once.
///
/// Tightening `position_delta` can only shrink the result: it removes a
/// suffix of the distance-sorted candidate list, and whether a candidate is
/// accepted depends only on the candidates before it.
pub fn match_peaks(a: &[Peak], b: &[Peak], tolerance: &Tolerance) -> usize {
    // Work on sorted copies; callers keep their own ordering.
    let mut left = a.to_vec();
    let mut right = b.to_vec();
    left.sort_by(|x, y| x.position.total_cmp(&y.position));
    right.sort_by(|x, y| x.position.total_cmp(&y.position));

    let mut candidates = collect_candidates(&left, &right, tolerance);
    candidates.sort_by(|x, y| compare_keys(&x.key, &y.key));

    let mut used_left = vec![false; left.len()];
    let mut used_right = vec![false; right.len()];
    let mut matched = 0;
    for c in &candidates {
        if used_left[c.left] || used_right[c.right] {
            continue;
        }
        used_left[c.left] = true;
        used_right[c.right] = true;
        matched += 1;
    }
    matched
}

/// All pairs within both deltas. `right` is position-sorted, so each left
/// peak only scans the window `[position - Δ, position + Δ]`.
fn collect_candidates(left: &[Peak], right: &[Peak], tolerance: &Tolerance) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (i, pa) in left.iter().enumerate() {
        let window_start = right
            .partition_point(|p| p.position < pa.position - tolerance.position_delta);

        for (j, pb) in right.iter().enumerate().skip(window_start) {
            if pb.position > pa.position + tolerance.position_delta {
                break;
            }
            if pb.kind != pa.kind {
                continue;
            }
            if (pa.intensity - pb.intensity).abs() > tolerance.intensity_delta {
                continue;
            }
            out.push(Candidate {
                key: [
                    (pa.position - pb.position).abs(),
                    pa.position.min(pb.position),
                    pa.position.max(pb.position),
                    pa.intensity.min(pb.intensity),
                    pa.intensity.max(pb.intensity),
                ],
                left: i,
                right: j,
            });
        }
    }
    out
}

fn compare_keys(x: &[f64; 5], y: &[f64; 5]) -> Ordering {
    x.iter()
        .zip(y)
        .map(|(a, b)| a.total_cmp(b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::PeakKind;

    fn trough(position: f64, intensity: f64) -> Peak {
        Peak::new(position, intensity, PeakKind::Trough)
    }

    fn tol(position_delta: f64, intensity_delta: f64) -> Tolerance {
        Tolerance {
            position_delta,
            intensity_delta,
            exact_match_epsilon: 0.0,
        }
    }

    #[test]
    fn matches_within_both_deltas() {
        let a = [trough(1000.0, 0.80)];
        let b = [trough(1001.0, 0.81)];
        assert_eq!(match_peaks(&a, &b, &tol(5.0, 0.05)), 1);
    }

    #[test]
    fn position_gate_excludes_distant_peaks() {
        let a = [trough(1000.0, 0.80)];
        let b = [trough(1010.0, 0.80)];
        assert_eq!(match_peaks(&a, &b, &tol(5.0, 0.05)), 0);
    }

    #[test]
    fn intensity_gate_excludes_mismatched_depths() {
        let a = [trough(1000.0, 0.10)];
        let b = [trough(1000.0, 0.90)];
        assert_eq!(match_peaks(&a, &b, &tol(5.0, 0.05)), 0);
    }

    #[test]
    fn kinds_never_cross_match() {
        let a = [Peak::new(1000.0, 0.5, PeakKind::Crest)];
        let b = [Peak::new(1000.0, 0.5, PeakKind::Trough)];
        assert_eq!(match_peaks(&a, &b, &tol(5.0, 1.0)), 0);
    }

    #[test]
    fn closest_peak_wins_and_none_is_reused() {
        // The lone left peak sits between two right peaks; only the closer
        // one (1002) may pair with it, and only once.
        let a = [trough(1000.0, 0.5)];
        let b = [trough(1002.0, 0.5), trough(996.0, 0.5)];
        assert_eq!(match_peaks(&a, &b, &tol(6.0, 0.1)), 1);

        // Two left peaks competing for one right peak: one match, not two.
        let a = [trough(999.0, 0.5), trough(1001.0, 0.5)];
        let b = [trough(1000.0, 0.5)];
        assert_eq!(match_peaks(&a, &b, &tol(6.0, 0.1)), 1);
    }

    #[test]
    fn greedy_prefers_globally_closest_pairs() {
        // left 1000 is 2 away from right 1002, left 1005 is 3 away from it.
        // Closest-first pairs (1000,1002) and leaves 1005 to (1005,1009).
        let a = [trough(1000.0, 0.5), trough(1005.0, 0.5)];
        let b = [trough(1002.0, 0.5), trough(1009.0, 0.5)];
        assert_eq!(match_peaks(&a, &b, &tol(5.0, 0.1)), 2);
    }

    #[test]
    fn input_order_does_not_matter() {
        let shuffled = [trough(2900.0, 0.5), trough(1000.0, 0.3), trough(1700.0, 0.7)];
        let sorted = [trough(1000.0, 0.3), trough(1700.0, 0.7), trough(2900.0, 0.5)];
        let other = [trough(1001.0, 0.3), trough(1702.0, 0.7), trough(2898.0, 0.5)];
        let t = tol(5.0, 0.05);
        assert_eq!(match_peaks(&shuffled, &other, &t), match_peaks(&sorted, &other, &t));
    }

    #[test]
    fn tightening_position_delta_never_gains_matches() {
        let a = [trough(1000.0, 0.5), trough(1010.0, 0.5), trough(1030.0, 0.5)];
        let b = [trough(1003.0, 0.5), trough(1014.0, 0.5), trough(1041.0, 0.5)];

        let mut last = usize::MAX;
        for delta in [20.0, 11.0, 4.0, 3.0, 1.0, 0.0] {
            let m = match_peaks(&a, &b, &tol(delta, 0.1));
            assert!(m <= last, "delta {delta} gained matches: {m} > {last}");
            last = m;
        }
    }
}
