//! Window Statistics
//!
//! Consecutive differences treat the first value's difference as zero, so a
//! window of `n` samples always averages over `n` differences.

/// Arithmetic mean, 0 for an empty window
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean absolute consecutive difference
pub fn mean_abs_diff(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    total / values.len() as f64
}

/// Mean of the strictly positive consecutive differences, 0 if there are none
pub fn mean_positive_diff(values: &[f64]) -> f64 {
    let (sum, count) = values
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold((0.0, 0usize), |(sum, count), d| (sum + d, count + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Sample standard deviation (n - 1 denominator), 0 below two samples
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let m2: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (m2 / (values.len() - 1) as f64).sqrt()
}

/// Shannon entropy (nats) of a histogram over the window's own range.
///
/// Bins are equal width over `[min, max]`, the last bin closed on the right.
/// A constant window is binned over `[v - 0.5, v + 0.5]`. Empty bins are
/// dropped before taking logs.
pub fn shannon_entropy(values: &[f64], bins: usize) -> f64 {
    if values.is_empty() || bins == 0 {
        return 0.0;
    }

    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let mut counts = vec![0usize; bins];
    for &v in values {
        counts[histogram_bin(v, lo, hi, bins)] += 1;
    }

    let n = values.len() as f64;
    counts
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum()
}

/// Bin of `v` among `bins` equal-width bins over `[lo, hi]`.
///
/// The scaled index is checked against the explicit edges `lo + i * step`
/// (last edge exactly `hi`) and moved by one where rounding put a value
/// sitting on an edge in the wrong bin.
fn histogram_bin(v: f64, lo: f64, hi: f64, bins: usize) -> usize {
    let step = (hi - lo) / bins as f64;
    let edge = |i: usize| if i == bins { hi } else { i as f64 * step + lo };

    let mut idx = (((v - lo) * (bins as f64 / (hi - lo))) as usize).min(bins - 1);
    if idx > 0 && v < edge(idx) {
        idx -= 1;
    }
    if idx + 1 < bins && v >= edge(idx + 1) {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_computation() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 3.0).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_abs_diff_counts_leading_zero() {
        // diffs: 0, 2, 2, 4 over four samples
        assert!((mean_abs_diff(&[1.0, 3.0, 1.0, 5.0]) - 2.0).abs() < 1e-12);
        assert_eq!(mean_abs_diff(&[7.0]), 0.0);
        assert_eq!(mean_abs_diff(&[0.5; 10]), 0.0);
    }

    #[test]
    fn test_mean_positive_diff() {
        // positive diffs: 0.2, 0.3
        assert!((mean_positive_diff(&[0.1, 0.3, 0.0, 0.3]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_strictly_decreasing_has_no_panic() {
        assert_eq!(mean_positive_diff(&[1.0, 0.8, 0.5, 0.1]), 0.0);
        assert_eq!(mean_positive_diff(&[]), 0.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // sample std dev: sqrt(32 / 7)
        assert!((sample_std_dev(&values) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(sample_std_dev(&[3.0]), 0.0);
    }

    #[test]
    fn test_entropy_constant_signal() {
        let entropy = shannon_entropy(&[0.25; 40], 20);
        assert_eq!(entropy, 0.0);
    }

    #[test]
    fn test_entropy_uniform_bins() {
        // one sample per bin: ln(20)
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!((shannon_entropy(&values, 20) - (20.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_two_clusters() {
        let mut values = vec![-1.0; 10];
        values.extend(vec![1.0; 10]);
        assert!((shannon_entropy(&values, 20) - (2.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_entropy_values_on_bin_edges() {
        // quantised steering: several values land exactly on bin edges
        let values: Vec<f64> = [
            -446.0, -324.0, 36.0, -450.0, 342.0, -342.0, -414.0, -234.0, 50.0, -450.0, -230.0,
            -14.0, -90.0, -274.0, -252.0, -144.0,
        ]
        .iter()
        .map(|deg| deg / 450.0)
        .collect();
        assert!((shannon_entropy(&values, 20) - 2.133381930264545).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_bin_edges() {
        // edges over [0, 1] with 4 bins: 0, 0.25, 0.5, 0.75, 1
        assert_eq!(histogram_bin(0.0, 0.0, 1.0, 4), 0);
        assert_eq!(histogram_bin(0.25, 0.0, 1.0, 4), 1);
        assert_eq!(histogram_bin(0.7499, 0.0, 1.0, 4), 2);
        assert_eq!(histogram_bin(1.0, 0.0, 1.0, 4), 3);
    }

    proptest! {
        #[test]
        fn prop_entropy_finite_and_bounded(values in prop::collection::vec(-1.5f64..1.5, 1..200)) {
            let entropy = shannon_entropy(&values, 20);
            prop_assert!(entropy.is_finite());
            prop_assert!(entropy >= 0.0);
            prop_assert!(entropy <= (20.0f64).ln() + 1e-9);
        }

        #[test]
        fn prop_histogram_bin_in_range(values in prop::collection::vec(-450i32..=450, 2..60)) {
            let values: Vec<f64> = values.iter().map(|v| *v as f64 / 450.0).collect();
            let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assume!(lo < hi);
            for v in &values {
                prop_assert!(histogram_bin(*v, lo, hi, 20) < 20);
            }
        }
    }
}
