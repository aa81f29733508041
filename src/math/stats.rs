//! NaN-aware summary statistics.
//!
//! Every helper ignores non-finite inputs and returns `NaN` when nothing
//! finite remains, so undefined model estimates drop out of aggregates
//! instead of poisoning them.

/// Median of the finite values.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return f64::NAN;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

/// Mean of the finite values.
pub fn mean(values: &[f64]) -> f64 {
    let (sum, n) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

/// `max - min` of the finite values.
pub fn spread(values: &[f64]) -> f64 {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &x in values.iter().filter(|x| x.is_finite()) {
        lo = lo.min(x);
        hi = hi.max(x);
    }
    if lo.is_finite() { hi - lo } else { f64::NAN }
}

/// Weighted mean and (population) standard deviation.
///
/// Pairs with a non-finite value or a non-positive weight are skipped.
pub fn weighted_mean_std(values: &[f64], weights: &[f64]) -> (f64, f64) {
    let pairs: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .filter(|(x, w)| x.is_finite() && w.is_finite() && **w > 0.0)
        .map(|(&x, &w)| (x, w))
        .collect();

    let total: f64 = pairs.iter().map(|(_, w)| w).sum();
    if pairs.is_empty() || total <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let mean = pairs.iter().map(|(x, w)| x * w).sum::<f64>() / total;
    let var = pairs.iter().map(|(x, w)| w * (x - mean).powi(2)).sum::<f64>() / total;
    (mean, var.max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_skips_nan() {
        assert_eq!(median(&[3.0, f64::NAN, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[f64::NAN]).is_nan());
    }

    #[test]
    fn mean_and_spread() {
        assert_eq!(mean(&[1.0, 3.0, f64::INFINITY]), 2.0);
        assert_eq!(spread(&[5.0, 1.0, f64::NAN, 3.0]), 4.0);
        assert!(spread(&[]).is_nan());
    }

    #[test]
    fn weighted_std_matches_hand_computation() {
        // 1 h at 2 °C, 3 h at 6 °C -> mean 5, var = (1*9 + 3*1)/4 = 3.
        let (m, s) = weighted_mean_std(&[2.0, 6.0], &[1.0, 3.0]);
        assert!((m - 5.0).abs() < 1e-12);
        assert!((s - 3.0_f64.sqrt()).abs() < 1e-12);
    }
}
