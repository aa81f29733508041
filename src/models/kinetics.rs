//! Rate laws relative to the reference temperature.
//!
//! ```text
//! RR_Q10(T) = Q10^((T - Tref) / 10)
//! RR_Arr(T) = exp(-(Ea/R) * (1/T_K - 1/Tref_K))
//! T_MKT     = -B / ln(Σ w_i * exp(-B / T_i_K)),   B = Ea/R,  w_i = dt_i / Σdt
//! t_eq      = Σ dt_i * RR(T_i)
//! ```

use crate::domain::{GAS_CONSTANT, KELVIN_OFFSET, KineticsConfig};
use crate::normalize::IntervalSet;

pub fn rr_q10(temp_c: f64, config: &KineticsConfig) -> f64 {
    config.q10.powf((temp_c - config.tref_c) / 10.0)
}

pub fn rr_arrhenius(temp_c: f64, config: &KineticsConfig) -> f64 {
    let b = config.ea_j_per_mol / GAS_CONSTANT;
    let t_k = temp_c + KELVIN_OFFSET;
    let tref_k = config.tref_c + KELVIN_OFFSET;
    (-b * (1.0 / t_k - 1.0 / tref_k)).exp()
}

/// Mean kinetic temperature (°C) of the interval profile.
///
/// `None` when the profile has no duration or the logarithm has no real
/// solution (underflow, `Ea = 0`).
pub fn mean_kinetic_temperature(intervals: &IntervalSet, ea_j_per_mol: f64) -> Option<f64> {
    let total: f64 = intervals.durations_days().sum();
    if !(total > 0.0) {
        return None;
    }

    let b = ea_j_per_mol / GAS_CONSTANT;
    let sum: f64 = intervals
        .intervals
        .iter()
        .map(|i| (i.duration_days / total) * (-b / (i.start_temp_c + KELVIN_OFFSET)).exp())
        .sum();
    if !(sum > 0.0 && sum.is_finite()) {
        return None;
    }

    let mkt_k = -b / sum.ln();
    mkt_k.is_finite().then(|| mkt_k - KELVIN_OFFSET)
}

/// `Σ dt_i * rate(T_i)` in days.
pub fn integrated_equivalent_days(intervals: &IntervalSet, rate: impl Fn(f64) -> f64) -> f64 {
    intervals
        .intervals
        .iter()
        .map(|i| i.duration_days * rate(i.start_temp_c))
        .sum()
}

/// Remaining life is never negative; non-finite stays `NaN`.
pub fn clamp_days(x: f64) -> f64 {
    if !x.is_finite() {
        f64::NAN
    } else if x < 0.0 {
        0.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Interval;

    fn profile(parts: &[(f64, f64)]) -> IntervalSet {
        let intervals: Vec<Interval> = parts
            .iter()
            .map(|&(start_temp_c, duration_days)| Interval {
                start_temp_c,
                duration_days,
            })
            .collect();
        let total_days = intervals.iter().map(|i| i.duration_days).sum();
        IntervalSet {
            intervals,
            total_days,
        }
    }

    #[test]
    fn rates_are_one_at_reference() {
        let cfg = KineticsConfig::default();
        assert_eq!(rr_q10(cfg.tref_c, &cfg), 1.0);
        assert_eq!(rr_arrhenius(cfg.tref_c, &cfg), 1.0);
    }

    #[test]
    fn q10_triples_per_ten_degrees() {
        let cfg = KineticsConfig::default();
        assert!((rr_q10(15.0, &cfg) - 3.0).abs() < 1e-12);
        assert!((rr_q10(-5.0, &cfg) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn arrhenius_increases_with_temperature() {
        let cfg = KineticsConfig::default();
        let warm = rr_arrhenius(15.0, &cfg);
        assert!(warm > 1.0);
        let expected = (-(90_000.0_f64 / 8.314) * (1.0 / 288.15 - 1.0 / 278.15)).exp();
        assert!((warm - expected).abs() < 1e-12);
    }

    #[test]
    fn mkt_of_constant_profile_is_that_temperature() {
        let mkt = mean_kinetic_temperature(&profile(&[(5.0, 1.0), (5.0, 1.0)]), 90_000.0).unwrap();
        assert!((mkt - 5.0).abs() < 1e-9, "{mkt}");
    }

    #[test]
    fn mkt_is_pulled_towards_warm_segments() {
        let mkt = mean_kinetic_temperature(&profile(&[(2.0, 1.0), (12.0, 1.0)]), 90_000.0).unwrap();
        assert!(mkt > 7.0 && mkt < 12.0, "{mkt}");
    }

    #[test]
    fn mkt_undefined_cases() {
        assert_eq!(mean_kinetic_temperature(&IntervalSet::default(), 90_000.0), None);
        assert_eq!(mean_kinetic_temperature(&profile(&[(5.0, 1.0)]), 0.0), None);
    }

    #[test]
    fn clamp_days_rules() {
        assert_eq!(clamp_days(3.5), 3.5);
        assert_eq!(clamp_days(-0.1), 0.0);
        assert!(clamp_days(f64::NAN).is_nan());
        assert!(clamp_days(f64::INFINITY).is_nan());
    }
}
