//! Illustrative risk-of-loss figures.
//!
//! The risk is a placeholder visualisation: the remaining-life estimate is
//! jittered by a uniform ±1 day and we count how often it lands below an
//! absolute 4-day threshold. It is not a calibrated probability.
//!
//! The legacy table reproduces the older threshold-triggered shelf-life line,
//! `L(h) = max(-0.3796 * h + 7.1597, 0)` for `h` hours above the cutoff, as a
//! sensitivity view next to the kinetic models.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// Estimates below this many days count as a loss.
pub const LOSS_THRESHOLD_DAYS: f64 = 4.0;
/// Half-width of the uniform jitter (days).
pub const JITTER_DAYS: f64 = 1.0;

const LEGACY_SLOPE_PER_HOUR: f64 = -0.3796;
const LEGACY_INTERCEPT_DAYS: f64 = 7.1597;
/// Hours-above rows always shown in the legacy table.
pub const LEGACY_TABLE_HOURS: [f64; 5] = [0.0, 2.0, 4.0, 6.0, 8.0];

/// Percentage of jittered samples below the loss threshold.
///
/// Deterministic for a given seed. `NaN` for a non-finite estimate.
pub fn risk_of_loss_pct(remaining_days: f64, samples: usize, seed: u64) -> f64 {
    if !remaining_days.is_finite() || samples == 0 {
        return f64::NAN;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Uniform::new(-JITTER_DAYS, JITTER_DAYS);
    let losses = (0..samples)
        .filter(|_| remaining_days + jitter.sample(&mut rng) < LOSS_THRESHOLD_DAYS)
        .count();
    losses as f64 / samples as f64 * 100.0
}

/// One row of the legacy hours-above table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyShelfRow {
    pub hours_above: f64,
    pub risk_of_loss_pct: f64,
    pub shelf_life_days: f64,
    pub remaining_pct: f64,
    pub reduction_pct: f64,
    /// Row computed from the observed hours above the cutoff.
    pub observed: bool,
}

/// Legacy linear shelf life for `hours_above` hours over the cutoff.
pub fn legacy_shelf_life_days(hours_above: f64) -> f64 {
    (LEGACY_SLOPE_PER_HOUR * hours_above + LEGACY_INTERCEPT_DAYS).max(0.0)
}

/// Fixed rows plus the observed row, in ascending hours.
pub fn legacy_shelf_table(
    observed_hours_above: f64,
    baseline_life_days: f64,
    samples: usize,
    seed: u64,
) -> Vec<LegacyShelfRow> {
    let row = |hours_above: f64, observed: bool| {
        let shelf_life_days = legacy_shelf_life_days(hours_above);
        let remaining_pct = if baseline_life_days > 0.0 {
            shelf_life_days / baseline_life_days * 100.0
        } else {
            f64::NAN
        };
        LegacyShelfRow {
            hours_above,
            risk_of_loss_pct: risk_of_loss_pct(shelf_life_days, samples, seed),
            shelf_life_days,
            remaining_pct,
            reduction_pct: 100.0 - remaining_pct,
            observed,
        }
    };

    let mut rows: Vec<LegacyShelfRow> = LEGACY_TABLE_HOURS.iter().map(|&h| row(h, false)).collect();
    if observed_hours_above.is_finite() {
        rows.push(row(observed_hours_above, true));
        rows.sort_by(|a, b| a.hours_above.total_cmp(&b.hours_above));
    }
    rows
}
