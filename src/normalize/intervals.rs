//! Consecutive integration intervals.
//!
//! Only points with a finite temperature take part. Pairs with a non-positive
//! gap (duplicate timestamps) are dropped outright, never merged or clamped.

use serde::Serialize;

use crate::domain::{Interval, MS_PER_DAY, SeriesPoint};

/// Intervals plus their summed duration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntervalSet {
    pub intervals: Vec<Interval>,
    pub total_days: f64,
}

impl IntervalSet {
    pub fn start_temps(&self) -> impl Iterator<Item = f64> + '_ {
        self.intervals.iter().map(|i| i.start_temp_c)
    }

    pub fn durations_days(&self) -> impl Iterator<Item = f64> + '_ {
        self.intervals.iter().map(|i| i.duration_days)
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Valid `(timestamp_ms, temperature_c)` pairs in ascending time.
///
/// Ties on timestamp are broken by temperature so the order never depends on
/// how the caller arranged the input.
pub fn valid_sorted(points: &[SeriesPoint]) -> Vec<(i64, f64)> {
    let mut out: Vec<(i64, f64)> = points
        .iter()
        .filter_map(|p| p.valid_temperature().map(|t| (p.timestamp_ms, t)))
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    out
}

pub fn prepare_intervals(points: &[SeriesPoint]) -> IntervalSet {
    let sorted = valid_sorted(points);
    let mut intervals = Vec::with_capacity(sorted.len().saturating_sub(1));
    let mut total_days = 0.0;

    for w in sorted.windows(2) {
        let (t0, temp) = w[0];
        let dt = w[1].0 - t0;
        if dt <= 0 {
            continue;
        }
        let duration_days = dt as f64 / MS_PER_DAY;
        total_days += duration_days;
        intervals.push(Interval {
            start_temp_c: temp,
            duration_days,
        });
    }

    IntervalSet {
        intervals,
        total_days,
    }
}
