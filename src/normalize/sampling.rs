//! Sampling-quality summary of a series.

use serde::{Deserialize, Serialize};

use crate::domain::{MS_PER_HOUR, SeriesPoint};
use crate::math::{median, weighted_mean_std};
use crate::normalize::intervals::{IntervalSet, valid_sorted};

/// How well a series was sampled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Points with a finite temperature.
    pub point_count: usize,
    /// Points dropped for a missing/non-finite temperature.
    pub dropped_points: usize,
    pub span_hours: f64,
    /// Median/max positive gap between consecutive valid samples (NaN if none).
    pub median_gap_hours: f64,
    pub max_gap_hours: f64,
    /// Time-weighted standard deviation of the interval start temperatures.
    pub temp_std_c: f64,
}

pub fn summarize_sampling(points: &[SeriesPoint], intervals: &IntervalSet) -> SeriesSummary {
    let sorted = valid_sorted(points);

    let span_hours = match (sorted.first(), sorted.last()) {
        (Some(first), Some(last)) => (last.0 - first.0) as f64 / MS_PER_HOUR,
        _ => 0.0,
    };

    let gaps: Vec<f64> = intervals.durations_days().map(|d| d * 24.0).collect();
    let max_gap_hours = gaps.iter().copied().fold(f64::NAN, f64::max);

    let temps: Vec<f64> = intervals.start_temps().collect();
    let weights: Vec<f64> = intervals.durations_days().collect();
    let (_, temp_std_c) = weighted_mean_std(&temps, &weights);

    SeriesSummary {
        point_count: sorted.len(),
        dropped_points: points.len() - sorted.len(),
        span_hours,
        median_gap_hours: median(&gaps),
        max_gap_hours,
        temp_std_c,
    }
}
