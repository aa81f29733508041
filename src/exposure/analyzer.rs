//! Exposure above a cutoff temperature.
//!
//! The series is treated as piecewise linear between samples. Time above the
//! cutoff is integrated exactly, including the partial segment on either side
//! of a threshold crossing, and the mean temperature is the trapezoidal
//! time-weighted average.
//!
//! The input may arrive in any order; points are sorted internally so the
//! same point set always yields the same report.

use crate::domain::{ExposureReport, MS_PER_HOUR, SeriesPoint};
use crate::normalize::valid_sorted;

pub fn compute_exposure(points: &[SeriesPoint], cutoff_c: f64) -> ExposureReport {
    let pts = valid_sorted(points);
    if pts.len() < 2 {
        return ExposureReport::empty();
    }

    let (min_temp, max_temp) = pts
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, t)| (lo.min(t), hi.max(t)));

    let mut total_dt = 0.0;
    let mut area = 0.0;
    let mut above_ms = 0.0;
    let mut excursions = 0usize;
    let mut longest_ms: f64 = 0.0;
    let mut current_ms = 0.0;

    for w in pts.windows(2) {
        let (ta, a) = w[0];
        let (tb, b) = w[1];
        let dt_i = tb - ta;
        if dt_i <= 0 {
            continue;
        }
        let dt = dt_i as f64;

        area += (a + b) / 2.0 * dt;
        total_dt += dt;

        match (a >= cutoff_c, b >= cutoff_c) {
            (true, true) => {
                above_ms += dt;
                current_ms += dt;
            }
            (false, false) => {
                longest_ms = longest_ms.max(current_ms);
                current_ms = 0.0;
            }
            (false, true) => {
                excursions += 1;
                let t_cross = crossing_time(ta, a, b, dt, cutoff_c);
                let dt_above = tb as f64 - t_cross;
                above_ms += dt_above;
                current_ms = dt_above;
            }
            (true, false) => {
                let t_cross = crossing_time(ta, a, b, dt, cutoff_c);
                let dt_above = t_cross - ta as f64;
                above_ms += dt_above;
                current_ms += dt_above;
                longest_ms = longest_ms.max(current_ms);
                current_ms = 0.0;
            }
        }
    }
    longest_ms = longest_ms.max(current_ms);

    let total_hours = total_dt / MS_PER_HOUR;
    let hours_above = above_ms / MS_PER_HOUR;

    ExposureReport {
        total_hours,
        hours_above,
        pct_above: if total_hours > 0.0 {
            hours_above / total_hours * 100.0
        } else {
            0.0
        },
        excursions,
        longest_streak_hrs: longest_ms / MS_PER_HOUR,
        min_temp,
        max_temp,
        avg_temp: if total_dt > 0.0 { area / total_dt } else { f64::NAN },
    }
}

/// Linear interpolation of the instant the segment meets the cutoff.
fn crossing_time(ta: i64, a: f64, b: f64, dt: f64, cutoff_c: f64) -> f64 {
    let r = (cutoff_c - a) / (b - a);
    ta as f64 + r * dt
}
