//! Fixed-width time buckets for charting.
//!
//! Display aid only; the analytic models never read buckets. Each bucket holds
//! the plain (not time-weighted) mean of the temperatures that fall in it, and
//! empty buckets are omitted rather than zero-filled.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{MS_PER_HOUR, SeriesPoint};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket midpoint (epoch ms).
    pub t_mid_ms: i64,
    /// Elapsed hours from the first sample to the midpoint, e.g. `"1.50h"`.
    pub label: String,
    pub mean_c: f64,
    pub count: usize,
}

/// Bucket a series into `interval_ms` windows anchored at its first timestamp.
pub fn bucket_means(points: &[SeriesPoint], interval_ms: f64) -> Vec<Bucket> {
    if !(interval_ms.is_finite() && interval_ms > 0.0) {
        return Vec::new();
    }
    // Anchor on the earliest timestamp, even if its temperature is missing.
    let Some(t0) = points.iter().map(|p| p.timestamp_ms).min() else {
        return Vec::new();
    };

    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for p in points {
        let Some(temp) = p.valid_temperature() else {
            continue;
        };
        let idx = ((p.timestamp_ms - t0) as f64 / interval_ms).floor() as i64;
        let entry = sums.entry(idx).or_insert((0.0, 0));
        entry.0 += temp;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(idx, (sum, count))| {
            let t_start = t0 as f64 + idx as f64 * interval_ms;
            let t_mid_ms = (t_start + interval_ms / 2.0).round() as i64;
            let hours = (t_mid_ms - t0) as f64 / MS_PER_HOUR;
            Bucket {
                t_mid_ms,
                label: format!("{hours:.2}h"),
                mean_c: sum / count as f64,
                count,
            }
        })
        .collect()
}
