//! Synthetic cold-chain logger traces.
//!
//! A trace is a regularly sampled base temperature with Gaussian sensor noise
//! and a number of door-open excursions. Each excursion ramps linearly up to
//! `excursion_rise_c` above the base and back down over `excursion_minutes`.
//! Generation is fully determined by the seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::SeriesPoint;
use crate::error::AppError;

const MS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub seed: u64,
    pub hours: f64,
    pub interval_minutes: f64,
    /// First sample instant (epoch ms).
    pub start_ms: i64,
    pub base_temp_c: f64,
    pub noise_sd_c: f64,
    pub excursions: usize,
    pub excursion_rise_c: f64,
    pub excursion_minutes: f64,
    /// Probability that a sample has no temperature reading.
    pub missing_prob: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            hours: 48.0,
            interval_minutes: 15.0,
            // 2024-01-01T00:00:00Z
            start_ms: 1_704_067_200_000,
            base_temp_c: 3.5,
            noise_sd_c: 0.4,
            excursions: 3,
            excursion_rise_c: 6.0,
            excursion_minutes: 90.0,
            missing_prob: 0.0,
        }
    }
}

/// Generate one trace.
pub fn generate_trace(config: &SyntheticConfig) -> Result<Vec<SeriesPoint>, AppError> {
    if !(config.hours.is_finite() && config.hours > 0.0) {
        return Err(AppError::new(2, "Synthetic trace length must be > 0 hours."));
    }
    if !(config.interval_minutes.is_finite() && config.interval_minutes > 0.0) {
        return Err(AppError::new(2, "Synthetic sample interval must be > 0 minutes."));
    }
    if !(0.0..1.0).contains(&config.missing_prob) {
        return Err(AppError::new(2, "Missing-sample probability must be in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise_sd_c.max(0.0))
        .map_err(|e| AppError::new(2, format!("Noise distribution error: {e}")))?;

    let step_ms = (config.interval_minutes * MS_PER_MINUTE as f64).round() as i64;
    let span_ms = (config.hours * 60.0 * MS_PER_MINUTE as f64).round() as i64;
    let steps = (span_ms / step_ms.max(1)) as usize;
    let excursion_ms = config.excursion_minutes.max(0.0) * MS_PER_MINUTE as f64;

    let mut starts: Vec<f64> = (0..config.excursions)
        .map(|_| rng.gen_range(0.0..(span_ms as f64).max(1.0)))
        .collect();
    starts.sort_by(f64::total_cmp);

    let mut points = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let offset = (i as i64) * step_ms;
        let rise: f64 = starts
            .iter()
            .map(|&s| excursion_rise(offset as f64 - s, excursion_ms, config.excursion_rise_c))
            .fold(0.0, f64::max);
        let temp = config.base_temp_c + rise + noise.sample(&mut rng);
        let missing = config.missing_prob > 0.0 && rng.r#gen::<f64>() < config.missing_prob;
        points.push(SeriesPoint::new(
            config.start_ms + offset,
            (!missing).then_some(temp),
        ));
    }

    Ok(points)
}

/// Triangular excursion profile at `dt` ms after its start.
fn excursion_rise(dt: f64, duration_ms: f64, peak: f64) -> f64 {
    if duration_ms <= 0.0 || dt < 0.0 || dt > duration_ms {
        return 0.0;
    }
    let half = duration_ms / 2.0;
    peak * (1.0 - (dt - half).abs() / half)
}
