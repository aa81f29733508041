//! The six remaining-shelf-life models.
//!
//! Every model reduces the observed profile to an equivalent time at the
//! reference temperature (`t_eq`, days) and reports
//! `remaining = clamp_days(L_ref - t_eq)`.
//!
//! | key      | t_eq                               |
//! |----------|------------------------------------|
//! | `fefo`   | `Σ dt_i * RR_Q10(T_i)`             |
//! | `avgq10` | `total_days * RR_Q10(T_avg)`       |
//! | `q10int` | `Σ dt_i * RR_Q10(T_i)`             |
//! | `arrint` | `Σ dt_i * RR_Arr(T_i)`             |
//! | `mktq10` | `total_days * RR_Q10(T_MKT)`       |
//! | `mktarr` | `total_days * RR_Arr(T_MKT)`       |
//!
//! `fefo` shares the integrated Q10 definition but stays a separate named
//! model so it can be ranked and reported on its own.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{AnalysisConfig, KineticModelResult, KineticsConfig, ModelKey};
use crate::models::kinetics::{
    clamp_days, integrated_equivalent_days, mean_kinetic_temperature, rr_arrhenius, rr_q10,
};
use crate::models::risk::risk_of_loss_pct;
use crate::normalize::IntervalSet;

/// All kinetic outputs of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticsSummary {
    pub total_days: f64,
    /// Time-weighted average temperature fed to `avgq10`.
    pub avg_temp_c: f64,
    /// `None` when the MKT has no solution.
    pub mkt_c: Option<f64>,
    /// One entry per `ModelKey::ALL`, same order.
    pub results: Vec<KineticModelResult>,
    /// Jitter risk of loss for the `fefo` estimate (%), illustrative only.
    pub risk_of_loss_pct: f64,
}

impl KineticsSummary {
    pub fn result(&self, key: ModelKey) -> Option<&KineticModelResult> {
        self.results.iter().find(|r| r.model == key)
    }

    pub fn remaining(&self, key: ModelKey) -> f64 {
        self.result(key).map_or(f64::NAN, |r| r.remaining_life_days)
    }

    /// Remaining-life estimates in `ModelKey::ALL` order.
    pub fn remaining_estimates(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.remaining_life_days).collect()
    }
}

/// Equivalent time (days) for a single model.
pub fn equivalent_time_days(
    key: ModelKey,
    intervals: &IntervalSet,
    avg_temp_c: f64,
    mkt_c: Option<f64>,
    config: &KineticsConfig,
) -> f64 {
    let total_days = intervals.total_days;
    match key {
        ModelKey::Fefo | ModelKey::Q10Int => {
            integrated_equivalent_days(intervals, |t| rr_q10(t, config))
        }
        ModelKey::ArrInt => integrated_equivalent_days(intervals, |t| rr_arrhenius(t, config)),
        ModelKey::AvgQ10 => total_days * rr_q10(avg_temp_c, config),
        ModelKey::MktQ10 => mkt_c.map_or(f64::NAN, |m| total_days * rr_q10(m, config)),
        ModelKey::MktArr => mkt_c.map_or(f64::NAN, |m| total_days * rr_arrhenius(m, config)),
    }
}

/// Turn an equivalent time into a model result.
pub fn model_result(key: ModelKey, equivalent_time_days: f64, config: &KineticsConfig) -> KineticModelResult {
    let remaining = clamp_days(config.baseline_life_days - equivalent_time_days);
    let reduction_pct = if config.baseline_life_days > 0.0 {
        100.0 - remaining / config.baseline_life_days * 100.0
    } else {
        f64::NAN
    };
    KineticModelResult {
        model: key,
        equivalent_time_days,
        remaining_life_days: remaining,
        reduction_pct,
    }
}

/// Evaluate all six models over one interval profile.
///
/// `avg_temp_c` is the exposure analyzer's time-weighted mean; it is passed in
/// rather than recomputed so every stage sees the same value.
pub fn compute_models(intervals: &IntervalSet, avg_temp_c: f64, config: &AnalysisConfig) -> KineticsSummary {
    let kinetics = &config.kinetics;
    let mkt_c = mean_kinetic_temperature(intervals, kinetics.ea_j_per_mol);
    if mkt_c.is_none() && !intervals.is_empty() {
        warn!("mean kinetic temperature undefined; MKT models report NaN");
    }

    let results: Vec<KineticModelResult> = ModelKey::ALL
        .iter()
        .map(|&key| {
            let teq = equivalent_time_days(key, intervals, avg_temp_c, mkt_c, kinetics);
            model_result(key, teq, kinetics)
        })
        .collect();

    let fefo_remaining = results
        .iter()
        .find(|r| r.model == ModelKey::Fefo)
        .map_or(f64::NAN, |r| r.remaining_life_days);
    let risk = risk_of_loss_pct(fefo_remaining, config.risk_samples, config.risk_seed);

    KineticsSummary {
        total_days: intervals.total_days,
        avg_temp_c,
        mkt_c,
        results,
        risk_of_loss_pct: risk,
    }
}
