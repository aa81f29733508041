//! Heuristic confidence per model.
//!
//! Every model starts at 88. Shared penalties (sampling and inter-model
//! disagreement) apply to all six; model-specific rules then reward or
//! penalise the data shapes each formalism handles well or badly. Scores are
//! clamped to `0..=100` and rounded.

use serde::{Deserialize, Serialize};

use crate::domain::{ConfidenceScore, ExposureReport, KineticModelResult, ModelKey};
use crate::math::{mean, spread};
use crate::models::KineticsSummary;
use crate::normalize::SeriesSummary;

pub const BASE_SCORE: f64 = 88.0;
pub const MAX_REASONS: usize = 3;
pub const FALLBACK_REASON: &str = "Good data coverage and model agreement";

/// Common gap/density thresholds (hours, points), shared with the ranker.
pub const DENSE_MAX_GAP_HOURS: f64 = 2.0;
pub const DENSE_MIN_POINTS: usize = 20;
pub const LARGE_GAP_HOURS: f64 = 6.0;
pub const HIGH_STD_C: f64 = 5.0;
pub const MODERATE_STD_C: f64 = 2.5;
pub const HIGH_SPREAD_PCT: f64 = 35.0;

/// Everything the rules look at, gathered once per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringInputs {
    pub point_count: usize,
    pub span_hours: f64,
    pub median_gap_hours: f64,
    pub max_gap_hours: f64,
    pub baseline_life_days: f64,
    /// Spread of finite remaining-life estimates, % of baseline life.
    pub disagreement_pct: f64,
    /// Mean of finite remaining-life estimates (days).
    pub mean_estimate_days: f64,
    pub excursions: usize,
    pub pct_above: f64,
    /// `max_temp - cutoff` (°C).
    pub max_over_cutoff_c: f64,
    pub temp_std_c: f64,
    pub risk_of_loss_pct: f64,
}

impl ScoringInputs {
    pub fn gather(
        summary: &SeriesSummary,
        exposure: &ExposureReport,
        kinetics: &KineticsSummary,
        cutoff_c: f64,
        baseline_life_days: f64,
    ) -> Self {
        let estimates = kinetics.remaining_estimates();
        Self {
            point_count: summary.point_count,
            span_hours: summary.span_hours,
            median_gap_hours: summary.median_gap_hours,
            max_gap_hours: summary.max_gap_hours,
            baseline_life_days,
            disagreement_pct: pct_of(spread(&estimates), baseline_life_days),
            mean_estimate_days: mean(&estimates),
            excursions: exposure.excursions,
            pct_above: exposure.pct_above,
            max_over_cutoff_c: exposure.max_temp - cutoff_c,
            temp_std_c: summary.temp_std_c,
            risk_of_loss_pct: kinetics.risk_of_loss_pct,
        }
    }

    /// Short gaps and enough points for interval integration.
    pub fn is_dense(&self) -> bool {
        self.max_gap_hours <= DENSE_MAX_GAP_HOURS && self.point_count >= DENSE_MIN_POINTS
    }

    /// Profile has peaks that MKT weighting is built for.
    pub fn has_spikes(&self) -> bool {
        self.excursions >= 2 || self.pct_above > 10.0 || self.max_over_cutoff_c > 4.0
    }
}

/// `value / baseline * 100`, `NaN` for a zero baseline.
pub fn pct_of(value: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        value / baseline * 100.0
    } else {
        f64::NAN
    }
}

/// One triggered rule.
#[derive(Debug, Clone, PartialEq)]
struct Adjustment {
    delta: f64,
    reason: String,
}

impl Adjustment {
    fn new(delta: f64, reason: impl Into<String>) -> Self {
        Self {
            delta,
            reason: reason.into(),
        }
    }
}

fn shared_adjustments(inputs: &ScoringInputs) -> Vec<Adjustment> {
    let mut out = Vec::new();

    if inputs.point_count < 8 {
        out.push(Adjustment::new(-30.0, format!("Very few samples ({})", inputs.point_count)));
    } else if inputs.point_count < 20 {
        out.push(Adjustment::new(-15.0, format!("Limited samples ({})", inputs.point_count)));
    }

    if inputs.max_gap_hours > 8.0 {
        out.push(Adjustment::new(
            -20.0,
            format!("Sampling gap up to {:.1} h", inputs.max_gap_hours),
        ));
    } else if inputs.max_gap_hours > 3.0 {
        out.push(Adjustment::new(
            -10.0,
            format!("Sampling gap up to {:.1} h", inputs.max_gap_hours),
        ));
    }

    if inputs.span_hours < 2.0 {
        out.push(Adjustment::new(
            -12.0,
            format!("Short record ({:.1} h)", inputs.span_hours),
        ));
    }

    if inputs.disagreement_pct > 70.0 {
        out.push(Adjustment::new(
            -18.0,
            format!("Models disagree strongly ({:.0}% of baseline)", inputs.disagreement_pct),
        ));
    } else if inputs.disagreement_pct > 35.0 {
        out.push(Adjustment::new(
            -10.0,
            format!("Models disagree ({:.0}% of baseline)", inputs.disagreement_pct),
        ));
    }

    out
}

fn model_adjustments(model: &KineticModelResult, inputs: &ScoringInputs) -> Vec<Adjustment> {
    let mut out = Vec::new();

    let deviation = pct_of(
        (model.remaining_life_days - inputs.mean_estimate_days).abs(),
        inputs.baseline_life_days,
    );
    if deviation > 35.0 {
        out.push(Adjustment::new(
            -14.0,
            format!("Far from model mean ({deviation:.0}% of baseline)"),
        ));
    } else if deviation > 18.0 {
        out.push(Adjustment::new(
            -7.0,
            format!("Off the model mean ({deviation:.0}% of baseline)"),
        ));
    }

    match model.model {
        ModelKey::AvgQ10 => {
            if inputs.temp_std_c > HIGH_STD_C {
                out.push(Adjustment::new(
                    -16.0,
                    format!("Averaging hides a volatile profile (σ {:.1} °C)", inputs.temp_std_c),
                ));
            } else if inputs.temp_std_c > MODERATE_STD_C {
                out.push(Adjustment::new(
                    -8.0,
                    format!("Averaging smooths a variable profile (σ {:.1} °C)", inputs.temp_std_c),
                ));
            }
            if inputs.excursions >= 4 {
                out.push(Adjustment::new(
                    -8.0,
                    format!("{} excursions flattened by averaging", inputs.excursions),
                ));
            }
        }
        key if key.is_integrated() => {
            if inputs.is_dense() {
                out.push(Adjustment::new(5.0, "Dense sampling suits interval integration"));
            }
            if inputs.max_gap_hours > LARGE_GAP_HOURS {
                out.push(Adjustment::new(-6.0, "Gaps over 6 h weaken interval integration"));
            }
        }
        key if key.is_mkt() => {
            if inputs.has_spikes() {
                out.push(Adjustment::new(6.0, "Temperature spikes suit MKT weighting"));
            } else {
                out.push(Adjustment::new(-5.0, "Flat profile; MKT adds little"));
            }
        }
        ModelKey::Fefo => {
            let r = inputs.risk_of_loss_pct;
            if r == 0.0 || r == 100.0 {
                out.push(Adjustment::new(-4.0, format!("Risk of loss saturated at {r:.0}%")));
            }
        }
        _ => {}
    }

    if inputs.pct_above > 60.0 {
        out.push(Adjustment::new(
            -4.0,
            format!("{:.0}% of time above cutoff", inputs.pct_above),
        ));
    }

    out
}

/// Score one model.
pub fn score_model(model: &KineticModelResult, inputs: &ScoringInputs) -> ConfidenceScore {
    if !model.remaining_life_days.is_finite() {
        return ConfidenceScore {
            model: model.model,
            score: 0,
            reasons: vec!["No kinetic solution for this series".to_string()],
        };
    }

    let adjustments: Vec<Adjustment> = shared_adjustments(inputs)
        .into_iter()
        .chain(model_adjustments(model, inputs))
        .collect();

    let raw = BASE_SCORE + adjustments.iter().map(|a| a.delta).sum::<f64>();
    let score = raw.clamp(0.0, 100.0).round() as u8;

    let mut reasons: Vec<String> = adjustments
        .into_iter()
        .take(MAX_REASONS)
        .map(|a| a.reason)
        .collect();
    if reasons.is_empty() {
        reasons.push(FALLBACK_REASON.to_string());
    }

    ConfidenceScore {
        model: model.model,
        score,
        reasons,
    }
}

/// Score all models, in the order given.
pub fn score_models(results: &[KineticModelResult], inputs: &ScoringInputs) -> Vec<ConfidenceScore> {
    results.iter().map(|r| score_model(r, inputs)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn good_inputs() -> ScoringInputs {
        ScoringInputs {
            point_count: 200,
            span_hours: 48.0,
            median_gap_hours: 0.25,
            max_gap_hours: 0.5,
            baseline_life_days: 7.16,
            disagreement_pct: 5.0,
            mean_estimate_days: 5.0,
            excursions: 0,
            pct_above: 0.0,
            max_over_cutoff_c: -1.0,
            temp_std_c: 0.5,
            risk_of_loss_pct: 30.0,
        }
    }

    fn result(model: ModelKey, remaining: f64) -> KineticModelResult {
        KineticModelResult {
            model,
            equivalent_time_days: 7.16 - remaining,
            remaining_life_days: remaining,
            reduction_pct: 0.0,
        }
    }

    #[test]
    fn clean_data_keeps_base_score_with_fallback_reason() {
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &good_inputs());
        assert_eq!(s.score, 88);
        assert_eq!(s.reasons, vec![FALLBACK_REASON.to_string()]);
    }

    #[test]
    fn dense_integration_gets_bonus() {
        let s = score_model(&result(ModelKey::Q10Int, 5.0), &good_inputs());
        assert_eq!(s.score, 93);
        assert_eq!(s.reasons.len(), 1);
    }

    #[test]
    fn flat_profile_penalises_mkt_models() {
        let s = score_model(&result(ModelKey::MktArr, 5.0), &good_inputs());
        assert_eq!(s.score, 83);

        let mut spiky = good_inputs();
        spiky.excursions = 2;
        let s = score_model(&result(ModelKey::MktArr, 5.0), &spiky);
        assert_eq!(s.score, 94);
    }

    #[test]
    fn sparse_short_series_stacks_shared_penalties() {
        let mut inputs = good_inputs();
        inputs.point_count = 5;
        inputs.max_gap_hours = 9.0;
        inputs.span_hours = 1.5;
        inputs.disagreement_pct = 80.0;
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &inputs);
        // 88 - 30 - 20 - 12 - 18 = 8
        assert_eq!(s.score, 8);
        assert_eq!(s.reasons.len(), MAX_REASONS);
        assert!(s.reasons[0].starts_with("Very few samples"));
        assert!(s.reasons[1].starts_with("Sampling gap"));
        assert!(s.reasons[2].starts_with("Short record"));
    }

    #[test]
    fn limited_sample_count_band() {
        let mut inputs = good_inputs();
        inputs.point_count = 12;
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &inputs);
        assert_eq!(s.score, 73);
        assert_eq!(s.reasons, vec!["Limited samples (12)".to_string()]);

        inputs.point_count = 8;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 73);
        inputs.point_count = 20;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 88);
    }

    #[test]
    fn moderate_gap_band() {
        let mut inputs = good_inputs();
        inputs.max_gap_hours = 5.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 78);
        // No longer dense, but not a large gap either.
        assert_eq!(score_model(&result(ModelKey::Q10Int, 5.0), &inputs).score, 78);

        inputs.max_gap_hours = 8.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 78);
        inputs.max_gap_hours = 3.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 88);
    }

    #[test]
    fn large_gap_penalises_integrated_models() {
        let mut inputs = good_inputs();
        inputs.max_gap_hours = 7.0;
        // 88 - 10 (shared gap) - 6 (integration gap)
        for key in [ModelKey::Q10Int, ModelKey::ArrInt] {
            let s = score_model(&result(key, 5.0), &inputs);
            assert_eq!(s.score, 72, "{key:?}");
            assert!(s.reasons[1].starts_with("Gaps over 6 h"));
        }
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 78);
    }

    #[test]
    fn moderate_disagreement_band() {
        let mut inputs = good_inputs();
        inputs.disagreement_pct = 50.0;
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &inputs);
        assert_eq!(s.score, 78);
        assert!(s.reasons[0].starts_with("Models disagree (50%"));

        inputs.disagreement_pct = 70.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 78);
        inputs.disagreement_pct = 35.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 88);
    }

    #[test]
    fn variable_profile_band_for_average_model() {
        let mut inputs = good_inputs();
        inputs.temp_std_c = 3.0;
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &inputs);
        assert_eq!(s.score, 80);
        assert!(s.reasons[0].starts_with("Averaging smooths"));

        inputs.temp_std_c = 5.0;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 80);
        inputs.temp_std_c = 2.5;
        assert_eq!(score_model(&result(ModelKey::AvgQ10, 5.0), &inputs).score, 88);
        // Only the average model looks at the spread of temperatures.
        inputs.temp_std_c = 3.0;
        assert_eq!(score_model(&result(ModelKey::Q10Int, 5.0), &inputs).score, 93);
    }

    #[test]
    fn fefo_saturated_risk_and_global_exposure_penalties() {
        let mut inputs = good_inputs();
        inputs.risk_of_loss_pct = 100.0;
        inputs.pct_above = 75.0;
        inputs.max_over_cutoff_c = 6.0;
        let s = score_model(&result(ModelKey::Fefo, 5.0), &inputs);
        assert_eq!(s.score, 80);
        assert!(s.reasons[0].contains("saturated"));
        assert!(s.reasons[1].contains("above cutoff"));
    }

    #[test]
    fn deviation_from_mean_is_penalised() {
        let s = score_model(&result(ModelKey::AvgQ10, 5.0 + 0.25 * 7.16), &good_inputs());
        assert_eq!(s.score, 81);
        let s = score_model(&result(ModelKey::AvgQ10, 5.0 - 0.5 * 7.16), &good_inputs());
        assert_eq!(s.score, 74);
    }

    #[test]
    fn volatile_profile_penalises_average_model() {
        let mut inputs = good_inputs();
        inputs.temp_std_c = 6.0;
        inputs.excursions = 4;
        inputs.max_over_cutoff_c = 1.0;
        let s = score_model(&result(ModelKey::AvgQ10, 5.0), &inputs);
        assert_eq!(s.score, 64);
    }

    #[test]
    fn undefined_model_scores_zero() {
        let s = score_model(&result(ModelKey::MktQ10, f64::NAN), &good_inputs());
        assert_eq!(s.score, 0);
        assert_eq!(s.reasons.len(), 1);
    }

    #[test]
    fn scores_are_clamped() {
        let mut inputs = good_inputs();
        inputs.point_count = 1;
        inputs.max_gap_hours = 100.0;
        inputs.span_hours = 0.1;
        inputs.disagreement_pct = 500.0;
        inputs.pct_above = 90.0;
        let s = score_model(&result(ModelKey::ArrInt, 0.0), &inputs);
        assert_eq!(s.score, 0);
    }
}
