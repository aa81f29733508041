//! Composite model ranking.
//!
//! `rank_score = 0.55 * confidence + 0.35 * agreement + 10 + suitability`,
//! where agreement measures distance from the median estimate.

use serde::{Deserialize, Serialize};

use crate::domain::{BiasLabel, ComparisonRow, ConfidenceScore, KineticModelResult, ModelKey};
use crate::math::{median, spread};
use crate::scoring::confidence::{
    HIGH_SPREAD_PCT, HIGH_STD_C, LARGE_GAP_HOURS, MODERATE_STD_C, ScoringInputs, pct_of,
};

const CONFIDENCE_WEIGHT: f64 = 0.55;
const AGREEMENT_WEIGHT: f64 = 0.35;
const RANK_OFFSET: f64 = 10.0;
const AGREEMENT_SLOPE: f64 = 2.2;
/// Band around the consensus (as % of baseline) labelled `Consensus`.
pub const CONSENSUS_BAND_PCT: f64 = 5.0;

/// Ranker output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Sorted by descending `rank_score`; ranks start at 1.
    pub rows: Vec<ComparisonRow>,
    /// Median of finite remaining-life estimates (days).
    pub consensus_days: f64,
    /// Spread of finite estimates as % of baseline life.
    pub spread_pct: f64,
    pub rationale: String,
}

impl Ranking {
    pub fn top(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }
}

/// `clamp(100 - 2.2 * delta_pct, 0, 100)`; 0 for an undefined estimate.
pub fn agreement_score(estimate: f64, consensus: f64, baseline_life_days: f64) -> f64 {
    let delta = pct_of((estimate - consensus).abs(), baseline_life_days);
    if delta.is_finite() {
        (100.0 - AGREEMENT_SLOPE * delta).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn bias_label(estimate: f64, consensus: f64, baseline_life_days: f64) -> BiasLabel {
    let delta = pct_of(estimate - consensus, baseline_life_days);
    if !delta.is_finite() {
        BiasLabel::Undefined
    } else if delta > CONSENSUS_BAND_PCT {
        BiasLabel::Optimistic
    } else if delta < -CONSENSUS_BAND_PCT {
        BiasLabel::Conservative
    } else {
        BiasLabel::Consensus
    }
}

/// Per-type bonus, same triggers as the confidence rules with ranker weights.
pub fn suitability_bonus(model: ModelKey, inputs: &ScoringInputs) -> f64 {
    match model {
        ModelKey::AvgQ10 => {
            if inputs.temp_std_c > HIGH_STD_C {
                -8.0
            } else if inputs.temp_std_c <= MODERATE_STD_C {
                6.0
            } else {
                0.0
            }
        }
        key if key.is_integrated() => {
            if inputs.is_dense() {
                8.0
            } else if inputs.max_gap_hours > LARGE_GAP_HOURS {
                -8.0
            } else {
                0.0
            }
        }
        key if key.is_mkt() => {
            if inputs.has_spikes() {
                8.0
            } else {
                -5.0
            }
        }
        ModelKey::Fefo => -2.0,
        _ => 0.0,
    }
}

/// Rank every model that has a confidence score.
pub fn rank_models(
    results: &[KineticModelResult],
    confidence: &[ConfidenceScore],
    inputs: &ScoringInputs,
) -> Ranking {
    let baseline = inputs.baseline_life_days;
    let estimates: Vec<f64> = results.iter().map(|r| r.remaining_life_days).collect();
    let consensus_days = median(&estimates);
    let spread_pct = pct_of(spread(&estimates), baseline);

    let mut rows: Vec<ComparisonRow> = results
        .iter()
        .map(|r| {
            let conf = confidence
                .iter()
                .find(|c| c.model == r.model)
                .map_or(0, |c| c.score);
            let agreement = agreement_score(r.remaining_life_days, consensus_days, baseline);
            let rank_score = CONFIDENCE_WEIGHT * f64::from(conf)
                + AGREEMENT_WEIGHT * agreement
                + RANK_OFFSET
                + suitability_bonus(r.model, inputs);
            ComparisonRow {
                model: r.model,
                rank: 0,
                rank_score,
                remaining_life_days: r.remaining_life_days,
                reduction_pct: r.reduction_pct,
                confidence: conf,
                agreement_score: agreement,
                bias_label: bias_label(r.remaining_life_days, consensus_days, baseline),
            }
        })
        .collect();

    // Stable sort keeps `ModelKey::ALL` order on equal scores.
    rows.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    let rationale = rationale(rows.first(), spread_pct);
    Ranking {
        rows,
        consensus_days,
        spread_pct,
        rationale,
    }
}

fn rationale(top: Option<&ComparisonRow>, spread_pct: f64) -> String {
    let Some(top) = top else {
        return "No models could be ranked.".to_string();
    };
    let qualifier = if spread_pct > HIGH_SPREAD_PCT {
        "high"
    } else {
        "moderate"
    };
    let spread_text = if spread_pct.is_finite() {
        format!("{spread_pct:.0}% of baseline life")
    } else {
        "undefined".to_string()
    };
    format!(
        "{} ranks first with confidence {} and agreement score {:.0}. \
         Inter-model spread is {} ({}); treat the top estimate as the most \
         defensible of the six rather than a guarantee.",
        top.model.display_name(),
        top.confidence,
        top.agreement_score,
        qualifier,
        spread_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::confidence::score_models;

    fn inputs() -> ScoringInputs {
        ScoringInputs {
            point_count: 200,
            span_hours: 48.0,
            median_gap_hours: 0.25,
            max_gap_hours: 0.5,
            baseline_life_days: 10.0,
            disagreement_pct: 0.0,
            mean_estimate_days: 5.0,
            excursions: 0,
            pct_above: 0.0,
            max_over_cutoff_c: -1.0,
            temp_std_c: 0.5,
            risk_of_loss_pct: 30.0,
        }
    }

    fn results(remaining: [f64; 6]) -> Vec<KineticModelResult> {
        ModelKey::ALL
            .iter()
            .zip(remaining)
            .map(|(&model, r)| KineticModelResult {
                model,
                equivalent_time_days: 10.0 - r,
                remaining_life_days: r,
                reduction_pct: 100.0 - r * 10.0,
            })
            .collect()
    }

    #[test]
    fn agreement_falls_with_distance_from_consensus() {
        assert_eq!(agreement_score(5.0, 5.0, 10.0), 100.0);
        assert!((agreement_score(6.0, 5.0, 10.0) - 78.0).abs() < 1e-9);
        assert_eq!(agreement_score(0.0, 10.0, 10.0), 0.0);
        assert_eq!(agreement_score(f64::NAN, 5.0, 10.0), 0.0);
    }

    #[test]
    fn bias_labels_use_consensus_band() {
        assert_eq!(bias_label(5.3, 5.0, 10.0), BiasLabel::Consensus);
        assert_eq!(bias_label(6.0, 5.0, 10.0), BiasLabel::Optimistic);
        assert_eq!(bias_label(4.0, 5.0, 10.0), BiasLabel::Conservative);
        assert_eq!(bias_label(f64::NAN, 5.0, 10.0), BiasLabel::Undefined);
    }

    #[test]
    fn rows_sorted_and_ranked_from_one() {
        let res = results([5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        let inp = inputs();
        let conf = score_models(&res, &inp);
        let ranking = rank_models(&res, &conf, &inp);

        assert_eq!(ranking.rows.len(), 6);
        for (i, row) in ranking.rows.iter().enumerate() {
            assert_eq!(row.rank, i + 1);
        }
        for pair in ranking.rows.windows(2) {
            assert!(pair[0].rank_score >= pair[1].rank_score);
        }
        // Dense, flat profile: integrated models lead.
        let top = ranking.top().unwrap();
        assert_eq!(top.model, ModelKey::Q10Int);
        // 0.55*93 + 0.35*100 + 10 + 8
        assert!((top.rank_score - 104.15).abs() < 1e-9);
        assert!(ranking.rationale.contains("Integrated Q10"));
        assert!(ranking.rationale.contains("moderate"));
    }

    #[test]
    fn undefined_mkt_models_sink_to_the_bottom() {
        let res = results([5.0, 5.0, 5.0, 5.0, f64::NAN, f64::NAN]);
        let inp = inputs();
        let conf = score_models(&res, &inp);
        let ranking = rank_models(&res, &conf, &inp);

        assert_eq!(ranking.consensus_days, 5.0);
        let tail: Vec<ModelKey> = ranking.rows[4..].iter().map(|r| r.model).collect();
        assert_eq!(tail, vec![ModelKey::MktQ10, ModelKey::MktArr]);
        for row in &ranking.rows[4..] {
            assert_eq!(row.confidence, 0);
            assert_eq!(row.agreement_score, 0.0);
            assert_eq!(row.bias_label, BiasLabel::Undefined);
        }
    }

    #[test]
    fn wide_spread_is_called_high() {
        let res = results([1.0, 9.0, 5.0, 5.0, 5.0, 5.0]);
        let inp = inputs();
        let conf = score_models(&res, &inp);
        let ranking = rank_models(&res, &conf, &inp);
        assert!((ranking.spread_pct - 80.0).abs() < 1e-9);
        assert!(ranking.rationale.contains("high"));
    }

    #[test]
    fn suitability_bonus_by_model_type() {
        let mut inp = inputs();
        assert_eq!(suitability_bonus(ModelKey::AvgQ10, &inp), 6.0);
        assert_eq!(suitability_bonus(ModelKey::Q10Int, &inp), 8.0);
        assert_eq!(suitability_bonus(ModelKey::MktQ10, &inp), -5.0);
        assert_eq!(suitability_bonus(ModelKey::Fefo, &inp), -2.0);

        inp.temp_std_c = 6.0;
        inp.max_gap_hours = 7.0;
        inp.excursions = 3;
        assert_eq!(suitability_bonus(ModelKey::AvgQ10, &inp), -8.0);
        assert_eq!(suitability_bonus(ModelKey::ArrInt, &inp), -8.0);
        assert_eq!(suitability_bonus(ModelKey::MktArr, &inp), 8.0);
    }
}
