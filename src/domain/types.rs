//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value between pipeline stages
//! - exported to JSON/CSV
//! - compared in tests without touching any process state

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Universal gas constant, J/(mol·K). Fixed, never configurable.
pub const GAS_CONSTANT: f64 = 8.314;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

pub const MS_PER_HOUR: f64 = 3_600_000.0;
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// A single raw spreadsheet / upload cell.
///
/// JSON uploads deserialize untagged: `null` becomes `Empty`, numbers become
/// `Number`, strings become `Text`. `DateTime` is only produced by adapters
/// that already hold a parsed instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    DateTime(DateTime<Utc>),
}

impl RawValue {
    /// Build a cell from trimmed text (`""` becomes `Empty`).
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::from_text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

/// One row of an upload: header -> raw cell.
pub type RawRecord = HashMap<String, RawValue>;

/// Headers plus rows, as handed over by a spreadsheet/upload collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    /// Cell lookup that treats a missing key as an empty cell.
    pub fn cell<'a>(row: &'a RawRecord, header: &str) -> &'a RawValue {
        row.get(header).unwrap_or(&RawValue::Empty)
    }
}

/// A normalized observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    /// `None` when the temperature cell was missing or non-numeric.
    pub temperature_c: Option<f64>,
}

impl SeriesPoint {
    pub fn new(timestamp_ms: i64, temperature_c: Option<f64>) -> Self {
        Self {
            timestamp_ms,
            temperature_c,
        }
    }

    /// Finite temperature, if any.
    pub fn valid_temperature(&self) -> Option<f64> {
        self.temperature_c.filter(|t| t.is_finite())
    }
}

/// One integration step: the temperature at the start of a positive gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start_temp_c: f64,
    pub duration_days: f64,
}

/// Cutoff-relative exposure statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureReport {
    pub total_hours: f64,
    pub hours_above: f64,
    pub pct_above: f64,
    pub excursions: usize,
    pub longest_streak_hrs: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_temp: f64,
}

impl ExposureReport {
    /// Result for fewer than two valid points.
    pub fn empty() -> Self {
        Self {
            total_hours: 0.0,
            hours_above: 0.0,
            pct_above: 0.0,
            excursions: 0,
            longest_streak_hrs: 0.0,
            min_temp: f64::NAN,
            max_temp: f64::NAN,
            avg_temp: f64::NAN,
        }
    }
}

/// The six remaining-shelf-life models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKey {
    Fefo,
    AvgQ10,
    Q10Int,
    ArrInt,
    MktQ10,
    MktArr,
}

impl ModelKey {
    pub const ALL: [ModelKey; 6] = [
        ModelKey::Fefo,
        ModelKey::AvgQ10,
        ModelKey::Q10Int,
        ModelKey::ArrInt,
        ModelKey::MktQ10,
        ModelKey::MktArr,
    ];

    /// Stable machine key (`fefo`, `avgq10`, ...).
    pub fn key(self) -> &'static str {
        match self {
            ModelKey::Fefo => "fefo",
            ModelKey::AvgQ10 => "avgq10",
            ModelKey::Q10Int => "q10int",
            ModelKey::ArrInt => "arrint",
            ModelKey::MktQ10 => "mktq10",
            ModelKey::MktArr => "mktarr",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKey::Fefo => "FEFO (Q10 t_eq)",
            ModelKey::AvgQ10 => "Avg temp + Q10",
            ModelKey::Q10Int => "Integrated Q10",
            ModelKey::ArrInt => "Integrated Arrhenius",
            ModelKey::MktQ10 => "MKT + Q10",
            ModelKey::MktArr => "MKT + Arrhenius",
        }
    }

    /// Models that integrate interval by interval.
    pub fn is_integrated(self) -> bool {
        matches!(self, ModelKey::Q10Int | ModelKey::ArrInt)
    }

    /// Models driven by the mean kinetic temperature.
    pub fn is_mkt(self) -> bool {
        matches!(self, ModelKey::MktQ10 | ModelKey::MktArr)
    }
}

/// Equivalent time and remaining life for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticModelResult {
    pub model: ModelKey,
    pub equivalent_time_days: f64,
    pub remaining_life_days: f64,
    pub reduction_pct: f64,
}

/// Heuristic reliability score for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceScore {
    pub model: ModelKey,
    /// 0..=100.
    pub score: u8,
    /// At most three reasons, in trigger order.
    pub reasons: Vec<String>,
}

/// Where an estimate sits relative to the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasLabel {
    /// More remaining life than the consensus.
    Optimistic,
    Consensus,
    /// Less remaining life than the consensus.
    Conservative,
    /// No finite estimate.
    Undefined,
}

impl BiasLabel {
    pub fn display_name(self) -> &'static str {
        match self {
            BiasLabel::Optimistic => "optimistic",
            BiasLabel::Consensus => "consensus",
            BiasLabel::Conservative => "conservative",
            BiasLabel::Undefined => "undefined",
        }
    }
}

/// One row of the ranked model comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub model: ModelKey,
    pub rank: usize,
    pub rank_score: f64,
    pub remaining_life_days: f64,
    pub reduction_pct: f64,
    pub confidence: u8,
    pub agreement_score: f64,
    pub bias_label: BiasLabel,
}

/// Kinetic parameters shared by all six models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KineticsConfig {
    /// Reference temperature (°C).
    pub tref_c: f64,
    /// Baseline shelf life at the reference temperature (days).
    pub baseline_life_days: f64,
    pub q10: f64,
    /// Activation energy (J/mol).
    pub ea_j_per_mol: f64,
}

impl Default for KineticsConfig {
    fn default() -> Self {
        Self {
            tref_c: 5.0,
            baseline_life_days: 7.16,
            q10: 3.0,
            ea_j_per_mol: 90_000.0,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Exposure cutoff (°C).
    pub cutoff_c: f64,
    pub kinetics: KineticsConfig,
    /// Bucket width for the display series (hours).
    pub bucket_interval_hours: f64,
    /// Display-only y-axis tick step, echoed in exports.
    pub y_tick_step: Option<f64>,
    /// Seed for the risk-of-loss jitter.
    pub risk_seed: u64,
    pub risk_samples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cutoff_c: 5.0,
            kinetics: KineticsConfig::default(),
            bucket_interval_hours: 1.0,
            y_tick_step: None,
            risk_seed: 42,
            risk_samples: 500,
        }
    }
}

impl AnalysisConfig {
    /// Reject contract violations before any stage runs.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.cutoff_c.is_finite() {
            return Err(AppError::new(2, "Cutoff temperature must be finite."));
        }
        let k = &self.kinetics;
        if !k.tref_c.is_finite() || k.tref_c + KELVIN_OFFSET <= 0.0 {
            return Err(AppError::new(2, "Reference temperature must be finite and above absolute zero."));
        }
        if !(k.baseline_life_days.is_finite() && k.baseline_life_days >= 0.0) {
            return Err(AppError::new(2, "Baseline life must be finite and >= 0 days."));
        }
        if !(k.q10.is_finite() && k.q10 >= 0.0) {
            return Err(AppError::new(2, "Q10 must be finite and >= 0."));
        }
        if !(k.ea_j_per_mol.is_finite() && k.ea_j_per_mol >= 0.0) {
            return Err(AppError::new(2, "Activation energy must be finite and >= 0 J/mol."));
        }
        if !(self.bucket_interval_hours.is_finite() && self.bucket_interval_hours > 0.0) {
            return Err(AppError::new(2, "Bucket interval must be finite and > 0 hours."));
        }
        if self.risk_samples == 0 {
            return Err(AppError::new(2, "Risk sample count must be > 0."));
        }
        Ok(())
    }

    pub fn bucket_interval_ms(&self) -> f64 {
        self.bucket_interval_hours * MS_PER_HOUR
    }
}

/// A row-level problem encountered while turning raw rows into points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_keys_serialize_to_stable_names() {
        for key in ModelKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.key()));
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_contract_violations() {
        let mut config = AnalysisConfig::default();
        config.cutoff_c = f64::NAN;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        let mut config = AnalysisConfig::default();
        config.kinetics.baseline_life_days = -1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.kinetics.q10 = -0.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.kinetics.ea_j_per_mol = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn raw_values_deserialize_untagged() {
        let row: RawRecord =
            serde_json::from_str(r#"{"a": null, "b": 4.5, "c": "2024-01-01", "d": true}"#).unwrap();
        assert_eq!(row["a"], RawValue::Empty);
        assert_eq!(row["b"], RawValue::Number(4.5));
        assert_eq!(row["c"], RawValue::Text("2024-01-01".to_string()));
        assert_eq!(row["d"], RawValue::Bool(true));
    }
}
