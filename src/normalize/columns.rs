//! Time/temperature column inference for uploaded tables.
//!
//! Both detectors score every header on a sample of the first rows and keep
//! the strictly highest score (first header wins ties).
//!
//! - time: `+2` for a time-like header name, `+1` per sampled cell that parses
//!   as a timestamp
//! - temperature: `+2` for a temperature-like header name, plus
//!   `5 × fraction of sampled cells that are finite numbers`

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::domain::{RawRecord, RawTable, RawValue};
use crate::normalize::timestamp::parse_timestamp_ms;

/// Rows inspected per header.
pub const CLASSIFY_SAMPLE_ROWS: usize = 200;

const NAME_BONUS: f64 = 2.0;
const NUMERIC_WEIGHT: f64 = 5.0;

static TIME_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)time|timestamp|date|datetime").expect("static regex"));

static TEMP_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)temp|temperature|degc|celsius").expect("static regex"));

/// Score of a single header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnScore {
    pub header: String,
    pub score: f64,
}

/// Detected columns together with the scores that produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnChoice {
    pub time_column: Option<String>,
    pub temperature_column: Option<String>,
    pub time_scores: Vec<ColumnScore>,
    pub temperature_scores: Vec<ColumnScore>,
}

/// Finite numeric value of a temperature cell.
pub fn parse_temperature(value: &RawValue) -> Option<f64> {
    match value {
        RawValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
        RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        RawValue::Empty | RawValue::Bool(_) | RawValue::DateTime(_) => None,
    }
}

pub fn score_time_columns(headers: &[String], rows: &[RawRecord]) -> Vec<ColumnScore> {
    let sample = sample_rows(rows);
    headers
        .iter()
        .map(|h| {
            let mut score = if TIME_HEADER.is_match(h) { NAME_BONUS } else { 0.0 };
            score += sample
                .iter()
                .filter(|r| parse_timestamp_ms(RawTable::cell(r, h)).is_some())
                .count() as f64;
            ColumnScore {
                header: h.clone(),
                score,
            }
        })
        .collect()
}

pub fn score_temperature_columns(headers: &[String], rows: &[RawRecord]) -> Vec<ColumnScore> {
    let sample = sample_rows(rows);
    headers
        .iter()
        .map(|h| {
            let mut score = if TEMP_HEADER.is_match(h) { NAME_BONUS } else { 0.0 };
            if !sample.is_empty() {
                let numeric = sample
                    .iter()
                    .filter(|r| parse_temperature(RawTable::cell(r, h)).is_some())
                    .count();
                score += NUMERIC_WEIGHT * numeric as f64 / sample.len() as f64;
            }
            ColumnScore {
                header: h.clone(),
                score,
            }
        })
        .collect()
}

/// Detect the time and temperature columns of a table.
pub fn classify_columns(table: &RawTable) -> ColumnChoice {
    let time_scores = score_time_columns(&table.headers, &table.rows);
    let temperature_scores = score_temperature_columns(&table.headers, &table.rows);

    let time_column = pick_best(&time_scores).or_else(|| table.headers.first().cloned());
    let temperature_column = pick_best(&temperature_scores);

    ColumnChoice {
        time_column,
        temperature_column,
        time_scores,
        temperature_scores,
    }
}

fn sample_rows(rows: &[RawRecord]) -> &[RawRecord] {
    &rows[..rows.len().min(CLASSIFY_SAMPLE_ROWS)]
}

fn pick_best(scores: &[ColumnScore]) -> Option<String> {
    let mut best: Option<&ColumnScore> = None;
    for s in scores {
        if best.is_none_or(|b| s.score > b.score) {
            best = Some(s);
        }
    }
    best.map(|s| s.header.clone())
}
