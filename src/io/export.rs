//! Export analysis results to JSON and CSV.
//!
//! JSON carries the full report; CSV carries only the ranked comparison rows
//! so it opens cleanly in a spreadsheet.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::ComparisonRow;
use crate::error::AppError;
use crate::report::AnalysisReport;

/// Write the full report as pretty JSON.
pub fn write_report_json(path: &Path, report: &AnalysisReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ComparisonCsvRow<'a> {
    rank: usize,
    model: &'a str,
    rank_score: String,
    remaining_life_days: String,
    reduction_pct: String,
    confidence: u8,
    agreement_score: String,
    bias: &'a str,
}

impl<'a> From<&'a ComparisonRow> for ComparisonCsvRow<'a> {
    fn from(row: &'a ComparisonRow) -> Self {
        Self {
            rank: row.rank,
            model: row.model.key(),
            rank_score: fmt_cell(row.rank_score, 4),
            remaining_life_days: fmt_cell(row.remaining_life_days, 4),
            reduction_pct: fmt_cell(row.reduction_pct, 2),
            confidence: row.confidence,
            agreement_score: fmt_cell(row.agreement_score, 2),
            bias: row.bias_label.display_name(),
        }
    }
}

/// Write the ranked comparison rows as CSV.
pub fn write_comparison_csv(path: &Path, rows: &[ComparisonRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_comparison_rows(file, rows)
}

/// CSV body for any writer.
pub fn write_comparison_rows<W: Write>(writer: W, rows: &[ComparisonRow]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(ComparisonCsvRow::from(row))
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    csv.flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))?;
    Ok(())
}

/// Undefined values are written as empty cells.
fn fmt_cell(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BiasLabel, ModelKey};

    #[test]
    fn comparison_csv_has_header_and_blank_nan() {
        let rows = [
            ComparisonRow {
                model: ModelKey::Q10Int,
                rank: 1,
                rank_score: 104.15,
                remaining_life_days: 5.16,
                reduction_pct: 27.93,
                confidence: 93,
                agreement_score: 100.0,
                bias_label: BiasLabel::Consensus,
            },
            ComparisonRow {
                model: ModelKey::MktArr,
                rank: 2,
                rank_score: 5.0,
                remaining_life_days: f64::NAN,
                reduction_pct: f64::NAN,
                confidence: 0,
                agreement_score: 0.0,
                bias_label: BiasLabel::Undefined,
            },
        ];
        let mut buf = Vec::new();
        write_comparison_rows(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "rank,model,rank_score,remaining_life_days,reduction_pct,confidence,agreement_score,bias"
        );
        assert_eq!(lines[1], "1,q10int,104.1500,5.1600,27.93,93,100.00,consensus");
        assert_eq!(lines[2], "2,mktarr,5.0000,,,0,0.00,undefined");
    }
}
