//! Analysis report: everything one pipeline invocation produces.

use serde::Serialize;

use crate::domain::{AnalysisConfig, ConfidenceScore, ExposureReport, ModelKey, RowIssue};
use crate::exposure::Bucket;
use crate::models::{KineticsSummary, LegacyShelfRow};
use crate::normalize::{ColumnChoice, SeriesSummary};
use crate::scoring::Ranking;

pub mod format;

pub use format::*;

/// All computed outputs of a single analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// File name, device id or other label of the input.
    pub source: Option<String>,
    pub config: AnalysisConfig,
    /// Detected columns, for tabular inputs.
    pub columns: Option<ColumnChoice>,
    /// Rows dropped or degraded during ingest.
    pub row_issues: Vec<RowIssue>,
    pub summary: SeriesSummary,
    pub exposure: ExposureReport,
    pub buckets: Vec<Bucket>,
    pub kinetics: KineticsSummary,
    pub confidence: Vec<ConfidenceScore>,
    pub ranking: Ranking,
    pub legacy_table: Vec<LegacyShelfRow>,
}

impl AnalysisReport {
    pub fn confidence_for(&self, key: ModelKey) -> Option<&ConfidenceScore> {
        self.confidence.iter().find(|c| c.model == key)
    }

    /// Label used in batch output and logs.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("<series>")
    }
}
