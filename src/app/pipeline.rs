//! Shared analysis pipeline used by every subcommand.
//!
//! The whole analysis is one pure function of `(points, config)`:
//! intervals -> sampling summary -> exposure -> buckets -> kinetics ->
//! confidence -> ranking. The front-ends only differ in where the points come
//! from and how the report is printed.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{AnalysisConfig, RawTable, SeriesPoint};
use crate::error::AppError;
use crate::exposure::{bucket_means, compute_exposure};
use crate::io::{extract_series, load_table, measurements_to_points, parse_measurements};
use crate::models::{compute_models, legacy_shelf_table};
use crate::normalize::{prepare_intervals, summarize_sampling};
use crate::report::AnalysisReport;
use crate::scoring::{ScoringInputs, rank_models, score_models};

/// Run every analytic stage over one series.
///
/// Data-quality problems never fail here; only a config that violates the
/// input contract is rejected.
pub fn analyze_series(points: &[SeriesPoint], config: &AnalysisConfig) -> Result<AnalysisReport, AppError> {
    config.validate()?;

    let intervals = prepare_intervals(points);
    let summary = summarize_sampling(points, &intervals);
    debug!(
        points = points.len(),
        valid = summary.point_count,
        intervals = intervals.intervals.len(),
        "prepared series"
    );
    if summary.point_count < 2 {
        warn!(valid = summary.point_count, "fewer than two valid points; results are empty");
    }

    let exposure = compute_exposure(points, config.cutoff_c);
    let buckets = bucket_means(points, config.bucket_interval_ms());
    let kinetics = compute_models(&intervals, exposure.avg_temp, config);

    let inputs = ScoringInputs::gather(
        &summary,
        &exposure,
        &kinetics,
        config.cutoff_c,
        config.kinetics.baseline_life_days,
    );
    let confidence = score_models(&kinetics.results, &inputs);
    let ranking = rank_models(&kinetics.results, &confidence, &inputs);
    let legacy_table = legacy_shelf_table(
        exposure.hours_above,
        config.kinetics.baseline_life_days,
        config.risk_samples,
        config.risk_seed,
    );

    if let Some(top) = ranking.top() {
        info!(
            model = top.model.key(),
            remaining_days = top.remaining_life_days,
            confidence = top.confidence,
            "analysis complete"
        );
    }

    Ok(AnalysisReport {
        source: None,
        config: config.clone(),
        columns: None,
        row_issues: Vec::new(),
        summary,
        exposure,
        buckets,
        kinetics,
        confidence,
        ranking,
        legacy_table,
    })
}

/// Classify, extract and analyze an uploaded table.
pub fn analyze_table(table: &RawTable, config: &AnalysisConfig) -> Result<AnalysisReport, AppError> {
    let series = extract_series(table);
    let mut report = analyze_series(&series.points, config)?;
    report.columns = Some(series.columns);
    report.row_issues = series.row_issues;
    Ok(report)
}

/// Analyze a CSV/JSON upload from disk.
///
/// Unlike the pure stages this refuses a file with no usable points, since the
/// caller asked for a report on it.
pub fn analyze_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport, AppError> {
    let ingested = load_table(path)?;
    let mut report = analyze_table(&ingested.table, config)?;
    ensure_points(&report, path)?;

    let mut issues = ingested.row_issues;
    issues.append(&mut report.row_issues);
    issues.sort_by_key(|i| i.row);
    report.row_issues = issues;
    report.source = Some(path.display().to_string());
    Ok(report)
}

/// Analyze a device-feed XML document.
pub fn analyze_feed_xml(
    xml: &str,
    device_id: Option<&str>,
    source: String,
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AppError> {
    let measurements = parse_measurements(xml, device_id)?;
    let points = measurements_to_points(&measurements);
    let dropped = measurements.len() - points.len();
    if dropped > 0 {
        warn!(dropped, "dropped measurements without a utc timestamp");
    }

    let mut report = analyze_series(&points, config)?;
    report.source = Some(source);
    ensure_points(&report, Path::new(report.source_label()))?;
    Ok(report)
}

/// Analyze many files in parallel; results keep the input order.
pub fn analyze_batch(
    paths: &[PathBuf],
    config: &AnalysisConfig,
) -> Vec<(PathBuf, Result<AnalysisReport, AppError>)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), analyze_file(path, config)))
        .collect()
}

fn ensure_points(report: &AnalysisReport, source: &Path) -> Result<(), AppError> {
    if report.summary.point_count < 2 {
        return Err(AppError::new(
            3,
            format!(
                "'{}' has {} valid point(s); at least 2 are needed for a report.",
                source.display(),
                report.summary.point_count
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKey;

    const HOUR: i64 = 3_600_000;

    #[test]
    fn constant_series_report() {
        let points: Vec<SeriesPoint> = (0..=48).map(|h| SeriesPoint::new(h * HOUR, Some(5.0))).collect();
        let report = analyze_series(&points, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.summary.point_count, 49);
        assert!((report.exposure.pct_above - 100.0).abs() < 1e-9);
        let q10 = report.kinetics.result(ModelKey::Q10Int).unwrap();
        assert!((q10.equivalent_time_days - 2.0).abs() < 1e-9);
        assert!((q10.remaining_life_days - 5.16).abs() < 1e-9);
        assert_eq!(report.ranking.rows.len(), 6);
        assert_eq!(report.confidence.len(), 6);
    }

    #[test]
    fn empty_series_is_not_an_error() {
        let report = analyze_series(&[], &AnalysisConfig::default()).unwrap();
        assert_eq!(report.summary.point_count, 0);
        assert_eq!(report.exposure.total_hours, 0.0);
        assert!(report.buckets.is_empty());
        assert_eq!(report.ranking.rows.len(), 6);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AnalysisConfig {
            cutoff_c: f64::NAN,
            ..AnalysisConfig::default()
        };
        let err = analyze_series(&[], &config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn identical_inputs_give_identical_reports() {
        let points: Vec<SeriesPoint> = (0..30)
            .map(|i| SeriesPoint::new(i * HOUR / 2, Some(2.0 + (i % 7) as f64)))
            .collect();
        let config = AnalysisConfig::default();
        let a = serde_json::to_string(&analyze_series(&points, &config).unwrap()).unwrap();
        let b = serde_json::to_string(&analyze_series(&points, &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn feed_without_points_is_insufficient_data() {
        let xml = "<devices><tdl><id>1</id><ms></ms></tdl></devices>";
        let err = analyze_feed_xml(xml, None, "feed.xml".into(), &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
