//! Formatted terminal output.
//!
//! Formatting lives here so the analytic stages stay free of presentation and
//! output changes stay local.

use crate::domain::ModelKey;
use crate::error::AppError;
use crate::io::DeviceInfo;
use crate::models::LegacyShelfRow;
use crate::report::AnalysisReport;
use crate::scoring::Ranking;

/// Formula block, printed verbatim.
pub const FORMULAS: [&str; 5] = [
    "t_eq = Σ(dt_i·RR(T_i))",
    "RR_Q10(T)=Q10^((T−Tref)/10)",
    "RR_Arr(T)=exp(−(Ea/R)·(1/T_K−1/Tref_K))",
    "T_MKT=−B/ln(Σ w_i·exp(−B/T_i_K))",
    "L_remaining=L_ref − t_eq",
];

/// Full textual report.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let cfg = &report.config;
    let k = &cfg.kinetics;

    out.push_str("=== shelf - Cold-Chain Shelf-Life Analysis ===\n");
    if let Some(source) = &report.source {
        out.push_str(&format!("Source: {source}\n"));
    }
    if let Some(columns) = &report.columns {
        out.push_str(&format!(
            "Columns: time={} | temperature={}\n",
            columns.time_column.as_deref().unwrap_or("-"),
            columns.temperature_column.as_deref().unwrap_or("-"),
        ));
    }

    out.push_str("\nInputs:\n");
    out.push_str(&format!("- cutoff   : {:.2} °C\n", cfg.cutoff_c));
    out.push_str(&format!("- Tref     : {:.2} °C\n", k.tref_c));
    out.push_str(&format!("- L_ref    : {:.2} d\n", k.baseline_life_days));
    out.push_str(&format!("- Q10      : {:.2}\n", k.q10));
    out.push_str(&format!("- Ea       : {:.0} J/mol\n", k.ea_j_per_mol));
    out.push_str(&format!("- R        : {} J/(mol·K)\n", crate::domain::GAS_CONSTANT));

    out.push_str("\nFormulas:\n");
    for f in FORMULAS {
        out.push_str(&format!("  {f}\n"));
    }

    let s = &report.summary;
    let e = &report.exposure;
    out.push_str("\nSummary:\n");
    out.push_str(&format!(
        "Points: n={} (dropped {}) | span={:.2}h | gap median={}h max={}h\n",
        s.point_count,
        s.dropped_points,
        s.span_hours,
        fmt_num(s.median_gap_hours, 2),
        fmt_num(s.max_gap_hours, 2),
    ));
    if !report.row_issues.is_empty() {
        out.push_str(&format!("Row issues: {}\n", report.row_issues.len()));
    }
    out.push_str(&format!(
        "Temp: min={} max={} avg={} σ={} °C\n",
        fmt_num(e.min_temp, 2),
        fmt_num(e.max_temp, 2),
        fmt_num(e.avg_temp, 2),
        fmt_num(s.temp_std_c, 2),
    ));
    out.push_str(&format!(
        "Exposure: {:.2}h of {:.2}h above cutoff ({:.1}%) | excursions={} | longest streak={:.2}h\n",
        e.hours_above, e.total_hours, e.pct_above, e.excursions, e.longest_streak_hrs,
    ));
    out.push_str(&format!(
        "Kinetics: total={:.3}d | MKT={} °C | risk of loss={}%\n",
        report.kinetics.total_days,
        report.kinetics.mkt_c.map_or_else(|| "n/a".to_string(), |m| format!("{m:.2}")),
        fmt_num(report.kinetics.risk_of_loss_pct, 1),
    ));

    out.push_str("\nEquivalent time (t_eq):\n");
    for r in &report.kinetics.results {
        out.push_str(&format!(
            "- {:<22} {:>8} d\n",
            r.model.display_name(),
            fmt_num(r.equivalent_time_days, 3)
        ));
    }

    out.push_str("\nRemaining life (L_remaining):\n");
    for r in &report.kinetics.results {
        out.push_str(&format!(
            "- {:<22} {:>8} d  ({} % reduction)\n",
            r.model.display_name(),
            fmt_num(r.remaining_life_days, 3),
            fmt_num(r.reduction_pct, 1),
        ));
    }

    out.push('\n');
    out.push_str(&format_comparison(&report.ranking));
    out.push('\n');
    out.push_str(&format_confidence_reasons(report));
    out.push('\n');
    out.push_str(&format_legacy_table(&report.legacy_table));

    out
}

/// Ranked comparison table followed by the rationale.
pub fn format_comparison(ranking: &Ranking) -> String {
    let mut out = String::new();
    out.push_str("Model comparison:\n");
    out.push_str(
        format!(
            "{:<4} {:<22} {:>8} {:>10} {:>10} {:>5} {:>9} {:<12}\n",
            "rank", "model", "score", "remain_d", "reduct_%", "conf", "agree", "bias"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<22} {:-<8} {:-<10} {:-<10} {:-<5} {:-<9} {:-<12}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for row in &ranking.rows {
        out.push_str(
            format!(
                "{:<4} {:<22} {:>8.2} {:>10} {:>10} {:>5} {:>9.1} {:<12}\n",
                row.rank,
                truncate(row.model.display_name(), 22),
                row.rank_score,
                fmt_num(row.remaining_life_days, 3),
                fmt_num(row.reduction_pct, 1),
                row.confidence,
                row.agreement_score,
                row.bias_label.display_name(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out.push_str(&format!(
        "Consensus: {} d | spread: {} % of baseline\n",
        fmt_num(ranking.consensus_days, 3),
        fmt_num(ranking.spread_pct, 1),
    ));
    out.push_str(&ranking.rationale);
    out.push('\n');
    out
}

fn format_confidence_reasons(report: &AnalysisReport) -> String {
    let mut out = String::from("Confidence notes:\n");
    for key in ModelKey::ALL {
        let Some(c) = report.confidence_for(key) else {
            continue;
        };
        out.push_str(&format!(
            "- {:<22} {:>3}: {}\n",
            key.display_name(),
            c.score,
            c.reasons.join("; ")
        ));
    }
    out
}

/// Legacy hours-above sensitivity table.
pub fn format_legacy_table(rows: &[LegacyShelfRow]) -> String {
    let mut out = String::new();
    out.push_str("Legacy exposure sensitivity (threshold line):\n");
    out.push_str(
        format!(
            "{:>8} {:>10} {:>10} {:>10} {:>10}\n",
            "hours>", "shelf_d", "remain_%", "reduct_%", "risk_%"
        )
        .trim_end(),
    );
    out.push('\n');
    for r in rows {
        let marker = if r.observed { " <- observed" } else { "" };
        out.push_str(&format!(
            "{:>8.2} {:>10.2} {:>10} {:>10} {:>10}{marker}\n",
            r.hours_above,
            r.shelf_life_days,
            fmt_num(r.remaining_pct, 1),
            fmt_num(r.reduction_pct, 1),
            fmt_num(r.risk_of_loss_pct, 1),
        ));
    }
    out
}

/// One summary line per batch input.
pub fn format_batch_line(label: &str, result: &Result<AnalysisReport, AppError>) -> String {
    match result {
        Ok(report) => {
            let top = report.ranking.top();
            format!(
                "{label}: n={} above={:.1}% exc={} top={} remaining={} d conf={}",
                report.summary.point_count,
                report.exposure.pct_above,
                report.exposure.excursions,
                top.map_or("-", |r| r.model.key()),
                top.map_or_else(|| "n/a".to_string(), |r| fmt_num(r.remaining_life_days, 2)),
                top.map_or(0, |r| r.confidence),
            )
        }
        Err(err) => format!("{label}: error (exit {}): {}", err.exit_code(), err.message()),
    }
}

/// Device listing table, one logger per line.
pub fn format_device_list(devices: &[DeviceInfo]) -> String {
    if devices.is_empty() {
        return "No devices listed.\n".to_string();
    }
    let mut out = format!(
        "{:<12} {:<5} {:<24} {:<16} {:>8} {:>8} {:>8}\n",
        "id", "type", "label", "org", "min °C", "max °C", "battery"
    );
    for d in devices {
        out.push_str(&format!(
            "{:<12} {:<5} {:<24} {:<16} {:>8} {:>8} {:>8}\n",
            truncate(d.id.as_deref().unwrap_or("-"), 12),
            d.device_type,
            truncate(d.label.as_deref().unwrap_or("-"), 24),
            truncate(d.org.as_deref().unwrap_or("-"), 16),
            opt_num(d.min_temp_c, 1),
            opt_num(d.max_temp_c, 1),
            opt_num(d.battery, 0),
        ));
    }
    out
}

fn opt_num(v: Option<f64>, decimals: usize) -> String {
    v.map_or_else(|| "-".to_string(), |v| fmt_num(v, decimals))
}

fn fmt_num(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "n/a".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
