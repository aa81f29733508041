//! Command-line parsing for the shelf-life analyzer.
//!
//! Argument parsing and defaults live here, away from the analytic code.
//! Kinetics parameters can also come from the environment (or a `.env` file,
//! loaded before parsing).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::data::{DEFAULT_WINDOW_HOURS, SyntheticConfig};
use crate::domain::{AnalysisConfig, KineticsConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Cold-chain exposure and remaining shelf-life analysis")]
pub struct Cli {
    /// Log pipeline stages to stderr (`RUST_LOG` overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a CSV or JSON upload and print the full report.
    Analyze(AnalyzeArgs),
    /// List the devices visible to the configured feed account.
    Devices(DevicesArgs),
    /// Fetch a device's recent measurements from the feed and analyze them.
    Device(DeviceArgs),
    /// Analyze a saved device-feed XML document.
    Xml(XmlArgs),
    /// Analyze many uploads in parallel, one summary line each.
    Batch(BatchArgs),
    /// Analyze a synthetic logger trace.
    Demo(DemoArgs),
}

/// Kinetic and exposure parameters shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct KineticsArgs {
    /// Exposure cutoff temperature (°C).
    #[arg(long, env = "SHELF_CUTOFF_C", default_value_t = 5.0, allow_negative_numbers = true)]
    pub cutoff: f64,

    /// Reference temperature (°C).
    #[arg(long, env = "SHELF_TREF_C", default_value_t = 5.0, allow_negative_numbers = true)]
    pub tref: f64,

    /// Baseline shelf life at the reference temperature (days).
    #[arg(long = "baseline-days", env = "SHELF_BASELINE_DAYS", default_value_t = 7.16)]
    pub baseline_days: f64,

    /// Q10 factor (rate change per 10 °C).
    #[arg(long, env = "SHELF_Q10", default_value_t = 3.0)]
    pub q10: f64,

    /// Activation energy (J/mol).
    #[arg(long, env = "SHELF_EA", default_value_t = 90_000.0)]
    pub ea: f64,

    /// Bucket width for the display series (hours).
    #[arg(long = "bucket-hours", default_value_t = 1.0)]
    pub bucket_hours: f64,

    /// Display-only y-axis tick step, echoed in the JSON export.
    #[arg(long = "y-tick")]
    pub y_tick: Option<f64>,

    /// Seed for the risk-of-loss jitter.
    #[arg(long = "risk-seed", default_value_t = 42)]
    pub risk_seed: u64,

    /// Samples drawn for the risk-of-loss jitter.
    #[arg(long = "risk-samples", default_value_t = 500)]
    pub risk_samples: usize,
}

impl KineticsArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            cutoff_c: self.cutoff,
            kinetics: KineticsConfig {
                tref_c: self.tref,
                baseline_life_days: self.baseline_days,
                q10: self.q10,
                ea_j_per_mol: self.ea,
            },
            bucket_interval_hours: self.bucket_hours,
            y_tick_step: self.y_tick,
            risk_seed: self.risk_seed,
            risk_samples: self.risk_samples,
        }
    }
}

/// Report exports.
#[derive(Debug, Args, Clone, Default)]
pub struct ExportArgs {
    /// Write the full report as JSON.
    #[arg(long = "export-json", value_name = "PATH")]
    pub export_json: Option<PathBuf>,

    /// Write the ranked comparison rows as CSV.
    #[arg(long = "export-csv", value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// CSV or JSON (`.json`) upload.
    pub file: PathBuf,

    #[command(flatten)]
    pub kinetics: KineticsArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DevicesArgs {
    /// Include (`true`) or exclude (`false`) sub-account devices.
    #[arg(long)]
    pub children: Option<bool>,

    /// Read a saved listing XML instead of calling the feed.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Print the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct DeviceArgs {
    /// Device id in the feed.
    #[arg(long)]
    pub id: String,

    /// Look-back window (hours).
    #[arg(long, default_value_t = DEFAULT_WINDOW_HOURS)]
    pub hours: u32,

    #[command(flatten)]
    pub kinetics: KineticsArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Debug, Args, Clone)]
pub struct XmlArgs {
    /// Device-feed XML document.
    pub file: PathBuf,

    /// Only analyze this device.
    #[arg(long)]
    pub id: Option<String>,

    #[command(flatten)]
    pub kinetics: KineticsArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// CSV or JSON uploads.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub kinetics: KineticsArgs,
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    /// Trace seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Trace length (hours).
    #[arg(long, default_value_t = 48.0)]
    pub hours: f64,

    /// Sample interval (minutes).
    #[arg(long = "interval-min", default_value_t = 15.0)]
    pub interval_minutes: f64,

    /// Number of door-open excursions.
    #[arg(long, default_value_t = 3)]
    pub excursions: usize,

    #[command(flatten)]
    pub kinetics: KineticsArgs,

    #[command(flatten)]
    pub export: ExportArgs,
}

impl DemoArgs {
    pub fn to_synthetic(&self) -> SyntheticConfig {
        SyntheticConfig {
            seed: self.seed,
            hours: self.hours,
            interval_minutes: self.interval_minutes,
            excursions: self.excursions,
            ..SyntheticConfig::default()
        }
    }
}
