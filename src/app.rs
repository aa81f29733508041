//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the log subscriber
//! - lists feed devices, or acquires points (upload, device feed, XML file,
//!   synthetic trace)
//! - runs the analysis pipeline
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, BatchArgs, Command, DemoArgs, DeviceArgs, DevicesArgs, ExportArgs, XmlArgs};
use crate::data::{DeviceFeedClient, generate_trace};
use crate::error::AppError;
use crate::report::AnalysisReport;

pub mod pipeline;

/// Entry point for the `shelf` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Devices(args) => handle_devices(args),
        Command::Device(args) => handle_device(args),
        Command::Xml(args) => handle_xml(args),
        Command::Batch(args) => handle_batch(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shelf_life={level}")));
    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = args.kinetics.to_config();
    let report = pipeline::analyze_file(&args.file, &config)?;
    emit(&report, &args.export)
}

fn handle_devices(args: DevicesArgs) -> Result<(), AppError> {
    let xml = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?,
        None => DeviceFeedClient::from_env()?.fetch_devices(args.children)?,
    };
    let devices = crate::io::parse_devices(&xml)?;
    info!(devices = devices.len(), "listed devices");

    if args.json {
        let json = serde_json::to_string_pretty(&devices)
            .map_err(|e| AppError::new(4, format!("Failed to encode device listing: {e}")))?;
        println!("{json}");
    } else {
        print!("{}", crate::report::format_device_list(&devices));
    }
    Ok(())
}

fn handle_device(args: DeviceArgs) -> Result<(), AppError> {
    let config = args.kinetics.to_config();
    config.validate()?;
    let client = DeviceFeedClient::from_env()?;
    let xml = client.fetch_recent(&args.id, args.hours)?;
    let source = format!("device {} (last {}h)", args.id, args.hours);
    let report = pipeline::analyze_feed_xml(&xml, Some(&args.id), source, &config)?;
    emit(&report, &args.export)
}

fn handle_xml(args: XmlArgs) -> Result<(), AppError> {
    let config = args.kinetics.to_config();
    let xml = std::fs::read_to_string(&args.file)
        .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", args.file.display())))?;
    let source = args.file.display().to_string();
    let report = pipeline::analyze_feed_xml(&xml, args.id.as_deref(), source, &config)?;
    emit(&report, &args.export)
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = args.kinetics.to_config();
    config.validate()?;

    let results = pipeline::analyze_batch(&args.files, &config);
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    for (path, result) in &results {
        println!("{}", crate::report::format_batch_line(&path.display().to_string(), result));
    }
    info!(files = results.len(), failed, "batch complete");

    if failed == results.len() {
        return Err(AppError::new(3, "No input in the batch could be analyzed."));
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = args.kinetics.to_config();
    let points = generate_trace(&args.to_synthetic())?;
    let mut report = pipeline::analyze_series(&points, &config)?;
    report.source = Some(format!("synthetic trace (seed {}, {}h)", args.seed, args.hours));
    emit(&report, &args.export)
}

/// Print the report and write any requested exports.
fn emit(report: &AnalysisReport, export: &ExportArgs) -> Result<(), AppError> {
    println!("{}", crate::report::format_report(report));

    if let Some(path) = &export.export_json {
        crate::io::export::write_report_json(path, report)?;
        log_export(path);
    }
    if let Some(path) = &export.export_csv {
        crate::io::export::write_comparison_csv(path, &report.ranking.rows)?;
        log_export(path);
    }
    Ok(())
}

fn log_export(path: &Path) {
    info!(path = %path.display(), "wrote export");
}
