//! Cognitive Load Analysis - Command Line Entry Point

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use lap_analyzer::{
    init_logging, write_insights, write_rows, write_segments, AnalyzerConfig, LapAnalyzer,
};
use load_index::SegmentLoad;
use telemetry_loader::{available_laps, available_vehicles, locate_telemetry, FileSource};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Driver cognitive load analysis from lap telemetry",
    long_about = None
)]
struct Cli {
    /// Telemetry CSV file (takes precedence over --data-dir)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    telemetry: Option<PathBuf>,

    /// Directory searched for a *telemetry_data.csv file
    #[arg(long, global = true, default_value = "data", value_hint = ValueHint::DirPath)]
    data_dir: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List vehicle ids present in the telemetry
    Vehicles,
    /// List laps recorded for a vehicle
    Laps(LapsArgs),
    /// Compute the cognitive load of one lap
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
struct LapsArgs {
    /// Vehicle id
    #[arg(long)]
    vehicle: String,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Vehicle id
    #[arg(long)]
    vehicle: String,

    /// Lap number
    #[arg(long)]
    lap: i64,

    /// Number of equal-distance segments (defaults to the configured count)
    #[arg(long)]
    segments: Option<usize>,

    /// Per-sample CSV output path
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Per-segment CSV output path
    #[arg(long, value_hint = ValueHint::FilePath)]
    segment_table: Option<PathBuf>,

    /// Insights JSON output path
    #[arg(long, value_hint = ValueHint::FilePath)]
    insights: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs).context("Failed to set tracing subscriber")?;

    info!("=== Cognitive Load Analysis v{} ===", env!("CARGO_PKG_VERSION"));

    let config =
        AnalyzerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let telemetry = match &cli.telemetry {
        Some(path) => path.clone(),
        None => locate_telemetry(&cli.data_dir)
            .with_context(|| format!("No telemetry found under {}", cli.data_dir.display()))?,
    };
    info!("Telemetry: {}", telemetry.display());
    let source = FileSource::new(&telemetry);

    match cli.command {
        Command::Vehicles => {
            let vehicles = available_vehicles(&source, &config.loader.scan)
                .context("Failed to list vehicles")?;
            if vehicles.is_empty() {
                warn!("No vehicles found in {}", telemetry.display());
            }
            for vehicle in vehicles {
                println!("{vehicle}");
            }
        }
        Command::Laps(args) => {
            let laps = available_laps(&source, &args.vehicle, &config.loader.scan)
                .with_context(|| format!("Failed to list laps of {}", args.vehicle))?;
            if laps.is_empty() {
                warn!("No laps found for {}", args.vehicle);
            }
            for lap in laps {
                println!("{lap}");
            }
        }
        Command::Analyze(args) => handle_analyze(args, config, &source)?,
    }

    Ok(())
}

fn handle_analyze(args: AnalyzeArgs, config: AnalyzerConfig, source: &FileSource) -> Result<()> {
    let num_segments = config.segment_count(args.segments)?;
    let analyzer = LapAnalyzer::new(config);
    let analysis = analyzer
        .analyze(source, &args.vehicle, args.lap, num_segments)
        .with_context(|| format!("Failed to analyze {} lap {}", args.vehicle, args.lap))?;

    if analysis.scan.malformed > 0 {
        warn!(
            "Skipped {} malformed rows of {}",
            analysis.scan.malformed, analysis.scan.rows_read
        );
    }

    let insights = &analysis.insights;
    println!(
        "Vehicle {} lap {} ({} segments, {:.0} m)",
        analysis.vehicle_id, analysis.lap, num_segments, analysis.total_distance
    );
    println!("Max CLI:            {:.2}", insights.max_cli);
    println!("Avg CLI:            {:.2}", insights.avg_cli);
    match insights.max_stress_segment {
        Some(id) => println!("Max stress segment: #{id}"),
        None => println!("Max stress segment: -"),
    }
    println!("Primary stressor:   {}", insights.dominant_stressor_label());
    println!();
    println!("Highest load segments:");
    for s in &insights.top_high {
        print_segment(s);
    }
    println!("Lowest load segments:");
    for s in &insights.top_low {
        print_segment(s);
    }

    if let Some(path) = &args.output {
        write_rows(create(path)?, &analysis.rows)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} rows to {}", analysis.rows.len(), path.display());
    }
    if let Some(path) = &args.segment_table {
        write_segments(create(path)?, &analysis)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} segments to {}", analysis.segments.len(), path.display());
    }
    if let Some(path) = &args.insights {
        write_insights(create(path)?, &analysis)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote insights to {}", path.display());
    }

    Ok(())
}

fn print_segment(s: &SegmentLoad) {
    println!(
        "  #{:<3} {:>8.1} m  CLI {:.3}  {}",
        s.segment_id, s.avg_distance, s.cli_smooth, s.primary_cause
    );
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}
