//! Lap Cognitive Load Analysis
//!
//! Runs the full pipeline for one (vehicle, lap, segment count) request:
//! load → reconstruct → segment → metrics → fuse → insights, and joins the
//! fused segment values back onto every sample.
//!
//! Each call is independent. Nothing is cached or shared between requests.

pub mod output;
pub mod sections;
pub mod settings;

pub use output::{write_insights, write_rows, write_segments, InsightsReport, SegmentRow};
pub use sections::SectionTaxonomy;
pub use settings::AnalyzerConfig;

use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Utc};
use feature_engine::SegmentMetricEngine;
use load_index::{CliModel, FusedSegment, Insights};
use serde::Serialize;
use telemetry_loader::{
    load_lap, LapSignals, LoaderError, ScanReport, TelemetrySource, UnitDecisions,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use track_map::{segment_lap, TrackError, TrackReconstructor};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("Cannot segment {vehicle_id} lap {lap} from {source_name}: {source}")]
    Segmentation {
        vehicle_id: String,
        lap: i64,
        source_name: String,
        #[source]
        source: TrackError,
    },

    #[error("Segment count {requested} outside {min}..={max}")]
    SegmentCount {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Write failed: {0}")]
    Io(#[from] io::Error),
}

/// One sample of the analyzed lap with its segment's load
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapRow {
    pub timestamp: DateTime<Utc>,
    pub vehicle_id: String,
    pub lap: i64,
    pub segment_id: usize,
    pub section_id: usize,
    pub x: f64,
    pub y: f64,
    pub distance: f64,
    pub heading: f64,
    pub speed: f64,
    pub steering_angle: f64,
    pub throttle: f64,
    pub brake_pressure: f64,
    pub lat_accel: f64,
    pub long_accel: f64,
    #[serde(rename = "CLI")]
    pub cli: f64,
    #[serde(rename = "CLI_smooth")]
    pub cli_smooth: f64,
    pub steering_entropy: f64,
    pub throttle_jerk: f64,
    pub brake_panic: f64,
    pub lat_instability: f64,
    pub long_jerk: f64,
}

/// Result of analyzing one lap
#[derive(Debug, Clone)]
pub struct LapAnalysis {
    pub vehicle_id: String,
    pub lap: i64,
    pub num_segments: usize,
    pub total_distance: f64,
    /// One row per sample, in lap distance order
    pub rows: Vec<LapRow>,
    /// One entry per populated segment, ascending id
    pub segments: Vec<FusedSegment>,
    pub insights: Insights,
    pub units: UnitDecisions,
    pub scan: ScanReport,
}

/// Configured pipeline
pub struct LapAnalyzer {
    config: AnalyzerConfig,
    reconstructor: TrackReconstructor,
    engine: SegmentMetricEngine,
    model: CliModel,
}

impl LapAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            reconstructor: TrackReconstructor::new(config.geometry),
            engine: SegmentMetricEngine::new(config.metrics.clone()),
            model: CliModel::new(config.weights.clone()),
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn model(&self) -> &CliModel {
        &self.model
    }

    /// Analyze one lap. Fails as a whole: no partial result is returned.
    pub fn analyze<S>(
        &self,
        source: &S,
        vehicle_id: &str,
        lap: i64,
        num_segments: usize,
    ) -> Result<LapAnalysis, PipelineError>
    where
        S: TelemetrySource + ?Sized,
    {
        let LapSignals {
            frames, units, scan, ..
        } = load_lap(source, vehicle_id, lap, &self.config.loader)?;

        let samples = self.reconstructor.reconstruct(frames);
        let segmented =
            segment_lap(samples, num_segments).map_err(|source_err| PipelineError::Segmentation {
                vehicle_id: vehicle_id.to_string(),
                lap,
                source_name: source.name(),
                source: source_err,
            })?;

        let segment_metrics = self.engine.compute(&segmented);
        let segments = self.model.fuse(&segment_metrics);
        let insights = Insights::compute(&segments, &self.model, &self.config.insights);

        let by_id: BTreeMap<usize, &FusedSegment> =
            segments.iter().map(|f| (f.segment_id(), f)).collect();

        let rows: Vec<LapRow> = segmented
            .samples
            .iter()
            .filter_map(|s| {
                let fused = by_id.get(&s.segment_id)?;
                let signals = &s.sample.signals;
                let track = &s.sample.track;
                Some(LapRow {
                    timestamp: signals.timestamp,
                    vehicle_id: vehicle_id.to_string(),
                    lap,
                    segment_id: s.segment_id,
                    section_id: self
                        .config
                        .sections
                        .as_ref()
                        .map_or(s.segment_id, |sections| sections.section_of(track.distance)),
                    x: track.x,
                    y: track.y,
                    distance: track.distance,
                    heading: track.heading,
                    speed: signals.speed,
                    steering_angle: signals.steering_angle,
                    throttle: signals.throttle,
                    brake_pressure: signals.brake_pressure,
                    lat_accel: signals.lat_accel,
                    long_accel: signals.long_accel,
                    cli: fused.cli,
                    cli_smooth: fused.cli_smooth,
                    steering_entropy: fused.metrics.steering_entropy,
                    throttle_jerk: fused.metrics.throttle_jerk,
                    brake_panic: fused.metrics.brake_panic,
                    lat_instability: fused.metrics.lat_instability,
                    long_jerk: fused.metrics.long_jerk,
                })
            })
            .collect();

        metrics::counter!("laps_processed_total").increment(1);
        info!(
            "Analyzed {} lap {}: {} samples over {:.1} m in {} segments",
            vehicle_id,
            lap,
            rows.len(),
            segmented.total_distance,
            segments.len()
        );

        Ok(LapAnalysis {
            vehicle_id: vehicle_id.to_string(),
            lap,
            num_segments,
            total_distance: segmented.total_distance,
            rows,
            segments,
            insights,
            units,
            scan,
        })
    }
}

impl Default for LapAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

/// Analyze one lap with the default configuration
pub fn process<S>(
    source: &S,
    vehicle_id: &str,
    lap: i64,
    num_segments: usize,
) -> Result<LapAnalysis, PipelineError>
where
    S: TelemetrySource + ?Sized,
{
    LapAnalyzer::default().analyze(source, vehicle_id, lap, num_segments)
}

/// Initialize logging to stderr. `RUST_LOG` overrides the default level.
pub fn init_logging(
    verbose: bool,
    json: bool,
) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}
