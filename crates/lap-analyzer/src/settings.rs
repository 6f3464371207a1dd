//! Analyzer configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `COGNITIVE_LOAD__*` environment variables (`__` separates nesting, e.g.
//! `COGNITIVE_LOAD__WEIGHTS__STEERING_ENTROPY=0.5`).

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use feature_engine::MetricConfig;
use load_index::{FusionWeights, InsightsConfig};
use serde::{Deserialize, Serialize};
use telemetry_loader::LoaderConfig;
use track_map::VehicleGeometry;

use crate::sections::SectionTaxonomy;
use crate::PipelineError;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "COGNITIVE_LOAD";

/// Full pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub loader: LoaderConfig,
    pub geometry: VehicleGeometry,
    pub metrics: MetricConfig,
    pub weights: FusionWeights,
    pub insights: InsightsConfig,
    /// Segment count used when a request does not name one
    pub num_segments: usize,
    /// Smallest segment count accepted from the command line
    pub min_segments: usize,
    /// Largest segment count accepted from the command line
    pub max_segments: usize,
    /// Optional section start distances; without them section = segment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<SectionTaxonomy>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            geometry: VehicleGeometry::default(),
            metrics: MetricConfig::default(),
            weights: FusionWeights::default(),
            insights: InsightsConfig::default(),
            num_segments: 60,
            min_segments: 40,
            max_segments: 80,
            sections: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load defaults, overlaid by `file` (if given) and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Resolve a requested segment count against the configured bounds
    pub fn segment_count(&self, requested: Option<usize>) -> Result<usize, PipelineError> {
        let n = requested.unwrap_or(self.num_segments);
        if n < self.min_segments || n > self.max_segments {
            return Err(PipelineError::SegmentCount {
                requested: n,
                min: self.min_segments,
                max: self.max_segments,
            });
        }
        Ok(n)
    }
}
