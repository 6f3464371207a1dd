//! Cognitive Load Index
//!
//! Fuses per-segment behavioral metrics into a single [0, 1] load score,
//! smooths it along the lap and attributes each segment's load to the metric
//! contributing most.

pub mod config;
pub mod fusion;
pub mod insights;

pub use config::{FusionWeights, InsightsConfig, Metric};
pub use fusion::{centered_moving_average, min_max_normalize, CliModel, FusedSegment};
pub use insights::{Insights, SegmentLoad};
