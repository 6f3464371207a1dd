//! Segment Feature Engine
//!
//! Behavioral metrics computed per lap segment from the raw per-sample
//! signals: steering entropy, throttle jerk, brake panic, lateral
//! instability and longitudinal jerk.

mod features;
mod statistics;

pub use features::{MetricConfig, SegmentMetricEngine, SegmentMetrics};
pub use statistics::{mean, mean_abs_diff, mean_positive_diff, sample_std_dev, shannon_entropy};
