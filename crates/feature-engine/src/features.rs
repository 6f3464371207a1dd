//! Segment Metric Assembly

use serde::{Deserialize, Serialize};
use tracing::debug;
use track_map::{SegmentedLap, SegmentedSample};

use crate::statistics::{mean, mean_abs_diff, mean_positive_diff, sample_std_dev, shannon_entropy};

/// Metric engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    /// Histogram bins for steering entropy
    pub entropy_bins: usize,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self { entropy_bins: 20 }
    }
}

/// Behavioral metrics of one lap segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetrics {
    pub segment_id: usize,
    /// Shannon entropy of the steering angle distribution (nats)
    pub steering_entropy: f64,
    /// Mean absolute throttle change per sample
    pub throttle_jerk: f64,
    /// Mean size of brake pressure increases
    pub brake_panic: f64,
    /// Standard deviation of lateral acceleration
    pub lat_instability: f64,
    /// Mean absolute longitudinal acceleration change per sample
    pub long_jerk: f64,
    /// Mean lap distance of the segment's samples
    pub avg_distance: f64,
    pub sample_count: usize,
}

/// Computes [`SegmentMetrics`] for every populated segment of a lap
pub struct SegmentMetricEngine {
    config: MetricConfig,
}

impl SegmentMetricEngine {
    /// Create a new metric engine
    pub fn new(config: MetricConfig) -> Self {
        Self { config }
    }

    /// One row per populated segment, ascending segment id. Segments without
    /// samples are skipped rather than zero-filled.
    pub fn compute(&self, lap: &SegmentedLap) -> Vec<SegmentMetrics> {
        let metrics: Vec<SegmentMetrics> = lap
            .segments()
            .into_iter()
            .map(|(segment_id, samples)| self.compute_segment(segment_id, samples))
            .collect();

        debug!(
            "Computed metrics for {} of {} segments",
            metrics.len(),
            lap.num_segments
        );
        metrics
    }

    /// Metrics of a single segment's samples, in lap order
    pub fn compute_segment(
        &self,
        segment_id: usize,
        samples: &[SegmentedSample],
    ) -> SegmentMetrics {
        let series =
            |f: fn(&SegmentedSample) -> f64| -> Vec<f64> { samples.iter().map(f).collect() };

        let steering = series(|s| s.sample.signals.steering_angle);
        let throttle = series(|s| s.sample.signals.throttle);
        let brake = series(|s| s.sample.signals.brake_pressure);
        let lat_accel = series(|s| s.sample.signals.lat_accel);
        let long_accel = series(|s| s.sample.signals.long_accel);
        let distance = series(|s| s.sample.track.distance);

        SegmentMetrics {
            segment_id,
            steering_entropy: shannon_entropy(&steering, self.config.entropy_bins),
            throttle_jerk: mean_abs_diff(&throttle),
            brake_panic: mean_positive_diff(&brake),
            lat_instability: sample_std_dev(&lat_accel),
            long_jerk: mean_abs_diff(&long_accel),
            avg_distance: mean(&distance),
            sample_count: samples.len(),
        }
    }
}

impl Default for SegmentMetricEngine {
    fn default() -> Self {
        Self::new(MetricConfig::default())
    }
}
