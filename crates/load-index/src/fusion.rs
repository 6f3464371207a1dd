//! Metric Fusion
//!
//! Each metric is min-max normalized across the lap's segments, combined as a
//! weighted sum, then smoothed with a centered 3-segment moving average.

use feature_engine::SegmentMetrics;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{FusionWeights, Metric};

/// Segments averaged by the smoothing window
pub const SMOOTHING_WINDOW: usize = 3;

/// Segment metrics with their normalized values and fused load
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusedSegment {
    pub metrics: SegmentMetrics,
    pub norm_steering: f64,
    pub norm_throttle: f64,
    pub norm_brake: f64,
    pub norm_lat: f64,
    pub norm_long_jerk: f64,
    /// Weighted composite load
    #[serde(rename = "CLI")]
    pub cli: f64,
    /// Centered moving average of `cli`
    #[serde(rename = "CLI_smooth")]
    pub cli_smooth: f64,
}

impl FusedSegment {
    /// Segment id
    pub fn segment_id(&self) -> usize {
        self.metrics.segment_id
    }

    /// Normalized value of a metric
    pub fn norm(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SteeringEntropy => self.norm_steering,
            Metric::ThrottleJerk => self.norm_throttle,
            Metric::BrakePanic => self.norm_brake,
            Metric::LatInstability => self.norm_lat,
            Metric::LongJerk => self.norm_long_jerk,
        }
    }
}

/// Min-max normalize to [0, 1]. A constant series maps to all zeros.
pub fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 || !range.is_finite() {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / range).collect()
}

/// Centered moving average whose window shrinks at both ends instead of
/// requiring full width (minimum one value).
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let half = window.max(1) / 2;
    let n = values.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let slice = &values[lo..=hi];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Weighted fusion of segment metrics into the Cognitive Load Index
pub struct CliModel {
    weights: FusionWeights,
}

impl CliModel {
    /// Create a model with the given weights
    pub fn new(weights: FusionWeights) -> Self {
        Self { weights }
    }

    /// Weights in use
    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    /// Fuse a lap's segment metrics, ordered by segment id
    pub fn fuse(&self, metrics: &[SegmentMetrics]) -> Vec<FusedSegment> {
        let norms: Vec<Vec<f64>> = Metric::ALL
            .iter()
            .map(|metric| {
                let raw: Vec<f64> = metrics.iter().map(|m| metric.value(m)).collect();
                min_max_normalize(&raw)
            })
            .collect();

        let cli: Vec<f64> = (0..metrics.len())
            .map(|i| {
                Metric::ALL
                    .iter()
                    .zip(&norms)
                    .map(|(metric, norm)| self.weights.weight(*metric) * norm[i])
                    .sum()
            })
            .collect();

        let smooth = centered_moving_average(&cli, SMOOTHING_WINDOW);

        let fused: Vec<FusedSegment> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| FusedSegment {
                metrics: *m,
                norm_steering: norms[0][i],
                norm_throttle: norms[1][i],
                norm_brake: norms[2][i],
                norm_lat: norms[3][i],
                norm_long_jerk: norms[4][i],
                cli: cli[i],
                cli_smooth: smooth[i],
            })
            .collect();

        debug!("Fused {} segments", fused.len());
        fused
    }

    /// Metric whose normalized value times attribution weight is largest.
    /// Ties go to the earliest metric in [`Metric::ALL`].
    pub fn primary_cause(&self, segment: &FusedSegment) -> Metric {
        let mut best = Metric::ALL[0];
        let mut best_score = f64::NEG_INFINITY;
        for metric in Metric::ALL {
            let score = segment.norm(metric) * self.weights.attribution_weight(metric);
            if score > best_score {
                best = metric;
                best_score = score;
            }
        }
        best
    }
}

impl Default for CliModel {
    fn default() -> Self {
        Self::new(FusionWeights::default())
    }
}
