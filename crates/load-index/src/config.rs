//! Fusion and insight configuration

use std::fmt;

use feature_engine::SegmentMetrics;
use serde::{Deserialize, Serialize};

/// Behavioral metrics, in attribution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    SteeringEntropy,
    ThrottleJerk,
    BrakePanic,
    LatInstability,
    LongJerk,
}

impl Metric {
    /// Fixed order used to break attribution ties
    pub const ALL: [Metric; 5] = [
        Metric::SteeringEntropy,
        Metric::ThrottleJerk,
        Metric::BrakePanic,
        Metric::LatInstability,
        Metric::LongJerk,
    ];

    /// Column label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::SteeringEntropy => "steering_entropy",
            Metric::ThrottleJerk => "throttle_jerk",
            Metric::BrakePanic => "brake_panic",
            Metric::LatInstability => "lat_instability",
            Metric::LongJerk => "long_jerk",
        }
    }

    /// Raw value of this metric in a segment
    pub fn value(&self, metrics: &SegmentMetrics) -> f64 {
        match self {
            Metric::SteeringEntropy => metrics.steering_entropy,
            Metric::ThrottleJerk => metrics.throttle_jerk,
            Metric::BrakePanic => metrics.brake_panic,
            Metric::LatInstability => metrics.lat_instability,
            Metric::LongJerk => metrics.long_jerk,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Metric weights for the composite score and for cause attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub steering_entropy: f64,
    pub throttle_jerk: f64,
    pub brake_panic: f64,
    pub lat_instability: f64,
    /// Weight of longitudinal jerk in the composite (0 by default)
    pub long_jerk: f64,
    /// Minimum attribution weight for longitudinal jerk. Applied only when
    /// picking a Primary Cause, never to the composite.
    pub long_jerk_attribution_floor: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            steering_entropy: 0.4,
            throttle_jerk: 0.3,
            brake_panic: 0.2,
            lat_instability: 0.1,
            long_jerk: 0.0,
            long_jerk_attribution_floor: 0.1,
        }
    }
}

impl FusionWeights {
    /// All load from steering corrections
    pub fn steering_only() -> Self {
        Self {
            steering_entropy: 1.0,
            throttle_jerk: 0.0,
            brake_panic: 0.0,
            lat_instability: 0.0,
            ..Default::default()
        }
    }

    /// Equal weight over the four composite metrics
    pub fn uniform() -> Self {
        Self {
            steering_entropy: 0.25,
            throttle_jerk: 0.25,
            brake_panic: 0.25,
            lat_instability: 0.25,
            ..Default::default()
        }
    }

    /// Composite weight of a metric
    pub fn weight(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SteeringEntropy => self.steering_entropy,
            Metric::ThrottleJerk => self.throttle_jerk,
            Metric::BrakePanic => self.brake_panic,
            Metric::LatInstability => self.lat_instability,
            Metric::LongJerk => self.long_jerk,
        }
    }

    /// Weight used for Primary Cause attribution
    pub fn attribution_weight(&self, metric: Metric) -> f64 {
        match metric {
            Metric::LongJerk => self.long_jerk.max(self.long_jerk_attribution_floor),
            other => self.weight(other),
        }
    }

    /// Sum of composite weights. The composite stays in [0, 1] while this is at most 1.
    pub fn total(&self) -> f64 {
        Metric::ALL.iter().map(|m| self.weight(*m)).sum()
    }
}

/// Insight summary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Segments listed in each of the high/low rankings
    pub top_n: usize,
    /// Quantile of smoothed load at and above which a segment is high-load
    pub high_load_quantile: f64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            high_load_quantile: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = FusionWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-12);
        assert_eq!(weights.weight(Metric::LongJerk), 0.0);
        assert_eq!(weights.attribution_weight(Metric::LongJerk), 0.1);
        assert_eq!(weights.attribution_weight(Metric::SteeringEntropy), 0.4);
    }

    #[test]
    fn test_presets_sum_to_one() {
        assert!((FusionWeights::steering_only().total() - 1.0).abs() < 1e-12);
        assert!((FusionWeights::uniform().total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_display_matches_label() {
        for metric in Metric::ALL {
            assert_eq!(metric.to_string(), metric.label());
        }
    }
}
