//! Lap Insights
//!
//! Rankings, lap-level statistics and the dominant stressor of the
//! high-load segments.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::config::{InsightsConfig, Metric};
use crate::fusion::{CliModel, FusedSegment};

/// Label reported when no segment qualifies as high-load
pub const NOT_APPLICABLE: &str = "N/A";

/// Smoothed load and cause of one segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentLoad {
    pub segment_id: usize,
    pub avg_distance: f64,
    #[serde(rename = "CLI_smooth")]
    pub cli_smooth: f64,
    pub primary_cause: Metric,
}

/// Summary of a fused lap
#[derive(Debug, Clone, Serialize)]
pub struct Insights {
    /// Highest smoothed load first
    pub top_high: Vec<SegmentLoad>,
    /// Lowest smoothed load first
    pub top_low: Vec<SegmentLoad>,
    pub max_cli: f64,
    pub avg_cli: f64,
    /// Smoothed load at the configured quantile
    pub high_load_threshold: f64,
    pub high_load_count: usize,
    /// Most frequent Primary Cause among high-load segments
    pub dominant_stressor: Option<Metric>,
    /// First segment holding the maximum smoothed load
    pub max_stress_segment: Option<usize>,
    /// First segment holding the minimum smoothed load
    pub min_stress_segment: Option<usize>,
    /// Every segment, ascending id
    pub segments: Vec<SegmentLoad>,
}

impl Insights {
    /// Summarize a lap's fused segments
    pub fn compute(fused: &[FusedSegment], model: &CliModel, config: &InsightsConfig) -> Self {
        let segments: Vec<SegmentLoad> = fused
            .iter()
            .map(|f| SegmentLoad {
                segment_id: f.segment_id(),
                avg_distance: f.metrics.avg_distance,
                cli_smooth: f.cli_smooth,
                primary_cause: model.primary_cause(f),
            })
            .collect();

        let loads: Vec<f64> = segments.iter().map(|s| s.cli_smooth).collect();

        let mut by_load = segments.clone();
        by_load.sort_by(|a, b| b.cli_smooth.total_cmp(&a.cli_smooth));
        let top_high: Vec<SegmentLoad> = by_load.iter().take(config.top_n).copied().collect();
        by_load.sort_by(|a, b| a.cli_smooth.total_cmp(&b.cli_smooth));
        let top_low: Vec<SegmentLoad> = by_load.iter().take(config.top_n).copied().collect();

        let max_cli = loads.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let avg_cli = if loads.is_empty() {
            0.0
        } else {
            loads.iter().sum::<f64>() / loads.len() as f64
        };

        let high_load_threshold = quantile(&loads, config.high_load_quantile);
        let high_load: Vec<Metric> = segments
            .iter()
            .filter(|s| s.cli_smooth >= high_load_threshold)
            .map(|s| s.primary_cause)
            .collect();
        let dominant_stressor = mode(&high_load);

        let max_stress_segment = first_extreme(&segments, |candidate, best| candidate > best);
        let min_stress_segment = first_extreme(&segments, |candidate, best| candidate < best);

        let insights = Self {
            top_high,
            top_low,
            max_cli: if loads.is_empty() { 0.0 } else { max_cli },
            avg_cli,
            high_load_threshold,
            high_load_count: high_load.len(),
            dominant_stressor,
            max_stress_segment,
            min_stress_segment,
            segments,
        };

        info!(
            "Max CLI {:.3}, avg {:.3}, {} high-load segments, dominant stressor: {}",
            insights.max_cli,
            insights.avg_cli,
            insights.high_load_count,
            insights.dominant_stressor_label()
        );
        insights
    }

    /// Dominant stressor label, or "N/A"
    pub fn dominant_stressor_label(&self) -> &'static str {
        self.dominant_stressor
            .map(|m| m.label())
            .unwrap_or(NOT_APPLICABLE)
    }
}

/// Linearly interpolated quantile, 0 for an empty series
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}

/// Most frequent metric. Equal counts resolve to the smallest label.
fn mode(causes: &[Metric]) -> Option<Metric> {
    let mut counts: BTreeMap<&'static str, (usize, Metric)> = BTreeMap::new();
    for cause in causes {
        counts.entry(cause.label()).or_insert((0, *cause)).0 += 1;
    }

    let mut best: Option<(usize, Metric)> = None;
    for (count, metric) in counts.into_values() {
        if best.map_or(true, |(best_count, _)| count > best_count) {
            best = Some((count, metric));
        }
    }
    best.map(|(_, metric)| metric)
}

fn first_extreme(segments: &[SegmentLoad], better: impl Fn(f64, f64) -> bool) -> Option<usize> {
    let mut best: Option<&SegmentLoad> = None;
    for segment in segments {
        if best.map_or(true, |b| better(segment.cli_smooth, b.cli_smooth)) {
            best = Some(segment);
        }
    }
    best.map(|s| s.segment_id)
}
