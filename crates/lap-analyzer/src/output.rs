//! CSV and JSON export

use std::io::Write;

use load_index::{Insights, Metric};
use serde::Serialize;

use crate::{LapAnalysis, LapRow, PipelineError};

/// Flat per-segment export row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub segment_id: usize,
    pub avg_distance: f64,
    pub sample_count: usize,
    pub steering_entropy: f64,
    pub throttle_jerk: f64,
    pub brake_panic: f64,
    pub lat_instability: f64,
    pub long_jerk: f64,
    pub norm_steering: f64,
    pub norm_throttle: f64,
    pub norm_brake: f64,
    pub norm_lat: f64,
    pub norm_long_jerk: f64,
    #[serde(rename = "CLI")]
    pub cli: f64,
    #[serde(rename = "CLI_smooth")]
    pub cli_smooth: f64,
    pub primary_cause: Metric,
}

impl SegmentRow {
    /// Segment rows of an analysis, ascending id
    pub fn from_analysis(analysis: &LapAnalysis) -> Vec<Self> {
        analysis
            .segments
            .iter()
            .zip(&analysis.insights.segments)
            .map(|(fused, load)| SegmentRow {
                segment_id: fused.segment_id(),
                avg_distance: fused.metrics.avg_distance,
                sample_count: fused.metrics.sample_count,
                steering_entropy: fused.metrics.steering_entropy,
                throttle_jerk: fused.metrics.throttle_jerk,
                brake_panic: fused.metrics.brake_panic,
                lat_instability: fused.metrics.lat_instability,
                long_jerk: fused.metrics.long_jerk,
                norm_steering: fused.norm_steering,
                norm_throttle: fused.norm_throttle,
                norm_brake: fused.norm_brake,
                norm_lat: fused.norm_lat,
                norm_long_jerk: fused.norm_long_jerk,
                cli: fused.cli,
                cli_smooth: fused.cli_smooth,
                primary_cause: load.primary_cause,
            })
            .collect()
    }
}

/// Insights with the request they describe
#[derive(Debug, Serialize)]
pub struct InsightsReport<'a> {
    pub vehicle_id: &'a str,
    pub lap: i64,
    pub num_segments: usize,
    pub total_distance: f64,
    /// "N/A" when no segment reached the high-load threshold
    pub dominant_stressor_label: &'static str,
    #[serde(flatten)]
    pub insights: &'a Insights,
}

impl<'a> InsightsReport<'a> {
    pub fn new(analysis: &'a LapAnalysis) -> Self {
        Self {
            vehicle_id: &analysis.vehicle_id,
            lap: analysis.lap,
            num_segments: analysis.num_segments,
            total_distance: analysis.total_distance,
            dominant_stressor_label: analysis.insights.dominant_stressor_label(),
            insights: &analysis.insights,
        }
    }
}

/// Write the per-sample table as CSV
pub fn write_rows<W: Write>(writer: W, rows: &[LapRow]) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the per-segment table as CSV
pub fn write_segments<W: Write>(writer: W, analysis: &LapAnalysis) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in SegmentRow::from_analysis(analysis) {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the insights summary as pretty JSON
pub fn write_insights<W: Write>(writer: W, analysis: &LapAnalysis) -> Result<(), PipelineError> {
    serde_json::to_writer_pretty(writer, &InsightsReport::new(analysis))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process;
    use telemetry_loader::MemorySource;

    fn analysis() -> LapAnalysis {
        let mut data = String::new();
        for i in 0..400u32 {
            let ts = format!("2025-04-04T10:{:02}:{:02}.{}Z", i / 600, (i / 10) % 60, i % 10);
            let steering = ((i * 31) % 60) as f64 - 30.0;
            let speed = 30.0 + (i % 9) as f64;
            let throttle = (i % 4) as f64 * 0.25;
            data += &format!(",2,ev,R1,kafka,,GR86-1,0,speed,{speed},{ts},GR86-1,1\n");
            data += &format!(",2,ev,R1,kafka,,GR86-1,0,Steering_Angle,{steering},{ts},GR86-1,1\n");
            data += &format!(",2,ev,R1,kafka,,GR86-1,0,ath,{throttle},{ts},GR86-1,1\n");
        }
        process(&MemorySource::new("export.csv", data), "GR86-1", 2, 40).unwrap()
    }

    #[test]
    fn test_rows_csv() {
        let analysis = analysis();
        let mut out = Vec::new();
        write_rows(&mut out, &analysis.rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("timestamp,vehicle_id,lap,segment_id,section_id,x,y,"));
        assert!(header.contains(",CLI,CLI_smooth,steering_entropy,"));
        assert_eq!(lines.count(), analysis.rows.len());
    }

    #[test]
    fn test_segments_csv() {
        let analysis = analysis();
        let mut out = Vec::new();
        write_segments(&mut out, &analysis).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().next().unwrap().ends_with(",CLI,CLI_smooth,primary_cause"));
        assert_eq!(text.lines().count(), analysis.segments.len() + 1);
    }

    #[test]
    fn test_insights_json() {
        let analysis = analysis();
        let mut out = Vec::new();
        write_insights(&mut out, &analysis).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["vehicle_id"], "GR86-1");
        assert_eq!(value["lap"], 2);
        assert_eq!(value["top_high"].as_array().map(|a| a.len()), Some(5));
        assert!(value["max_cli"].is_number());
        assert!(value["dominant_stressor_label"].is_string());
    }
}
