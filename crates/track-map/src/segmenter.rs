//! Equal-Distance Lap Segmentation

use serde::Serialize;
use tracing::info;

use crate::reconstructor::LapSample;
use crate::TrackError;

/// A lap sample tagged with its segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SegmentedSample {
    pub segment_id: usize,
    pub sample: LapSample,
}

/// Lap samples sorted by distance and bucketed into segments
#[derive(Debug, Clone)]
pub struct SegmentedLap {
    pub num_segments: usize,
    pub segment_length: f64,
    pub total_distance: f64,
    /// Ascending lap distance, so segment ids are non-decreasing
    pub samples: Vec<SegmentedSample>,
}

impl SegmentedLap {
    /// Contiguous runs of samples sharing a segment id, ascending by id.
    /// Segment ids with no samples do not appear.
    pub fn segments(&self) -> Vec<(usize, &[SegmentedSample])> {
        let mut runs = Vec::new();
        let mut start = 0;
        for i in 1..=self.samples.len() {
            if i == self.samples.len()
                || self.samples[i].segment_id != self.samples[start].segment_id
            {
                runs.push((self.samples[start].segment_id, &self.samples[start..i]));
                start = i;
            }
        }
        runs
    }
}

/// Assign every sample a segment id in `[0, num_segments - 1]`.
///
/// `segment_id = floor(distance / (max_distance / num_segments))`, clamped so
/// the sample at the maximum distance lands in the last segment.
pub fn segment_lap(
    mut samples: Vec<LapSample>,
    num_segments: usize,
) -> Result<SegmentedLap, TrackError> {
    if samples.is_empty() {
        return Err(TrackError::EmptyLap);
    }

    // stable: samples at equal distance keep their time order
    samples.sort_by(|a, b| a.track.distance.total_cmp(&b.track.distance));

    let total_distance = samples
        .last()
        .map(|s| s.track.distance)
        .unwrap_or(0.0);

    if num_segments == 0 || !total_distance.is_finite() || total_distance <= 0.0 {
        return Err(TrackError::InvalidSegmentation {
            num_segments,
            total_distance,
        });
    }

    let segment_length = total_distance / num_segments as f64;
    let last = num_segments - 1;

    let samples: Vec<SegmentedSample> = samples
        .into_iter()
        .map(|sample| {
            let raw = (sample.track.distance / segment_length).floor().max(0.0) as usize;
            SegmentedSample {
                segment_id: raw.min(last),
                sample,
            }
        })
        .collect();

    info!(
        "Segmented {:.1} m lap into {} segments of {:.2} m ({} samples)",
        total_distance,
        num_segments,
        segment_length,
        samples.len()
    );

    Ok(SegmentedLap {
        num_segments,
        segment_length,
        total_distance,
        samples,
    })
}
