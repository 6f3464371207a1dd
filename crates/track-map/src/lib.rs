//! Track Map Reconstruction
//!
//! Rebuilds a 2D path and lap distance from speed and steering alone (no GPS),
//! then slices the lap into equal-distance segments.

mod reconstructor;
mod segmenter;

pub use reconstructor::{LapSample, TrackPoint, TrackReconstructor, VehicleGeometry};
pub use segmenter::{segment_lap, SegmentedLap, SegmentedSample};

use thiserror::Error;

/// Track reconstruction and segmentation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// Lap has no samples to segment
    #[error("Lap has no samples")]
    EmptyLap,

    /// Segment count or lap distance cannot produce segments
    #[error("Cannot split lap distance {total_distance} into {num_segments} segments")]
    InvalidSegmentation {
        num_segments: usize,
        total_distance: f64,
    },
}
