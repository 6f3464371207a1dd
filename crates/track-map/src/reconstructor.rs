//! Dead-Reckoning Integrator
//!
//! Kinematic bicycle model, forward Euler:
//!
//! ```text
//! wheel_angle = radians(steering * full_scale / steering_ratio)
//! yaw_rate    = speed / wheelbase * tan(wheel_angle)
//! heading    += yaw_rate * dt
//! x          += speed * cos(heading) * dt
//! y          += speed * sin(heading) * dt
//! distance   += speed * dt
//! ```
//!
//! The integrator is open loop. Heading error accumulates over the lap and
//! the reconstructed path does not have to close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use telemetry_loader::SignalFrame;
use tracing::debug;

/// Vehicle constants used by the bicycle model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleGeometry {
    /// Wheelbase (m)
    pub wheelbase_m: f64,
    /// Steering wheel to road wheel ratio
    pub steering_ratio: f64,
    /// Steering wheel deflection (deg) represented by a normalized 1.0
    pub steering_full_scale_deg: f64,
}

impl Default for VehicleGeometry {
    fn default() -> Self {
        Self {
            wheelbase_m: 2.57,
            steering_ratio: 13.5,
            steering_full_scale_deg: 450.0,
        }
    }
}

/// Integrated state at one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackPoint {
    /// Seconds since the previous sample (0 for the first)
    pub dt: f64,
    /// rad/s
    pub yaw_rate: f64,
    /// rad, cumulative
    pub heading: f64,
    pub x: f64,
    pub y: f64,
    /// Cumulative lap distance, non-decreasing
    pub distance: f64,
}

/// A signal frame with its reconstructed position
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LapSample {
    pub signals: SignalFrame,
    pub track: TrackPoint,
}

/// Running state of the fold
#[derive(Debug, Clone, Copy, Default)]
struct IntegratorState {
    previous: Option<DateTime<Utc>>,
    heading: f64,
    x: f64,
    y: f64,
    distance: f64,
}

/// Reconstructs position and lap distance from speed and steering
pub struct TrackReconstructor {
    geometry: VehicleGeometry,
}

impl TrackReconstructor {
    /// Create a reconstructor for a vehicle
    pub fn new(geometry: VehicleGeometry) -> Self {
        Self { geometry }
    }

    /// Road wheel angle (rad) for a normalized steering input
    pub fn wheel_angle(&self, steering: f64) -> f64 {
        let degrees = steering * self.geometry.steering_full_scale_deg;
        (degrees / self.geometry.steering_ratio).to_radians()
    }

    /// Yaw rate (rad/s) for a speed (m/s) and normalized steering input
    pub fn yaw_rate(&self, speed: f64, steering: f64) -> f64 {
        speed / self.geometry.wheelbase_m * self.wheel_angle(steering).tan()
    }

    /// Integrate a time-ordered lap. All sums start at zero on the first frame.
    pub fn reconstruct(&self, frames: Vec<SignalFrame>) -> Vec<LapSample> {
        let samples: Vec<LapSample> = frames
            .into_iter()
            .scan(IntegratorState::default(), |state, signals| {
                let dt = state
                    .previous
                    .map(|prev| seconds_between(prev, signals.timestamp))
                    .unwrap_or(0.0);
                state.previous = Some(signals.timestamp);

                let yaw_rate = self.yaw_rate(signals.speed, signals.steering_angle);
                state.heading += yaw_rate * dt;
                state.x += signals.speed * state.heading.cos() * dt;
                state.y += signals.speed * state.heading.sin() * dt;
                state.distance += signals.speed * dt;

                Some(LapSample {
                    signals,
                    track: TrackPoint {
                        dt,
                        yaw_rate,
                        heading: state.heading,
                        x: state.x,
                        y: state.y,
                        distance: state.distance,
                    },
                })
            })
            .collect();

        if let Some(last) = samples.last() {
            debug!(
                "Reconstructed {} samples: distance {:.1} m, end ({:.1}, {:.1}), heading {:.3} rad",
                samples.len(),
                last.track.distance,
                last.track.x,
                last.track.y,
                last.track.heading
            );
        }
        samples
    }
}

impl Default for TrackReconstructor {
    fn default() -> Self {
        Self::new(VehicleGeometry::default())
    }
}

/// Non-negative elapsed seconds
fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later - earlier;
    let secs = match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        None => delta.num_milliseconds() as f64 / 1e3,
    };
    secs.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::f64::consts::PI;

    fn frames(count: usize, step_ms: i64, speed: f64, steering: f64) -> Vec<SignalFrame> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        (0..count)
            .map(|i| SignalFrame {
                timestamp: start + Duration::milliseconds(step_ms * i as i64),
                steering_angle: steering,
                throttle: 0.5,
                brake_pressure: 0.0,
                lat_accel: 0.0,
                long_accel: 0.0,
                speed,
            })
            .collect()
    }

    #[test]
    fn test_first_sample_starts_at_origin() {
        let samples = TrackReconstructor::default().reconstruct(frames(3, 100, 20.0, 0.3));
        let first = samples[0].track;
        assert_eq!(first.dt, 0.0);
        assert_eq!(first.heading, 0.0);
        assert_eq!((first.x, first.y, first.distance), (0.0, 0.0, 0.0));
        assert!((samples[1].track.dt - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_straight_line() {
        let samples = TrackReconstructor::default().reconstruct(frames(11, 100, 10.0, 0.0));
        let last = samples.last().unwrap().track;
        assert!((last.distance - 10.0).abs() < 1e-9);
        assert!((last.x - 10.0).abs() < 1e-9);
        assert!(last.y.abs() < 1e-12);
        assert_eq!(last.heading, 0.0);
    }

    #[test]
    fn test_yaw_rate_matches_bicycle_model() {
        let reconstructor = TrackReconstructor::default();
        // 0.3 * 450 deg at the wheel / 13.5 = 10 deg road wheel angle
        let expected = 25.0 / 2.57 * (10.0_f64).to_radians().tan();
        assert!((reconstructor.yaw_rate(25.0, 0.3) - expected).abs() < 1e-12);
        assert!((reconstructor.wheel_angle(0.3) - 10.0 * PI / 180.0).abs() < 1e-12);
        assert!(reconstructor.yaw_rate(25.0, -0.3) < 0.0);
    }

    #[test]
    fn test_constant_left_turn_accumulates_heading() {
        let samples = TrackReconstructor::default().reconstruct(frames(50, 50, 15.0, 0.2));
        assert!(samples.windows(2).all(|w| w[1].track.heading > w[0].track.heading));
        assert!(samples.last().unwrap().track.y > 0.0);
    }

    #[test]
    fn test_distance_non_decreasing_with_stops() {
        let mut input = frames(6, 200, 12.0, 0.1);
        input[2].speed = 0.0;
        input[3].speed = 0.0;
        let samples = TrackReconstructor::default().reconstruct(input);
        assert!(samples.windows(2).all(|w| w[1].track.distance >= w[0].track.distance));
        assert_eq!(samples[2].track.distance, samples[3].track.distance);
    }

    #[test]
    fn test_empty_lap() {
        assert!(TrackReconstructor::default().reconstruct(Vec::new()).is_empty());
    }
}
