//! Channel Mapping and Unit Normalization
//!
//! Unit detection is heuristic: throttle is treated as a percentage and speed
//! as km/h only when their observed maximum crosses a threshold. A very slow
//! lap can be misclassified; the thresholds are kept as they are calibrated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pivot::WideTable;

/// Canonical signal channels used downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    SteeringAngle,
    Throttle,
    BrakePressure,
    LatAccel,
    LongAccel,
    Speed,
}

impl Channel {
    /// Every required channel
    pub const ALL: [Channel; 6] = [
        Channel::SteeringAngle,
        Channel::Throttle,
        Channel::BrakePressure,
        Channel::LatAccel,
        Channel::LongAccel,
        Channel::Speed,
    ];

    /// Canonical column name
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::SteeringAngle => "steering_angle",
            Channel::Throttle => "throttle",
            Channel::BrakePressure => "brake_pressure",
            Channel::LatAccel => "lat_accel",
            Channel::LongAccel => "long_accel",
            Channel::Speed => "speed",
        }
    }
}

/// Raw telemetry channel name for each canonical channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    pub steering_angle: String,
    pub throttle: String,
    pub brake_pressure: String,
    pub lat_accel: String,
    pub long_accel: String,
    pub speed: String,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            steering_angle: "Steering_Angle".to_string(),
            throttle: "ath".to_string(),
            brake_pressure: "pbrake_f".to_string(),
            lat_accel: "accy_can".to_string(),
            long_accel: "accx_can".to_string(),
            speed: "speed".to_string(),
        }
    }
}

impl ChannelMap {
    /// Raw name carrying a canonical channel
    pub fn raw_name(&self, channel: Channel) -> &str {
        match channel {
            Channel::SteeringAngle => &self.steering_angle,
            Channel::Throttle => &self.throttle,
            Channel::BrakePressure => &self.brake_pressure,
            Channel::LatAccel => &self.lat_accel,
            Channel::LongAccel => &self.long_accel,
            Channel::Speed => &self.speed,
        }
    }
}

/// Unit normalization constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Steering deflection mapped to +/-1
    pub steering_full_scale: f64,
    /// Throttle is rescaled when its max exceeds this
    pub throttle_percent_threshold: f64,
    /// Divisor applied to percentage throttle
    pub throttle_percent_divisor: f64,
    /// Speed is treated as km/h when its max exceeds this
    pub speed_kmh_threshold: f64,
    /// km/h per m/s
    pub kmh_per_mps: f64,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            steering_full_scale: 450.0,
            throttle_percent_threshold: 1.0,
            throttle_percent_divisor: 100.0,
            speed_kmh_threshold: 100.0,
            kmh_per_mps: 3.6,
        }
    }
}

/// One aligned, normalized sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalFrame {
    pub timestamp: DateTime<Utc>,
    /// Roughly within [-1, 1]
    pub steering_angle: f64,
    /// [0, 1]
    pub throttle: f64,
    /// [0, 1], relative to the session maximum
    pub brake_pressure: f64,
    pub lat_accel: f64,
    pub long_accel: f64,
    /// m/s
    pub speed: f64,
}

/// Which unit heuristics fired for a lap
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitDecisions {
    pub throttle_rescaled: bool,
    pub speed_converted: bool,
    /// Observed brake maximum the channel was divided by, if positive
    pub brake_scale: Option<f64>,
    /// Channels absent from the source, synthesized as zero
    pub synthesized: Vec<Channel>,
}

/// Maps raw channels to canonical ones and normalizes their units
pub struct SignalNormalizer {
    channels: ChannelMap,
    config: NormalizationConfig,
}

impl SignalNormalizer {
    /// Create a new normalizer
    pub fn new(channels: ChannelMap, config: NormalizationConfig) -> Self {
        Self { channels, config }
    }

    /// Extract and normalize the six required channels of a filled table
    pub fn normalize(&self, table: &WideTable) -> (Vec<SignalFrame>, UnitDecisions) {
        let mut decisions = UnitDecisions::default();
        let mut column = |channel: Channel| -> Vec<f64> {
            match table.filled_column(self.channels.raw_name(channel)) {
                Some(values) => values,
                None => {
                    debug!(
                        "Channel {} ({}) absent, synthesizing zeros",
                        channel.as_str(),
                        self.channels.raw_name(channel)
                    );
                    decisions.synthesized.push(channel);
                    vec![0.0; table.len()]
                }
            }
        };

        let mut steering = column(Channel::SteeringAngle);
        let mut throttle = column(Channel::Throttle);
        let mut brake = column(Channel::BrakePressure);
        let lat_accel = column(Channel::LatAccel);
        let long_accel = column(Channel::LongAccel);
        let mut speed = column(Channel::Speed);

        scale(&mut steering, self.config.steering_full_scale);

        if max_of(&throttle) > self.config.throttle_percent_threshold {
            scale(&mut throttle, self.config.throttle_percent_divisor);
            decisions.throttle_rescaled = true;
        }

        let brake_max = max_of(&brake);
        if brake_max > 0.0 {
            scale(&mut brake, brake_max);
            decisions.brake_scale = Some(brake_max);
        }

        if max_of(&speed) > self.config.speed_kmh_threshold {
            scale(&mut speed, self.config.kmh_per_mps);
            decisions.speed_converted = true;
        }

        info!(
            "Normalized {} rows (throttle rescaled: {}, speed km/h: {}, brake scale: {:?}, synthesized: {})",
            table.len(),
            decisions.throttle_rescaled,
            decisions.speed_converted,
            decisions.brake_scale,
            decisions.synthesized.len()
        );

        let frames = table
            .timestamps()
            .iter()
            .enumerate()
            .map(|(i, &timestamp)| SignalFrame {
                timestamp,
                steering_angle: steering[i],
                throttle: throttle[i],
                brake_pressure: brake[i],
                lat_accel: lat_accel[i],
                long_accel: long_accel[i],
                speed: speed[i],
            })
            .collect();

        (frames, decisions)
    }
}

impl Default for SignalNormalizer {
    fn default() -> Self {
        Self::new(ChannelMap::default(), NormalizationConfig::default())
    }
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

fn scale(values: &mut [f64], divisor: f64) {
    for v in values.iter_mut() {
        *v /= divisor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawSample;
    use chrono::TimeZone;

    fn table(readings: &[(i64, &str, f64)]) -> WideTable {
        let mut table = WideTable::pivot(readings.iter().map(|&(secs, channel, value)| RawSample {
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
            vehicle_id: "GR86-1".to_string(),
            lap: 1,
            channel: channel.to_string(),
            value,
        }));
        table.fill_gaps();
        table
    }

    #[test]
    fn test_percent_inputs_are_rescaled() {
        let table = table(&[
            (0, "Steering_Angle", 225.0),
            (0, "ath", 80.0),
            (0, "pbrake_f", 10.0),
            (0, "speed", 180.0),
            (1, "Steering_Angle", -450.0),
            (1, "ath", 100.0),
            (1, "pbrake_f", 40.0),
            (1, "speed", 36.0),
        ]);
        let (frames, decisions) = SignalNormalizer::default().normalize(&table);

        assert!(decisions.throttle_rescaled);
        assert!(decisions.speed_converted);
        assert_eq!(decisions.brake_scale, Some(40.0));
        assert!((frames[0].steering_angle - 0.5).abs() < 1e-12);
        assert!((frames[1].steering_angle + 1.0).abs() < 1e-12);
        assert!((frames[0].throttle - 0.8).abs() < 1e-12);
        assert!((frames[0].brake_pressure - 0.25).abs() < 1e-12);
        assert!((frames[1].speed - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_inputs_left_alone() {
        let table = table(&[
            (0, "ath", 0.3),
            (0, "speed", 40.0),
            (1, "ath", 1.0),
            (1, "speed", 60.0),
        ]);
        let (frames, decisions) = SignalNormalizer::default().normalize(&table);

        assert!(!decisions.throttle_rescaled);
        assert!(!decisions.speed_converted);
        assert!((frames[0].throttle - 0.3).abs() < 1e-12);
        assert!((frames[1].speed - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_channels_synthesized_as_zero() {
        let table = table(&[(0, "speed", 20.0), (1, "speed", 21.0)]);
        let (frames, decisions) = SignalNormalizer::default().normalize(&table);

        assert_eq!(decisions.synthesized.len(), 5);
        assert!(!decisions.synthesized.contains(&Channel::Speed));
        assert_eq!(decisions.brake_scale, None);
        assert!(frames.iter().all(|f| f.throttle == 0.0 && f.brake_pressure == 0.0));
    }

    #[test]
    fn test_custom_channel_map() {
        let channels = ChannelMap {
            throttle: "aps".to_string(),
            ..Default::default()
        };
        let table = table(&[(0, "aps", 0.5), (0, "ath", 90.0)]);
        let normalizer = SignalNormalizer::new(channels, NormalizationConfig::default());
        let (frames, _) = normalizer.normalize(&table);
        assert!((frames[0].throttle - 0.5).abs() < 1e-12);
    }
}
