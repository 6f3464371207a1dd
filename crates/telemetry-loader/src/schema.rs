//! Long-Format Telemetry Schema
//!
//! One row per channel reading. Only five of the thirteen columns are used;
//! the rest (`expire_at`, `meta_*`, `outing`, ...) are carried by the source
//! but ignored here.

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::StringRecord;

use crate::error::MalformedRow;

/// Column order assumed when the source has no header line
pub const DEFAULT_COLUMNS: [&str; 13] = [
    "expire_at",
    "lap",
    "meta_event",
    "meta_session",
    "meta_source",
    "meta_time",
    "original_vehicle_id",
    "outing",
    "telemetry_name",
    "telemetry_value",
    "timestamp",
    "vehicle_id",
    "vehicle_number",
];

/// Naive timestamp formats accepted after RFC 3339
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A single channel reading
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: DateTime<Utc>,
    pub vehicle_id: String,
    pub lap: i64,
    pub channel: String,
    pub value: f64,
}

/// Positions of the columns the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub lap: usize,
    pub telemetry_name: usize,
    pub telemetry_value: usize,
    pub timestamp: usize,
    pub vehicle_id: usize,
}

impl ColumnLayout {
    /// Layout of a headerless source
    pub fn fixed() -> Self {
        Self {
            lap: 1,
            telemetry_name: 8,
            telemetry_value: 9,
            timestamp: 10,
            vehicle_id: 11,
        }
    }

    /// Whether a first record is a header rather than data
    pub fn is_header(record: &StringRecord) -> bool {
        record.iter().any(|field| field.trim() == "vehicle_id")
    }

    /// Build a layout from a header record.
    ///
    /// Returns the name of the first required column that is missing.
    pub fn from_header(record: &StringRecord) -> Result<Self, &'static str> {
        let find = |name: &'static str| {
            record
                .iter()
                .position(|field| field.trim() == name)
                .ok_or(name)
        };

        Ok(Self {
            lap: find("lap")?,
            telemetry_name: find("telemetry_name")?,
            telemetry_value: find("telemetry_value")?,
            timestamp: find("timestamp")?,
            vehicle_id: find("vehicle_id")?,
        })
    }

    fn key_width(&self) -> usize {
        self.lap.max(self.vehicle_id) + 1
    }

    fn sample_width(&self) -> usize {
        [
            self.lap,
            self.telemetry_name,
            self.telemetry_value,
            self.timestamp,
            self.vehicle_id,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Parse only the vehicle id of a row
    pub fn parse_vehicle(&self, record: &StringRecord, line: u64) -> Result<String, MalformedRow> {
        check_width(record, self.vehicle_id + 1, line)?;
        parse_vehicle_id(&record[self.vehicle_id], line)
    }

    /// Parse only the (vehicle_id, lap) key of a row
    pub fn parse_key(
        &self,
        record: &StringRecord,
        line: u64,
    ) -> Result<(String, i64), MalformedRow> {
        check_width(record, self.key_width(), line)?;
        let vehicle_id = parse_vehicle_id(&record[self.vehicle_id], line)?;
        let lap = parse_lap(&record[self.lap], line)?;
        Ok((vehicle_id, lap))
    }

    /// Parse a full channel reading
    pub fn parse_sample(
        &self,
        record: &StringRecord,
        line: u64,
    ) -> Result<RawSample, MalformedRow> {
        check_width(record, self.sample_width(), line)?;
        let (vehicle_id, lap) = self.parse_key(record, line)?;

        let channel = record[self.telemetry_name].trim();
        if channel.is_empty() {
            return Err(bad_field(line, "telemetry_name", channel));
        }

        let raw_value = record[self.telemetry_value].trim();
        let value = raw_value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| bad_field(line, "telemetry_value", raw_value))?;

        let timestamp = parse_timestamp(&record[self.timestamp])
            .ok_or_else(|| bad_field(line, "timestamp", &record[self.timestamp]))?;

        Ok(RawSample {
            timestamp,
            vehicle_id,
            lap,
            channel: channel.to_string(),
            value,
        })
    }
}

/// Parse a timestamp: RFC 3339 first, then naive date-times read as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Lap numbers sometimes arrive as floats ("3.0")
fn parse_lap(raw: &str, line: u64) -> Result<i64, MalformedRow> {
    let trimmed = raw.trim();
    if let Ok(lap) = trimmed.parse::<i64>() {
        return Ok(lap);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(bad_field(line, "lap", trimmed)),
    }
}

fn parse_vehicle_id(raw: &str, line: u64) -> Result<String, MalformedRow> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(bad_field(line, "vehicle_id", trimmed))
    } else {
        Ok(trimmed.to_string())
    }
}

fn check_width(record: &StringRecord, expected: usize, line: u64) -> Result<(), MalformedRow> {
    if record.len() < expected {
        Err(MalformedRow::FieldCount {
            line,
            expected,
            found: record.len(),
        })
    } else {
        Ok(())
    }
}

fn bad_field(line: u64, field: &'static str, value: &str) -> MalformedRow {
    MalformedRow::BadField {
        line,
        field,
        value: value.to_string(),
    }
}
