//! Vehicle and Lap Discovery
//!
//! Streams the source once per query, keeping only the distinct keys.

use std::collections::BTreeSet;

use tracing::info;

use crate::error::LoaderError;
use crate::reader::{SampleReader, ScanConfig};
use crate::source::TelemetrySource;

/// Distinct vehicle ids in a source, sorted
pub fn available_vehicles<S>(source: &S, config: &ScanConfig) -> Result<Vec<String>, LoaderError>
where
    S: TelemetrySource + ?Sized,
{
    let name = source.name();
    let mut reader = SampleReader::new(source.open()?, &name, config)?;

    let mut vehicles = BTreeSet::new();
    while let Some(vehicle_id) = reader.next_vehicle() {
        vehicles.insert(vehicle_id);
    }

    let report = reader.finish()?;
    info!("{}: {} vehicles in {} rows", name, vehicles.len(), report.rows_read);
    Ok(vehicles.into_iter().collect())
}

/// Distinct lap numbers driven by one vehicle, sorted
pub fn available_laps<S>(
    source: &S,
    vehicle_id: &str,
    config: &ScanConfig,
) -> Result<Vec<i64>, LoaderError>
where
    S: TelemetrySource + ?Sized,
{
    let name = source.name();
    let mut reader = SampleReader::new(source.open()?, &name, config)?;

    let mut laps = BTreeSet::new();
    while let Some((vehicle, lap)) = reader.next_key() {
        if vehicle == vehicle_id {
            laps.insert(lap);
        }
    }

    let report = reader.finish()?;
    info!(
        "{}: {} laps for {} in {} rows",
        name,
        laps.len(),
        vehicle_id,
        report.rows_read
    );
    Ok(laps.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileSource, MemorySource};

    fn source() -> MemorySource {
        let rows = [
            ("3", "GR86-004-78"),
            ("1", "GR86-002-2"),
            ("1", "GR86-004-78"),
            ("2.0", "GR86-004-78"),
            ("3", "GR86-004-78"),
            ("bad", "GR86-010-16"),
        ];
        let data: String = rows
            .iter()
            .map(|(lap, v)| {
                format!(",{lap},ev,R1,kafka,,{v},0,speed,1,2025-04-04T10:00:00Z,{v},1\n")
            })
            .collect();
        MemorySource::new("mem", data)
    }

    #[test]
    fn test_vehicles_sorted_and_deduplicated() {
        let vehicles = available_vehicles(&source(), &ScanConfig::default()).unwrap();
        assert_eq!(vehicles, vec!["GR86-002-2", "GR86-004-78", "GR86-010-16"]);
    }

    #[test]
    fn test_vehicle_listed_without_usable_lap() {
        let data = ",,ev,R1,kafka,,GR86-022-13,0,speed,1,2025-04-04T10:00:00Z,GR86-022-13,1\n\
                    ,1,ev,R1,kafka,,,0,speed,1,2025-04-04T10:00:01Z,,1\n";
        let source = MemorySource::new("mem", data);
        let vehicles = available_vehicles(&source, &ScanConfig::default()).unwrap();
        assert_eq!(vehicles, vec!["GR86-022-13"]);
        assert!(available_laps(&source, "GR86-022-13", &ScanConfig::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_laps_for_vehicle() {
        let laps = available_laps(&source(), "GR86-004-78", &ScanConfig::default()).unwrap();
        assert_eq!(laps, vec![1, 2, 3]);
        let none = available_laps(&source(), "GR86-999", &ScanConfig::default()).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_small_chunks_same_result() {
        let config = ScanConfig { chunk_rows: 1 };
        let vehicles = available_vehicles(&source(), &config).unwrap();
        assert_eq!(vehicles.len(), 3);
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let source = FileSource::new("/no/such/dir/telemetry_data.csv");
        assert!(matches!(
            available_vehicles(&source, &ScanConfig::default()),
            Err(LoaderError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_stream_failure_is_fatal() {
        struct Unplugged;

        impl std::io::Read for Unplugged {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "device unplugged"))
            }
        }

        struct Flaky;

        impl TelemetrySource for Flaky {
            fn name(&self) -> String {
                "flaky.csv".to_string()
            }

            fn open(&self) -> Result<Box<dyn std::io::Read + '_>, LoaderError> {
                let data: &[u8] = b",1,ev,R1,kafka,,GR86-1,0,speed,1,2025-04-04T10:00:00Z,GR86-1,1\n";
                Ok(Box::new(std::io::Read::chain(data, Unplugged)))
            }
        }

        assert!(matches!(
            available_vehicles(&Flaky, &ScanConfig::default()),
            Err(LoaderError::Io { .. })
        ));
        assert!(matches!(
            available_laps(&Flaky, "GR86-1", &ScanConfig::default()),
            Err(LoaderError::Io { .. })
        ));
    }
}
