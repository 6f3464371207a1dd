//! Lap Loading
//!
//! filter → pivot → fill → normalize, for one (vehicle, lap).

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LoaderError;
use crate::normalizer::{
    ChannelMap, NormalizationConfig, SignalFrame, SignalNormalizer, UnitDecisions,
};
use crate::pivot::WideTable;
use crate::reader::{SampleReader, ScanConfig, ScanReport};
use crate::source::TelemetrySource;

/// Loader configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub channels: ChannelMap,
    pub normalization: NormalizationConfig,
    pub scan: ScanConfig,
}

/// Aligned, normalized signals of one lap
#[derive(Debug, Clone)]
pub struct LapSignals {
    pub vehicle_id: String,
    pub lap: i64,
    /// Strictly time-ordered
    pub frames: Vec<SignalFrame>,
    pub units: UnitDecisions,
    pub scan: ScanReport,
}

/// Load one lap of one vehicle.
///
/// Rows are filtered before any transformation. An empty match is an error,
/// never an empty result.
pub fn load_lap<S>(
    source: &S,
    vehicle_id: &str,
    lap: i64,
    config: &LoaderConfig,
) -> Result<LapSignals, LoaderError>
where
    S: TelemetrySource + ?Sized,
{
    let source_name = source.name();
    let mut reader = SampleReader::new(source.open()?, &source_name, &config.scan)?;

    let matched: Vec<_> = reader
        .by_ref()
        .filter(|s| s.lap == lap && s.vehicle_id == vehicle_id)
        .collect();
    let scan = reader.finish()?;

    if matched.is_empty() {
        return Err(LoaderError::NoMatchingData {
            vehicle_id: vehicle_id.to_string(),
            lap,
            source_name,
        });
    }

    info!(
        "{} lap {}: {} readings of {} rows in {}",
        vehicle_id,
        lap,
        matched.len(),
        scan.rows_read,
        source_name
    );

    let mut table = WideTable::pivot(matched);
    table.fill_gaps();
    info!(
        "Pivoted to {} timestamps x {} channels",
        table.len(),
        table.channels().count()
    );

    let normalizer = SignalNormalizer::new(config.channels.clone(), config.normalization.clone());
    let (frames, units) = normalizer.normalize(&table);

    Ok(LapSignals {
        vehicle_id: vehicle_id.to_string(),
        lap,
        frames,
        units,
        scan,
    })
}
