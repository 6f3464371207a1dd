//! Telemetry Loading and Normalization
//!
//! Turns a long-format telemetry stream (one row per channel reading) into a
//! time-ordered, gap-filled, unit-normalized signal table for one vehicle lap.

mod discovery;
mod error;
mod loader;
mod normalizer;
mod pivot;
mod reader;
mod schema;
mod source;

pub use discovery::{available_laps, available_vehicles};
pub use error::{LoaderError, MalformedRow};
pub use loader::{load_lap, LapSignals, LoaderConfig};
pub use normalizer::{
    Channel, ChannelMap, NormalizationConfig, SignalFrame, SignalNormalizer, UnitDecisions,
};
pub use pivot::WideTable;
pub use reader::{SampleReader, ScanConfig, ScanReport};
pub use schema::{ColumnLayout, RawSample, DEFAULT_COLUMNS};
pub use source::{locate_telemetry, FileSource, MemorySource, TelemetrySource};
