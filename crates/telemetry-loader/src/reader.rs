//! Streaming Record Reader
//!
//! Reads a long-format source one record at a time so that neither
//! discovery nor lap loading ever holds the whole file in memory.

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LoaderError, MalformedRow};
use crate::schema::{ColumnLayout, RawSample};

/// Number of malformed rows kept verbatim in a [`ScanReport`]
const MAX_EXAMPLES: usize = 8;

/// Scan tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Rows per progress chunk (logged at debug level)
    pub chunk_rows: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self { chunk_rows: 100_000 }
    }
}

/// Row accounting for one pass over a source
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Data rows seen (header excluded)
    pub rows_read: u64,
    /// Rows skipped as malformed
    pub malformed: u64,
    /// First few malformed rows, for diagnostics
    #[serde(skip)]
    pub examples: Vec<MalformedRow>,
}

impl ScanReport {
    fn record_malformed(&mut self, row: MalformedRow) {
        self.malformed += 1;
        metrics::counter!("telemetry_rows_malformed_total").increment(1);
        if self.examples.len() < MAX_EXAMPLES {
            debug!("Skipping malformed row: {}", row);
            self.examples.push(row);
        }
    }
}

/// Streaming reader over a long-format telemetry source.
///
/// Unparseable records are skipped and counted. A failure of the underlying
/// stream ends the scan; [`SampleReader::finish`] then returns it.
pub struct SampleReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    source_name: String,
    layout: ColumnLayout,
    /// First data record of a headerless source
    pending: Option<StringRecord>,
    report: ScanReport,
    chunk_rows: u64,
    failure: Option<LoaderError>,
}

impl<R: Read> SampleReader<R> {
    /// Open a reader, detecting whether the first line is a header
    pub fn new(reader: R, source_name: &str, config: &ScanConfig) -> Result<Self, LoaderError> {
        let mut records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader)
            .into_records();

        let mut report = ScanReport::default();
        let mut layout = ColumnLayout::fixed();
        let mut pending = None;

        match records.next() {
            Some(Ok(first)) if ColumnLayout::is_header(&first) => {
                layout = ColumnLayout::from_header(&first).map_err(|column| {
                    LoaderError::MissingColumn {
                        column,
                        source_name: source_name.to_string(),
                    }
                })?;
                debug!("{}: header detected", source_name);
            }
            Some(Ok(first)) => {
                debug!("{}: no header, assuming fixed column order", source_name);
                pending = Some(first);
            }
            Some(Err(e)) if e.is_io_error() => {
                return Err(stream_failure(source_name, &e));
            }
            Some(Err(e)) => {
                report.rows_read += 1;
                report.record_malformed(MalformedRow::Unreadable {
                    line: 1,
                    message: e.to_string(),
                });
            }
            None => {}
        }

        Ok(Self {
            records,
            source_name: source_name.to_string(),
            layout,
            pending,
            report,
            chunk_rows: config.chunk_rows.max(1),
            failure: None,
        })
    }

    /// Column layout in use
    pub fn layout(&self) -> ColumnLayout {
        self.layout
    }

    /// Row accounting so far
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    /// Consume the reader, returning its row accounting, or the stream
    /// failure that cut the scan short
    pub fn finish(self) -> Result<ScanReport, LoaderError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.into_report()),
        }
    }

    /// Consume the reader, returning its row accounting
    pub fn into_report(self) -> ScanReport {
        if self.report.malformed > 0 {
            warn!(
                "Skipped {} malformed rows of {}",
                self.report.malformed, self.report.rows_read
            );
        }
        self.report
    }

    /// Next record that the CSV layer could read, with its line number
    fn next_record(&mut self) -> Option<(StringRecord, u64)> {
        if self.failure.is_some() {
            return None;
        }
        loop {
            let next = match self.pending.take() {
                Some(record) => Ok(record),
                None => self.records.next()?,
            };

            self.report.rows_read += 1;
            metrics::counter!("telemetry_rows_scanned_total").increment(1);
            if self.report.rows_read % self.chunk_rows == 0 {
                debug!("Scanned {} rows", self.report.rows_read);
            }

            match next {
                Err(e) if e.is_io_error() => {
                    warn!(
                        "{}: read failed after {} rows",
                        self.source_name, self.report.rows_read
                    );
                    self.failure = Some(stream_failure(&self.source_name, &e));
                    return None;
                }
                Ok(record) => {
                    let line = record
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(self.report.rows_read);
                    return Some((record, line));
                }
                Err(e) => {
                    let line = e
                        .position()
                        .map(|p| p.line())
                        .unwrap_or(self.report.rows_read);
                    self.report.record_malformed(MalformedRow::Unreadable {
                        line,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Next vehicle id, skipping rows without one
    pub fn next_vehicle(&mut self) -> Option<String> {
        loop {
            let (record, line) = self.next_record()?;
            match self.layout.parse_vehicle(&record, line) {
                Ok(vehicle_id) => return Some(vehicle_id),
                Err(row) => self.report.record_malformed(row),
            }
        }
    }

    /// Next (vehicle_id, lap) key, skipping rows whose key is unusable
    pub fn next_key(&mut self) -> Option<(String, i64)> {
        loop {
            let (record, line) = self.next_record()?;
            match self.layout.parse_key(&record, line) {
                Ok(key) => return Some(key),
                Err(row) => self.report.record_malformed(row),
            }
        }
    }
}

fn stream_failure(source_name: &str, err: &csv::Error) -> LoaderError {
    LoaderError::Io {
        source_name: source_name.to_string(),
        message: err.to_string(),
    }
}

impl<R: Read> Iterator for SampleReader<R> {
    type Item = RawSample;

    fn next(&mut self) -> Option<RawSample> {
        loop {
            let (record, line) = self.next_record()?;
            match self.layout.parse_sample(&record, line) {
                Ok(sample) => return Some(sample),
                Err(row) => self.report.record_malformed(row),
            }
        }
    }
}
