//! Long-to-Wide Alignment
//!
//! Channels are sampled on different cadences. Pivoting gives one row per
//! distinct timestamp with one column per channel; gaps are then filled by
//! carrying the nearest earlier reading forward, and any leading gap by
//! carrying the first reading backward.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::schema::RawSample;

/// Time-ordered table with one column per channel
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    timestamps: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl WideTable {
    /// Pivot long-format samples. For a repeated (timestamp, channel) pair
    /// the first occurrence wins.
    pub fn pivot<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = RawSample>,
    {
        let mut rows: BTreeMap<DateTime<Utc>, BTreeMap<String, f64>> = BTreeMap::new();
        for sample in samples {
            rows.entry(sample.timestamp)
                .or_default()
                .entry(sample.channel)
                .or_insert(sample.value);
        }

        let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for cells in rows.values() {
            for channel in cells.keys() {
                if !columns.contains_key(channel) {
                    columns.insert(channel.clone(), Vec::with_capacity(rows.len()));
                }
            }
        }
        for cells in rows.values() {
            for (channel, column) in columns.iter_mut() {
                column.push(cells.get(channel).copied());
            }
        }

        Self {
            timestamps: rows.into_keys().collect(),
            columns,
        }
    }

    /// Forward-fill then backward-fill every column
    pub fn fill_gaps(&mut self) {
        for column in self.columns.values_mut() {
            let mut last = None;
            for cell in column.iter_mut() {
                match cell {
                    Some(v) => last = Some(*v),
                    None => *cell = last,
                }
            }
            let mut next = None;
            for cell in column.iter_mut().rev() {
                match cell {
                    Some(v) => next = Some(*v),
                    None => *cell = next,
                }
            }
        }
    }

    /// Number of rows (distinct timestamps)
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Row timestamps, ascending
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Channel names present, sorted
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Cells of one channel
    pub fn column(&self, channel: &str) -> Option<&[Option<f64>]> {
        self.columns.get(channel).map(Vec::as_slice)
    }

    /// Values of one channel after [`fill_gaps`](Self::fill_gaps).
    ///
    /// Every pivoted column holds at least one reading, so a filled column
    /// has no holes; the zero default is never observed in practice.
    pub fn filled_column(&self, channel: &str) -> Option<Vec<f64>> {
        self.column(channel)
            .map(|cells| cells.iter().map(|c| c.unwrap_or(0.0)).collect())
    }
}
