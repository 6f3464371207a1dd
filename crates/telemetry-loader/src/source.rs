//! Telemetry Sources

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::LoaderError;

/// File name suffix of a raw telemetry export
const TELEMETRY_SUFFIX: &str = "telemetry_data.csv";

/// Something a long-format telemetry stream can be read from.
///
/// Every scan reopens the source, so discovery and loading never share
/// reader state.
pub trait TelemetrySource {
    /// Human-readable name used in errors and logs
    fn name(&self) -> String;

    /// Open a fresh reader positioned at the start of the stream
    fn open(&self) -> Result<Box<dyn Read + '_>, LoaderError>;
}

/// Telemetry CSV on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for a file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, LoaderError> {
        let file = File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LoaderError::SourceNotFound(self.name()),
            _ => LoaderError::Io {
                source_name: self.name(),
                message: e.to_string(),
            },
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Telemetry held in memory (tests, embedded callers)
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    /// Create a named in-memory source
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl TelemetrySource for MemorySource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, LoaderError> {
        Ok(Box::new(self.data.as_slice()))
    }
}

/// Find the telemetry export in a data directory.
///
/// Matches `*telemetry_data.csv` case-insensitively, first among the
/// directory's own files, then recursively through its subdirectories.
/// Candidates are visited in sorted order so the pick is stable.
pub fn locate_telemetry(dir: &Path) -> Result<PathBuf, LoaderError> {
    if !dir.is_dir() {
        return Err(LoaderError::SourceNotFound(dir.display().to_string()));
    }

    let io_error = |e: io::Error| LoaderError::Io {
        source_name: dir.display().to_string(),
        message: e.to_string(),
    };

    let (files, subdirs) = sorted_entries(dir).map_err(io_error)?;
    if let Some(found) = files.into_iter().find(|p| is_telemetry_file(p)) {
        info!("Telemetry detected: {}", found.display());
        return Ok(found);
    }

    let mut stack: Vec<PathBuf> = subdirs.into_iter().rev().collect();
    while let Some(next) = stack.pop() {
        debug!("Searching {}", next.display());
        let (files, subdirs) = sorted_entries(&next).map_err(io_error)?;
        if let Some(found) = files.into_iter().find(|p| is_telemetry_file(p)) {
            info!("Telemetry detected: {}", found.display());
            return Ok(found);
        }
        stack.extend(subdirs.into_iter().rev());
    }

    Err(LoaderError::SourceNotFound(format!(
        "no *{} under {}",
        TELEMETRY_SUFFIX,
        dir.display()
    )))
}

fn is_telemetry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_ascii_lowercase().ends_with(TELEMETRY_SUFFIX))
        .unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut files = Vec::new();
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            subdirs.push(path);
        } else {
            files.push(path);
        }
    }
    files.sort();
    subdirs.sort();
    Ok((files, subdirs))
}
