//! Durable serial → location store.
//!
//! The backing file is a header-less CSV (`,` delimiter, `|` quote) with the columns of
//! [`LocationRecord`]. It is read once at startup and only ever appended to: a record is written
//! and synced to disk before it becomes visible in memory.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use invsync_common::inventory::location::LocationRecord;
use thiserror::Error;
use tracing::{debug, warn};

const DELIMITER: u8 = b',';
const QUOTE: u8 = b'|';

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("location cache I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("location cache record is malformed: {0}")]
    Csv(#[from] csv::Error),
}

pub struct LocationCache {
    path: PathBuf,
    records: HashMap<String, LocationRecord>,
}

impl LocationCache {
    /// Loads the cache at `path`.
    ///
    /// A missing file is an empty cache. An unreadable or malformed file also degrades to an
    /// empty cache (with a warning) rather than failing the run; new records are still appended.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match read_records(&path) {
            Ok(records) => {
                debug!("Loaded {} cached locations from {}", records.len(), path.display());
                records
            }
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No location cache at {}, starting empty", path.display());
                HashMap::new()
            }
            Err(e) => {
                warn!("Ignoring location cache {}: {e}", path.display());
                HashMap::new()
            }
        };

        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, serial: &str) -> Option<&LocationRecord> {
        self.records.get(serial)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persists `record` and returns the cached entry for its serial.
    ///
    /// Entries are immutable: if the serial is already cached, nothing is written and the
    /// existing record is returned.
    pub fn append(&mut self, record: LocationRecord) -> Result<&LocationRecord, CacheError> {
        match self.records.entry(record.serial.clone()) {
            Entry::Occupied(entry) => Ok(&*entry.into_mut()),
            Entry::Vacant(entry) => {
                write_record(&self.path, &record)?;
                Ok(&*entry.insert(record))
            }
        }
    }
}

fn read_records(path: &Path) -> Result<HashMap<String, LocationRecord>, CacheError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .from_reader(file);

    let mut records = HashMap::new();
    for row in reader.deserialize::<LocationRecord>() {
        let record = row?;
        records.entry(record.serial.clone()).or_insert(record);
    }
    Ok(records)
}

fn write_record(path: &Path, record: &LocationRecord) -> Result<(), CacheError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(DELIMITER)
        .quote(QUOTE)
        .from_writer(file);

    writer.serialize(record)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_data()?;
    Ok(())
}
