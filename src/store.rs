//! Flat-file persistence for the canonical roster and derived artifacts.
//!
//! Supports append (pure additions), full overwrite (structural changes)
//! and header-first artifact writes.

use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, RosterError};
use crate::schema::{Column, StudentRecord};

/// Appends records to the canonical file.
///
/// Creates the file with headers if it does not already exist.
#[tracing::instrument(skip(path, records), fields(path = %path.display(), count = records.len()))]
pub fn append_records(path: &Path, records: &[StudentRecord]) -> Result<()> {
    let file_exists = path.exists();
    debug!(file_exists, "Appending roster records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if !file_exists {
        writer.write_record(Column::header())?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Data saved");
    Ok(())
}

/// Rewrites the canonical file from scratch, header included.
#[tracing::instrument(skip(path, records), fields(path = %path.display(), count = records.len()))]
pub fn write_records(path: &Path, records: &[StudentRecord]) -> Result<()> {
    write_rows(path, &Column::header(), records)?;
    info!("Roster rewritten");
    Ok(())
}

/// Writes `header` followed by one serialized row per item, replacing any
/// existing file. Missing parent directories are created.
///
/// Every failure is reported as [`RosterError::WriteFailure`] naming `path`.
pub fn write_rows<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| RosterError::write_failure(path, e))?;
    }

    let file = File::create(path).map_err(|e| RosterError::write_failure(path, e))?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    writer
        .write_record(header)
        .map_err(|e| RosterError::write_failure(path, e))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| RosterError::write_failure(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| RosterError::write_failure(path, e))?;

    debug!(path = %path.display(), rows = rows.len(), "Rows written");
    Ok(())
}
