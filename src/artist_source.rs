//! Artist name lists.
//!
//! Names come either from a music library export (a CSV with an artist
//! column) or from a plain list file produced earlier.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use crate::error::StorageError;

/// Column used by library exports for the album artist.
pub const DEFAULT_ARTIST_COLUMN: &str = "Album Artist";

/// Distinct, non-empty values of `column` in a library export, sorted ascending.
pub fn library_artists(path: &Path, column: &str) -> Result<Vec<String>, StorageError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| StorageError::csv(path, e))?;

    let headers = reader.headers().map_err(|e| StorageError::csv(path, e))?.clone();
    let index = headers.iter().position(|h| h.trim() == column).ok_or_else(|| {
        StorageError::io(
            path,
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no \"{}\" column in header", column),
            ),
        )
    })?;

    let mut artists = BTreeSet::new();
    for record in reader.records() {
        let record = record.map_err(|e| StorageError::csv(path, e))?;
        if let Some(value) = record.get(index) {
            let value = value.trim();
            if !value.is_empty() {
                artists.insert(value.to_string());
            }
        }
    }

    log::info!("{} artists found in {}", artists.len(), path.display());
    Ok(artists.into_iter().collect())
}

/// Read an artist list, preserving order and dropping blanks and repeats.
///
/// Accepts either a single-column CSV whose header is [`DEFAULT_ARTIST_COLUMN`]
/// (as written by [`write_artist_list`]) or one name per line.
pub fn read_artist_list(path: &Path) -> Result<Vec<String>, StorageError> {
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;

    let first_line = content.lines().next().unwrap_or_default().trim();
    let lines: Vec<String> = if first_line == DEFAULT_ARTIST_COLUMN {
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let mut names = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| StorageError::csv(path, e))?;
            names.push(record.get(0).unwrap_or_default().to_string());
        }
        names
    } else {
        content.lines().map(str::to_string).collect()
    };

    let mut seen = HashSet::new();
    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .filter(|l| seen.insert(l.clone()))
        .collect())
}

/// Write names as a single-column CSV with a header.
pub fn write_artist_list(path: &Path, names: &[String]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|e| StorageError::csv(path, e))?;
    writer
        .write_record([DEFAULT_ARTIST_COLUMN])
        .map_err(|e| StorageError::csv(path, e))?;
    for name in names {
        writer.write_record([name]).map_err(|e| StorageError::csv(path, e))?;
    }
    writer.flush().map_err(|e| StorageError::io(path, e))
}
