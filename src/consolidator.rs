//! Build the master dataset from all per-artist artifacts.

use std::collections::HashSet;
use std::path::Path;

use crate::error::StorageError;
use crate::store::{self, ArtifactStore};

#[derive(Debug, Clone, Default)]
pub struct ConsolidateOptions {
    /// Drop rows whose popularity is at or below this value.
    pub min_popularity: Option<u32>,
}

/// Counts reported after a consolidation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationSummary {
    pub artifacts: usize,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub below_popularity: usize,
    pub rows_written: usize,
}

/// Concatenate every artifact in store order, keep the first row per
/// track URI, and overwrite `master_path` with the result.
///
/// Which of two duplicate rows survives depends only on artifact order, which
/// the store keeps stable, so rerunning with unchanged artifacts rewrites the
/// same file.
///
/// A `master_path` directly inside the store directory is refused, since the
/// next run would read it back as an artifact.
pub fn consolidate(
    store: &ArtifactStore,
    master_path: &Path,
    options: &ConsolidateOptions,
) -> Result<ConsolidationSummary, StorageError> {
    if store.holds(master_path) {
        return Err(StorageError::MasterInsideStore {
            master: master_path.to_path_buf(),
            dir: store.dir().to_path_buf(),
        });
    }

    let artifacts = store.read_all()?;

    let mut summary = ConsolidationSummary {
        artifacts: artifacts.len(),
        ..Default::default()
    };
    let mut seen_uris = HashSet::new();
    let mut master = Vec::new();

    for (artist_name, rows) in artifacts {
        log::debug!("{}: {} rows", artist_name, rows.len());
        summary.rows_read += rows.len();

        for row in rows {
            if !seen_uris.insert(row.track_uri.clone()) {
                summary.duplicates_dropped += 1;
                continue;
            }
            if options.min_popularity.is_some_and(|floor| row.popularity <= floor) {
                summary.below_popularity += 1;
                continue;
            }
            master.push(row);
        }
    }

    summary.rows_written = master.len();
    store::write_records_atomically(master_path, &master)?;

    log::info!(
        "Master dataset: {} rows from {} artifacts ({} duplicates, {} below popularity floor) -> {}",
        summary.rows_written,
        summary.artifacts,
        summary.duplicates_dropped,
        summary.below_popularity,
        master_path.display()
    );
    Ok(summary)
}
