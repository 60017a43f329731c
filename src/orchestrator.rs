//! End-to-end collection over a list of artist names.
//!
//! The run is resumable: an artist whose artifact already exists is skipped
//! without touching the catalog. Nothing is written for an artist that could
//! not be resolved or produced no rows, so the next run retries it.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::catalog::{CatalogClient, TrackRecord};
use crate::collector;
use crate::merger;
use crate::rate_limiter::BatchPacer;
use crate::resolver;
use crate::store::ArtifactStore;

/// What happened to one artist during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtistOutcome {
    /// An artifact already existed.
    Skipped,
    /// No acceptable catalog match.
    NotFound,
    Collected {
        rows: usize,
        /// Tracks dropped because attributes or detail could not be fetched.
        dropped: usize,
        path: PathBuf,
    },
    /// Resolved, but no track survived merging.
    Empty { dropped: usize },
    /// A catalog or storage failure ended this artist's iteration.
    Failed { reason: String },
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(String, ArtistOutcome)>,
}

impl RunReport {
    fn count(&self, pred: impl Fn(&ArtistOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }

    pub fn collected(&self) -> usize {
        self.count(|o| matches!(o, ArtistOutcome::Collected { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ArtistOutcome::Skipped))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, ArtistOutcome::NotFound))
    }

    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, ArtistOutcome::Empty { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ArtistOutcome::Failed { .. }))
    }

    pub fn rows_written(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                ArtistOutcome::Collected { rows, .. } => *rows,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, artist_name: &str) -> Option<&ArtistOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == artist_name)
            .map(|(_, o)| o)
    }
}

/// Drives resolve → collect → merge → persist for each artist.
pub struct BatchOrchestrator<C> {
    client: C,
    store: ArtifactStore,
    pacer: BatchPacer,
}

impl<C: CatalogClient> BatchOrchestrator<C> {
    pub fn new(client: C, store: ArtifactStore, pacer: BatchPacer) -> Self {
        BatchOrchestrator { client, store, pacer }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Process every name in order. Never fails: each problem is logged and
    /// confined to the artist or track it concerns.
    pub fn run<S: AsRef<str>>(&mut self, artist_names: &[S]) -> RunReport {
        let mut report = RunReport::default();
        let total = artist_names.len();

        for (i, name) in artist_names.iter().enumerate() {
            let name = name.as_ref();
            log::info!("[{}/{}] {}", i + 1, total, name);

            if self.store.exists(name) {
                log::info!("{}: already collected, skipping", name);
                report.outcomes.push((name.to_string(), ArtistOutcome::Skipped));
                continue;
            }

            let outcome = self.process_artist(name);
            report.outcomes.push((name.to_string(), outcome));
            self.pacer.tick();
        }

        log::info!(
            "Run finished: {} collected ({} rows), {} skipped, {} not found, {} empty, {} failed",
            report.collected(),
            report.rows_written(),
            report.skipped(),
            report.not_found(),
            report.empty(),
            report.failed()
        );
        report
    }

    fn process_artist(&self, name: &str) -> ArtistOutcome {
        let artist = match resolver::resolve(&self.client, name) {
            Ok(Some(artist)) => artist,
            Ok(None) => {
                log::warn!("{}: no matching artist in the catalog, skipping", name);
                return ArtistOutcome::NotFound;
            }
            Err(e) => {
                log::error!("{}: resolution failed: {}", name, e);
                return ArtistOutcome::Failed { reason: e.to_string() };
            }
        };

        let identities = match collector::collect(&self.client, &artist) {
            Ok(identities) => identities,
            Err(e) => {
                log::error!("{}: listing tracks failed: {}", name, e);
                return ArtistOutcome::Failed { reason: e.to_string() };
            }
        };

        let mut rows = Vec::with_capacity(identities.len());
        let mut dropped = 0;
        for identity in identities {
            let track_name = identity.track_name.clone();
            match merger::merge(&self.client, identity) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    log::warn!("{}: dropping \"{}\": {}", name, track_name, e);
                    dropped += 1;
                }
            }
        }

        let rows = dedup_by_track_name(rows);

        if rows.is_empty() {
            log::warn!("{}: no tracks collected, nothing written", name);
            return ArtistOutcome::Empty { dropped };
        }

        match self.store.write(name, &rows) {
            Ok(path) => {
                log::info!("{}: wrote {} tracks to {}", name, rows.len(), path.display());
                ArtistOutcome::Collected {
                    rows: rows.len(),
                    dropped,
                    path,
                }
            }
            Err(e) => {
                log::error!("{}: could not write artifact: {}", name, e);
                ArtistOutcome::Failed { reason: e.to_string() }
            }
        }
    }
}

/// Keep the first row for each track name, preserving order.
///
/// Per-artist dedup is by *name*; the master dataset dedups by URI instead.
pub fn dedup_by_track_name(rows: Vec<TrackRecord>) -> Vec<TrackRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| seen.insert(r.track_name.clone()))
        .collect()
}
