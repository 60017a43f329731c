//! Error types for the collection pipeline.
//!
//! Each type maps to the smallest unit it can fail: a [`MergeError`] costs one
//! track, a [`CatalogError`] costs the track or artist that was being fetched,
//! and a [`StorageError`] costs one artist's artifact.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The client gave up after its bounded number of attempts.
    #[error("{endpoint}: gave up after {attempts} attempt(s): {last_error}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last_error: String,
    },

    /// A non-retryable HTTP status (anything but 404, 429 and 5xx).
    #[error("{endpoint}: HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint}: malformed response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no catalog credentials found (set SPOTIFY_ACCESS_TOKEN or create catalog_credentials.toml)")]
    MissingCredentials,
}

/// Failure assembling a complete row for one track.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("no audio attributes for track {0}")]
    MissingAttributes(String),

    #[error("no track detail for track {0}")]
    MissingDetail(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Failure reading or writing artifact files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("master dataset {} must not be inside the artifact directory {}", .master.display(), .dir.display())]
    MasterInsideStore { master: PathBuf, dir: PathBuf },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StorageError::Csv {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HOME environment variable not set")]
    NoHome,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    #[error("pause range is inverted: min {min}s > max {max}s")]
    InvalidPauseRange { min: f64, max: f64 },

    #[error("master dataset {} must not be inside the artifact directory {}", .master.display(), .dir.display())]
    MasterInsideArtifactDir { master: PathBuf, dir: PathBuf },
}
