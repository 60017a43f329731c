pub mod artist_source;
pub mod catalog;
pub mod collector;
pub mod config;
pub mod consolidator;
pub mod error;
pub mod merger;
pub mod orchestrator;
pub mod rate_limiter;
pub mod resolver;
pub mod spotify;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use catalog::{
    AudioAttributes, CatalogArtist, CatalogClient, ReleaseRef, ReleaseType, ResolvedArtist,
    TrackDetail, TrackIdentity, TrackRecord, TrackStub,
};
pub use config::{Config, Settings};
pub use consolidator::{consolidate, ConsolidateOptions, ConsolidationSummary};
pub use error::{CatalogError, ConfigError, MergeError, StorageError};
pub use orchestrator::{ArtistOutcome, BatchOrchestrator, RunReport};
pub use rate_limiter::{BatchPacer, RateLimiter};
pub use spotify::SpotifyClient;
pub use store::ArtifactStore;
