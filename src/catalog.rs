//! Catalog data types and the [`CatalogClient`] trait.
//!
//! The pipeline only ever talks to the catalog through [`CatalogClient`]; the
//! HTTP implementation lives in [`crate::spotify`], tests use an in-memory one.

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

// ── Catalog-side types ───────────────────────────────────────────────────────

/// The primary artist attached to a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

/// Release grouping requested when listing an artist's catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl ReleaseType {
    /// Name used by the catalog service's `include_groups` filter.
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseType::Album => "album",
            ReleaseType::Single => "single",
            ReleaseType::AppearsOn => "appears_on",
            ReleaseType::Compilation => "compilation",
        }
    }
}

/// An artist name that has been matched to a catalog entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtist {
    pub canonical_id: String,
    pub canonical_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRef {
    pub release_id: String,
    pub release_name: String,
    /// Position in the artist's release listing (0-based).
    pub ordinal: usize,
}

/// Minimal per-track identity as listed on a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackStub {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub track_number: u32,
}

/// Numeric audio characteristics for one track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioAttributes {
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
}

/// Per-track metadata that is not part of the release listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackDetail {
    pub popularity: u32,
    /// Release date of the parent release, as reported by the service.
    pub release_date: String,
}

// ── Pipeline records ─────────────────────────────────────────────────────────

/// Identity fields of a track, before attributes and detail are merged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackIdentity {
    pub artist_name: String,
    pub album: String,
    pub track_number: u32,
    pub track_id: String,
    pub track_name: String,
    pub track_uri: String,
}

/// One output row. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub artist_name: String,
    pub album: String,
    pub track_number: u32,
    pub track_id: String,
    pub track_name: String,
    pub track_uri: String,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub loudness: f64,
    pub speechiness: f64,
    pub tempo: f64,
    pub valence: f64,
    pub release_date: String,
    pub popularity: u32,
}

impl TrackRecord {
    pub fn from_parts(identity: TrackIdentity, attributes: &AudioAttributes, detail: TrackDetail) -> Self {
        TrackRecord {
            artist_name: identity.artist_name,
            album: identity.album,
            track_number: identity.track_number,
            track_id: identity.track_id,
            track_name: identity.track_name,
            track_uri: identity.track_uri,
            acousticness: attributes.acousticness,
            danceability: attributes.danceability,
            energy: attributes.energy,
            instrumentalness: attributes.instrumentalness,
            liveness: attributes.liveness,
            loudness: attributes.loudness,
            speechiness: attributes.speechiness,
            tempo: attributes.tempo,
            valence: attributes.valence,
            release_date: detail.release_date,
            popularity: detail.popularity,
        }
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

/// Call surface over the external catalog service.
///
/// Implementations own retries and pagination: list calls return fully
/// materialized results, and transient failures surface only once the retry
/// budget is spent, as [`CatalogError::RetriesExhausted`].
pub trait CatalogClient {
    /// General search; one entry per ranked result, best first.
    ///
    /// An entry is the result's primary artist, or `None` when the result has
    /// no usable one. Entries are never dropped, so positions match the
    /// service's ranking.
    fn search(&self, query: &str) -> Result<Vec<Option<CatalogArtist>>, CatalogError>;

    /// All releases of the given type for an artist, in catalog order.
    fn list_releases(
        &self,
        artist_id: &str,
        release_type: ReleaseType,
    ) -> Result<Vec<ReleaseRef>, CatalogError>;

    /// All tracks on a release, in the order the catalog lists them (disc by disc).
    fn list_tracks(&self, release_id: &str) -> Result<Vec<TrackStub>, CatalogError>;

    /// Returns `Ok(None)` when the service has no attributes for the track.
    fn get_attributes(&self, track_id: &str) -> Result<Option<AudioAttributes>, CatalogError>;

    /// Returns `Ok(None)` when the track is unknown (e.g. delisted).
    fn get_track_detail(&self, track_id: &str) -> Result<Option<TrackDetail>, CatalogError>;
}
