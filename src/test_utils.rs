//! In-memory catalog and record builders shared by the unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::catalog::{
    AudioAttributes, CatalogArtist, CatalogClient, ReleaseRef, ReleaseType, TrackDetail, TrackRecord,
    TrackStub,
};
use crate::error::CatalogError;

pub fn artist(id: &str, name: &str) -> CatalogArtist {
    CatalogArtist {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn stub(id: &str, name: &str, track_number: u32) -> TrackStub {
    TrackStub {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:track:{id}"),
        track_number,
    }
}

pub fn attributes(energy: f64) -> AudioAttributes {
    AudioAttributes {
        acousticness: 0.1,
        danceability: 0.5,
        energy,
        instrumentalness: 0.0,
        liveness: 0.2,
        loudness: -7.5,
        speechiness: 0.05,
        tempo: 120.0,
        valence: 0.6,
    }
}

pub fn record(artist_name: &str, track_name: &str, track_uri: &str) -> TrackRecord {
    TrackRecord {
        artist_name: artist_name.to_string(),
        album: "Album".to_string(),
        track_number: 1,
        track_id: track_uri.rsplit(':').next().unwrap_or(track_uri).to_string(),
        track_name: track_name.to_string(),
        track_uri: track_uri.to_string(),
        acousticness: 0.1,
        danceability: 0.5,
        energy: 0.8,
        instrumentalness: 0.0,
        liveness: 0.2,
        loudness: -7.5,
        speechiness: 0.05,
        tempo: 120.0,
        valence: 0.6,
        release_date: "2020-01-01".to_string(),
        popularity: 50,
    }
}

/// Scripted catalog that records every call it receives.
#[derive(Default)]
pub struct MockCatalog {
    pub search_results: HashMap<String, Vec<Option<CatalogArtist>>>,
    pub releases: HashMap<String, Vec<ReleaseRef>>,
    pub tracks: HashMap<String, Vec<TrackStub>>,
    pub attributes: HashMap<String, AudioAttributes>,
    pub details: HashMap<String, TrackDetail>,
    /// Track ids whose attribute lookup fails as if retries ran out.
    pub failing_tracks: HashSet<String>,
    /// Queries whose search fails as if retries ran out.
    pub failing_searches: HashSet<String>,
    /// Release ids whose track listing fails as if retries ran out.
    pub failing_releases: HashSet<String>,
    /// Track ids whose detail lookup fails as if retries ran out.
    pub failing_details: HashSet<String>,
    pub calls: RefCell<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artist whose search returns it as the single top hit,
    /// with one release per `(album, tracks)` pair. Every track gets
    /// attributes and detail.
    pub fn with_artist(mut self, id: &str, name: &str, albums: &[(&str, Vec<TrackStub>)]) -> Self {
        self.search_results.insert(name.to_string(), vec![Some(artist(id, name))]);
        let mut releases = Vec::new();
        for (ordinal, (album, tracks)) in albums.iter().enumerate() {
            let release_id = format!("{id}-r{ordinal}");
            releases.push(ReleaseRef {
                release_id: release_id.clone(),
                release_name: album.to_string(),
                ordinal,
            });
            for t in tracks {
                self.attributes.insert(t.id.clone(), attributes(0.8));
                self.details.insert(
                    t.id.clone(),
                    TrackDetail {
                        popularity: 50,
                        release_date: "2020-01-01".to_string(),
                    },
                );
            }
            self.tracks.insert(release_id, tracks.clone());
        }
        self.releases.insert(id.to_string(), releases);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn exhausted(endpoint: String) -> CatalogError {
        CatalogError::RetriesExhausted {
            endpoint,
            attempts: 3,
            last_error: "HTTP 503".to_string(),
        }
    }
}

impl CatalogClient for MockCatalog {
    fn search(&self, query: &str) -> Result<Vec<Option<CatalogArtist>>, CatalogError> {
        self.log(format!("search:{query}"));
        if self.failing_searches.contains(query) {
            return Err(Self::exhausted(format!("search:{query}")));
        }
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    fn list_releases(&self, artist_id: &str, release_type: ReleaseType) -> Result<Vec<ReleaseRef>, CatalogError> {
        self.log(format!("releases:{artist_id}:{}", release_type.as_str()));
        Ok(self.releases.get(artist_id).cloned().unwrap_or_default())
    }

    fn list_tracks(&self, release_id: &str) -> Result<Vec<TrackStub>, CatalogError> {
        self.log(format!("tracks:{release_id}"));
        if self.failing_releases.contains(release_id) {
            return Err(Self::exhausted(format!("tracks:{release_id}")));
        }
        Ok(self.tracks.get(release_id).cloned().unwrap_or_default())
    }

    fn get_attributes(&self, track_id: &str) -> Result<Option<AudioAttributes>, CatalogError> {
        self.log(format!("attributes:{track_id}"));
        if self.failing_tracks.contains(track_id) {
            return Err(Self::exhausted(format!("attributes:{track_id}")));
        }
        Ok(self.attributes.get(track_id).copied())
    }

    fn get_track_detail(&self, track_id: &str) -> Result<Option<TrackDetail>, CatalogError> {
        self.log(format!("detail:{track_id}"));
        if self.failing_details.contains(track_id) {
            return Err(Self::exhausted(format!("detail:{track_id}")));
        }
        Ok(self.details.get(track_id).cloned())
    }
}
