//! Spotify Web API implementation of [`CatalogClient`].
//!
//! Requests carry a bearer token obtained elsewhere (see
//! [`crate::config::load_access_token`]). Every request waits on a shared
//! [`RateLimiter`]; 429, 5xx and transport failures are retried up to
//! `max_attempts` times before surfacing as [`CatalogError::RetriesExhausted`].
//! A 404 on a single-resource lookup means "absent", not an error.

use std::cell::RefCell;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::catalog::{
    AudioAttributes, CatalogArtist, CatalogClient, ReleaseRef, ReleaseType, TrackDetail, TrackStub,
};
use crate::config::{self, Settings};
use crate::error::CatalogError;
use crate::rate_limiter::RateLimiter;
use crate::resolver::SEARCH_WINDOW;

const API_BASE: &str = "https://api.spotify.com/v1";
const USER_AGENT: &str = "catalog-harvest/0.1";
const PAGE_LIMIT: &str = "50";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Cap on a server-requested `Retry-After`.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

// ── API response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    tracks: Option<ApiPage<ApiSearchTrack>>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchTrack {
    #[serde(default)]
    artists: Vec<ApiArtist>,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    id: Option<String>,
    name: String,
}

/// First credited artist of a search result, if it has a catalog id.
fn primary_artist(track: ApiSearchTrack) -> Option<CatalogArtist> {
    let artist = track.artists.into_iter().next()?;
    Some(CatalogArtist {
        id: artist.id?,
        name: artist.name,
    })
}

#[derive(Debug, Deserialize)]
struct ApiPage<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next: Option<String>,
    #[allow(dead_code)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: Option<String>,
    name: String,
    uri: String,
    track_number: u32,
}

#[derive(Debug, Deserialize)]
struct ApiAudioFeatures {
    acousticness: f64,
    danceability: f64,
    energy: f64,
    instrumentalness: f64,
    liveness: f64,
    loudness: f64,
    speechiness: f64,
    tempo: f64,
    valence: f64,
}

#[derive(Debug, Deserialize)]
struct ApiFullTrack {
    popularity: u32,
    album: ApiTrackAlbum,
}

#[derive(Debug, Deserialize)]
struct ApiTrackAlbum {
    #[serde(default)]
    release_date: String,
}

// ── Client ───────────────────────────────────────────────────────────────────

pub struct SpotifyClient {
    agent: ureq::Agent,
    token: String,
    base_url: String,
    market: Option<String>,
    max_attempts: u32,
    rate_limiter: RefCell<RateLimiter>,
}

/// Outcome of one HTTP attempt.
enum Attempt<T> {
    Done(Option<T>),
    Retry { error: String, wait: Option<Duration> },
}

impl SpotifyClient {
    pub fn new(token: impl Into<String>, settings: &Settings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();

        SpotifyClient {
            agent,
            token: token.into(),
            base_url: API_BASE.to_string(),
            market: settings.market.clone(),
            max_attempts: settings.max_retries.max(1),
            rate_limiter: RefCell::new(RateLimiter::from_millis(
                "Spotify",
                settings.request_interval.as_millis() as u64,
            )),
        }
    }

    /// Build a client from the token found by [`config::load_access_token`].
    pub fn from_environment(settings: &Settings) -> Result<Self, CatalogError> {
        let token = config::load_access_token().ok_or(CatalogError::MissingCredentials)?;
        Ok(Self::new(token, settings))
    }

    /// Point the client at a different API root (e.g. a local mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET with retries. `Ok(None)` on 404.
    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<Option<T>, CatalogError> {
        let endpoint = endpoint_label(url);
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            self.rate_limiter.borrow_mut().wait_if_needed();
            log::debug!("GET {} (attempt {}/{})", endpoint, attempt, self.max_attempts);

            match self.attempt(url, query, &endpoint)? {
                Attempt::Done(value) => {
                    self.rate_limiter.borrow_mut().report_success();
                    return Ok(value);
                }
                Attempt::Retry { error, wait } => {
                    log::warn!("{}: {} (attempt {}/{})", endpoint, error, attempt, self.max_attempts);
                    let mut limiter = self.rate_limiter.borrow_mut();
                    match wait {
                        Some(delay) => limiter.defer(delay),
                        None => limiter.report_failure(),
                    }
                    last_error = error;
                }
            }
        }

        Err(CatalogError::RetriesExhausted {
            endpoint,
            attempts: self.max_attempts,
            last_error,
        })
    }

    fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        endpoint: &str,
    ) -> Result<Attempt<T>, CatalogError> {
        let mut request = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.token));
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => {
                let value = response.into_json::<T>().map_err(|source| CatalogError::Decode {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
                Ok(Attempt::Done(Some(value)))
            }
            Err(ureq::Error::Status(404, _)) => Ok(Attempt::Done(None)),
            Err(ureq::Error::Status(status, response)) if status == 429 || status >= 500 => {
                let wait = response
                    .header("Retry-After")
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER));
                Ok(Attempt::Retry {
                    error: format!("HTTP {}", status),
                    wait,
                })
            }
            Err(ureq::Error::Status(status, _)) => Err(CatalogError::Status {
                endpoint: endpoint.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(transport)) => Ok(Attempt::Retry {
                error: transport.to_string(),
                wait: None,
            }),
        }
    }

    /// Follow `next` links until the listing is exhausted.
    fn get_all_pages<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>, CatalogError> {
        let mut items = Vec::new();
        let first_url = self.endpoint_url(path);

        let mut page: ApiPage<T> = match self.get_json(&first_url, query)? {
            Some(page) => page,
            None => return Ok(items),
        };

        loop {
            items.extend(page.items);
            let next = match page.next {
                Some(next) => next,
                None => break,
            };
            // `next` already carries every query parameter.
            page = match self.get_json(&next, &[])? {
                Some(p) => p,
                None => break,
            };
        }

        Ok(items)
    }

    fn market_query<'a>(&'a self, query: &mut Vec<(&'a str, &'a str)>) {
        if let Some(market) = &self.market {
            query.push(("market", market.as_str()));
        }
    }
}

/// Path part of a URL for log and error messages (never includes the query).
fn endpoint_label(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    match without_query.find("/v1/") {
        Some(idx) => without_query[idx + 3..].to_string(),
        None => without_query.to_string(),
    }
}

impl CatalogClient for SpotifyClient {
    fn search(&self, query: &str) -> Result<Vec<Option<CatalogArtist>>, CatalogError> {
        let limit = SEARCH_WINDOW.to_string();
        let url = self.endpoint_url("/search");
        let response: Option<ApiSearchResponse> =
            self.get_json(&url, &[("q", query), ("type", "track"), ("limit", limit.as_str())])?;

        let tracks = response.and_then(|r| r.tracks).map(|p| p.items).unwrap_or_default();

        Ok(tracks.into_iter().map(primary_artist).collect())
    }

    fn list_releases(&self, artist_id: &str, release_type: ReleaseType) -> Result<Vec<ReleaseRef>, CatalogError> {
        let path = format!("/artists/{}/albums", artist_id);
        let mut query = vec![("include_groups", release_type.as_str()), ("limit", PAGE_LIMIT)];
        self.market_query(&mut query);

        let albums: Vec<ApiAlbum> = self.get_all_pages(&path, &query)?;
        Ok(albums
            .into_iter()
            .enumerate()
            .map(|(ordinal, a)| ReleaseRef {
                release_id: a.id,
                release_name: a.name,
                ordinal,
            })
            .collect())
    }

    fn list_tracks(&self, release_id: &str) -> Result<Vec<TrackStub>, CatalogError> {
        let path = format!("/albums/{}/tracks", release_id);
        let mut query = vec![("limit", PAGE_LIMIT)];
        self.market_query(&mut query);

        let tracks: Vec<ApiTrack> = self.get_all_pages(&path, &query)?;
        Ok(tracks
            .into_iter()
            // Local files have no id and cannot be looked up.
            .filter_map(|t| {
                Some(TrackStub {
                    id: t.id?,
                    name: t.name,
                    uri: t.uri,
                    track_number: t.track_number,
                })
            })
            .collect())
    }

    fn get_attributes(&self, track_id: &str) -> Result<Option<AudioAttributes>, CatalogError> {
        let url = self.endpoint_url(&format!("/audio-features/{}", track_id));
        // The service answers `null` as well as 404 for tracks without analysis.
        let features: Option<Option<ApiAudioFeatures>> = self.get_json(&url, &[])?;
        Ok(features.flatten().map(|f| AudioAttributes {
            acousticness: f.acousticness,
            danceability: f.danceability,
            energy: f.energy,
            instrumentalness: f.instrumentalness,
            liveness: f.liveness,
            loudness: f.loudness,
            speechiness: f.speechiness,
            tempo: f.tempo,
            valence: f.valence,
        }))
    }

    fn get_track_detail(&self, track_id: &str) -> Result<Option<TrackDetail>, CatalogError> {
        let url = self.endpoint_url(&format!("/tracks/{}", track_id));
        let mut query = Vec::new();
        self.market_query(&mut query);

        let track: Option<ApiFullTrack> = self.get_json(&url, &query)?;
        Ok(track.map(|t| TrackDetail {
            popularity: t.popularity,
            release_date: t.album.release_date,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_label_strips_host_and_query() {
        assert_eq!(
            endpoint_label("https://api.spotify.com/v1/artists/abc/albums?offset=50&limit=50"),
            "/artists/abc/albums"
        );
        assert_eq!(endpoint_label("http://localhost:9000/search"), "http://localhost:9000/search");
    }

    #[test]
    fn test_search_response_primary_artists() {
        let json = r#"{"tracks": {"items": [
            {"artists": [{"id": "a1", "name": "Tom Misch"}, {"id": "a2", "name": "Yussef Dayes"}]},
            {"artists": []},
            {"artists": [{"id": null, "name": "Local"}]}
        ], "next": null, "total": 3}}"#;
        let response: ApiSearchResponse = serde_json::from_str(json).unwrap();
        let items = response.tracks.unwrap().items;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].artists[0].name, "Tom Misch");
        assert!(items[2].artists[0].id.is_none());
    }

    #[test]
    fn test_unusable_results_keep_their_rank() {
        let json = r#"{"tracks": {"items": [
            {"artists": [{"id": null, "name": "Local"}]},
            {"artists": []},
            {"artists": [{"id": "bey", "name": "Beyoncé"}, {"id": "jay", "name": "Jay-Z"}]}
        ], "next": null, "total": 3}}"#;
        let response: ApiSearchResponse = serde_json::from_str(json).unwrap();
        let ranked: Vec<Option<CatalogArtist>> = response.tracks.unwrap().items.into_iter().map(primary_artist).collect();

        assert_eq!(ranked.len(), 3);
        assert!(ranked[0].is_none());
        assert!(ranked[1].is_none());
        assert_eq!(
            ranked[2],
            Some(CatalogArtist {
                id: "bey".to_string(),
                name: "Beyoncé".to_string()
            })
        );
    }

    #[test]
    fn test_page_decoding() {
        let json = r#"{"items": [{"id": "t1", "name": "Movie", "uri": "spotify:track:t1", "track_number": 4}],
                       "next": "https://api.spotify.com/v1/albums/x/tracks?offset=50&limit=50", "total": 51}"#;
        let page: ApiPage<ApiTrack> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items[0].track_number, 4);
        assert!(page.next.is_some());
    }

    #[test]
    fn test_null_audio_features_decode_to_none() {
        let features: Option<ApiAudioFeatures> = serde_json::from_str("null").unwrap();
        assert!(features.is_none());
    }

    #[test]
    fn test_full_track_decoding() {
        let json = r#"{"id": "t1", "popularity": 64, "album": {"name": "Geography", "release_date": "2018-04-06"}}"#;
        let track: ApiFullTrack = serde_json::from_str(json).unwrap();
        assert_eq!(track.popularity, 64);
        assert_eq!(track.album.release_date, "2018-04-06");
    }

    #[test]
    fn test_unreachable_server_exhausts_retries() {
        let settings = Settings {
            max_retries: 2,
            request_interval: Duration::ZERO,
            ..crate::config::Config::new().settings().unwrap()
        };
        // Port 9 (discard) on localhost is closed on test machines.
        let client = SpotifyClient::new("token", &settings).with_base_url("http://127.0.0.1:9");
        match client.search("Tom Misch") {
            Err(CatalogError::RetriesExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
