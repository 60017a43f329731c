//! Enumerate every album track of a resolved artist.

use crate::catalog::{CatalogClient, ReleaseType, ResolvedArtist, TrackIdentity};
use crate::error::CatalogError;

/// List the artist's albums and their tracks, in release order then in the
/// order the catalog lists each release's tracks.
///
/// Each identity carries the resolved (canonical) artist name and the release
/// name. Releases without tracks contribute nothing.
pub fn collect<C: CatalogClient + ?Sized>(
    client: &C,
    artist: &ResolvedArtist,
) -> Result<Vec<TrackIdentity>, CatalogError> {
    let releases = client.list_releases(&artist.canonical_id, ReleaseType::Album)?;
    log::info!("{}: {} album(s)", artist.canonical_name, releases.len());

    let mut identities = Vec::new();

    for release in &releases {
        // Listed order; track numbers restart on each disc.
        let tracks = client.list_tracks(&release.release_id)?;

        log::debug!(
            "  [{}] {} ({} tracks)",
            release.ordinal + 1,
            release.release_name,
            tracks.len()
        );

        identities.extend(tracks.into_iter().map(|t| TrackIdentity {
            artist_name: artist.canonical_name.clone(),
            album: release.release_name.clone(),
            track_number: t.track_number,
            track_id: t.id,
            track_name: t.name,
            track_uri: t.uri,
        }));
    }

    Ok(identities)
}
