//! Assemble a complete [`TrackRecord`] from a track identity.

use crate::catalog::{CatalogClient, TrackIdentity, TrackRecord};
use crate::error::MergeError;

/// Fetch attributes and detail for the track and merge them into one row.
///
/// Both records are required; a track missing either one is rejected rather
/// than written with partial data.
pub fn merge<C: CatalogClient + ?Sized>(client: &C, identity: TrackIdentity) -> Result<TrackRecord, MergeError> {
    let attributes = client
        .get_attributes(&identity.track_id)?
        .ok_or_else(|| MergeError::MissingAttributes(identity.track_id.clone()))?;

    let detail = client
        .get_track_detail(&identity.track_id)?
        .ok_or_else(|| MergeError::MissingDetail(identity.track_id.clone()))?;

    Ok(TrackRecord::from_parts(identity, &attributes, detail))
}
