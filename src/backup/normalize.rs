use crate::types::{RawArtist, SavedItem, TrackRecord};

/// Maps one saved-track or playlist-item wrapper to a [`TrackRecord`].
///
/// Returns `None` when the wrapper carries no track, which is how the API
/// reports removed or unavailable tracks. Any other missing field becomes
/// `null` in the record.
pub fn normalize_track(item: SavedItem) -> Option<TrackRecord> {
    let track = item.track?;
    let (album, release_date) = match track.album {
        Some(album) => (album.name, album.release_date),
        None => (None, None),
    };

    Some(TrackRecord {
        name: track.name,
        artist: join_artists(track.artists.as_deref().unwrap_or_default()),
        album,
        release_date,
        isrc: track.external_ids.and_then(|ids| ids.isrc),
        uri: track.uri,
        added_at: item.added_at,
        duration_ms: track.duration_ms,
        explicit: track.explicit,
    })
}

pub fn normalize_tracks(items: Vec<SavedItem>) -> Vec<TrackRecord> {
    items.into_iter().filter_map(normalize_track).collect()
}

/// Display string of all artist names in source order, separated by `", "`.
pub fn join_artists(artists: &[RawArtist]) -> String {
    artists
        .iter()
        .filter_map(|a| a.name.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}
