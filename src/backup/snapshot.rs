use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::{
    BackupError, Res,
    backup::{BackupSettings, BackupSummary, LibrarySource, fetch_all, normalize_tracks, sweep},
    clock::Clock,
    info,
    types::{BackupInfo, PlaylistRecord, SnapshotDocument},
    warning,
};

pub const SNAPSHOT_PREFIX: &str = "spotify_backup_";
pub const SNAPSHOT_SUFFIX: &str = ".json";

pub const SAVED_TRACKS_PAGE_LIMIT: u32 = 50;
pub const PLAYLISTS_PAGE_LIMIT: u32 = 50;
pub const PLAYLIST_ITEMS_PAGE_LIMIT: u32 = 100;

/// Number of user playlists vaulted in fast mode.
pub const FAST_MODE_PLAYLIST_LIMIT: usize = 2;

pub const DATE_STAMP_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn snapshot_stamp(at: NaiveDateTime, include_time: bool) -> String {
    let format = if include_time {
        DATE_TIME_STAMP_FORMAT
    } else {
        DATE_STAMP_FORMAT
    };
    at.format(format).to_string()
}

pub fn snapshot_file_name(stamp: &str) -> String {
    format!("{SNAPSHOT_PREFIX}{stamp}{SNAPSHOT_SUFFIX}")
}

/// Fetches and normalizes the whole library into a [`SnapshotDocument`].
///
/// Liked songs come first, then every playlist in listing order. Playlists
/// owned by Spotify are skipped; in fast mode only the first
/// [`FAST_MODE_PLAYLIST_LIMIT`] user playlists are vaulted.
pub async fn build_snapshot<S: LibrarySource>(
    source: &mut S,
    settings: &BackupSettings,
    stamp: String,
) -> Res<SnapshotDocument> {
    info!("Fetching Liked Songs...");
    let first = source.saved_tracks(SAVED_TRACKS_PAGE_LIMIT).await?;
    let liked = fetch_all(source, first, settings.fast_mode).await?;
    let liked_songs = normalize_tracks(liked);

    info!("Fetching Playlists...");
    let first = source.playlists(PLAYLISTS_PAGE_LIMIT).await?;
    let listed = fetch_all(source, first, settings.fast_mode).await?;

    let mut playlists: Vec<PlaylistRecord> = Vec::new();
    for playlist in listed {
        if playlist.is_platform_owned() {
            continue;
        }
        if settings.fast_mode && playlists.len() >= FAST_MODE_PLAYLIST_LIMIT {
            info!(
                "   [Test Mode] Stopping after {} playlists.",
                FAST_MODE_PLAYLIST_LIMIT
            );
            break;
        }

        info!(
            "   Vaulting Playlist: {}",
            playlist.name.as_deref().unwrap_or(&playlist.id)
        );
        let first = source
            .playlist_items(&playlist.id, PLAYLIST_ITEMS_PAGE_LIMIT)
            .await?;
        let items = fetch_all(source, first, settings.fast_mode).await?;

        playlists.push(PlaylistRecord {
            name: playlist.name,
            id: playlist.id,
            description: playlist.description,
            tracks: normalize_tracks(items),
        });
    }

    Ok(SnapshotDocument {
        backup_info: BackupInfo {
            date: stamp,
            is_test: settings.fast_mode,
        },
        liked_songs,
        playlists,
    })
}

/// Serializes `document` with four-space indentation, leaving non-ASCII text
/// unescaped.
pub fn render_snapshot(document: &SnapshotDocument) -> Res<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    Ok(buf)
}

/// Writes `document` to `<dir>/<file_name>` in one step.
///
/// The body goes to a hidden temporary file in the same directory first and is
/// renamed into place, so a failed write never leaves a torn snapshot behind.
pub async fn write_snapshot(
    dir: &Path,
    file_name: &str,
    document: &SnapshotDocument,
) -> Res<PathBuf> {
    let body = render_snapshot(document)?;
    let path = dir.join(file_name);
    let tmp_path = dir.join(format!(".{file_name}.tmp"));

    let persist = |source| BackupError::Persist {
        path: path.clone(),
        source,
    };

    async_fs::create_dir_all(dir).await.map_err(persist)?;

    // Leftover of an interrupted run.
    match async_fs::remove_file(&tmp_path).await {
        Ok(()) => warning!("Removed stale temporary file {}", tmp_path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(persist(e)),
    }

    if let Err(e) = async_fs::write(&tmp_path, &body).await {
        let _ = async_fs::remove_file(&tmp_path).await;
        return Err(persist(e));
    }
    if let Err(e) = async_fs::rename(&tmp_path, &path).await {
        let _ = async_fs::remove_file(&tmp_path).await;
        return Err(persist(e));
    }

    Ok(path)
}

/// Builds, persists and prunes: the whole run minus notification.
///
/// The run timestamp is read from `clock` exactly once and used for the
/// document, the file name and the retention cutoff.
pub async fn run_backup<S, C>(
    source: &mut S,
    clock: &C,
    settings: &BackupSettings,
) -> Res<BackupSummary>
where
    S: LibrarySource,
    C: Clock,
{
    let started_at = clock.now();
    let stamp = snapshot_stamp(started_at, settings.include_time);

    if settings.fast_mode {
        info!("[{}] Starting QUICK TEST backup...", stamp);
    } else {
        info!("[{}] Starting backup...", stamp);
    }

    let document = build_snapshot(source, settings, stamp.clone()).await?;
    let path = write_snapshot(
        &settings.backup_dir,
        &snapshot_file_name(&stamp),
        &document,
    )
    .await?;
    info!("Snapshot written to {}", path.display());

    let deleted_files = sweep(&settings.backup_dir, settings.retention_days, started_at).await?;

    Ok(BackupSummary {
        stamp,
        path,
        liked_songs: document.liked_songs.len(),
        playlists: document.playlists.len(),
        deleted_files,
        elapsed: Duration::ZERO,
        test_mode: settings.fast_mode,
    })
}
