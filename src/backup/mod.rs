//! # Backup Pipeline
//!
//! One backup run flows strictly forward through four stages:
//!
//! ```text
//! Collection Fetcher   (fetch.rs)      page through a listing until exhausted
//!          ↓
//! Record Normalizer    (normalize.rs)  raw wrapper → TrackRecord, or nothing
//!          ↓
//! Snapshot Builder     (snapshot.rs)   assemble the document, write it atomically
//!          ↓
//! Retention Sweeper    (retention.rs)  delete snapshots older than the window
//!          ↓
//! Notifier             (crate::notify) report the outcome, never fails the run
//! ```
//!
//! All remote access goes through the [`LibrarySource`] trait so the pipeline
//! can run against the real Web API client or an in-memory fake. Pagination is
//! strictly sequential with a fixed pause between page requests, because the
//! rate limit is per credential and the API does not define concurrent use of
//! a cursor.

mod fetch;
mod normalize;
mod retention;
mod snapshot;

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use serde::de::DeserializeOwned;

pub use fetch::{PAGE_DELAY, fetch_all};
pub use normalize::{join_artists, normalize_track, normalize_tracks};
pub use retention::{parse_snapshot_stamp, sweep, sweep_with};
pub use snapshot::{
    FAST_MODE_PLAYLIST_LIMIT, PLAYLIST_ITEMS_PAGE_LIMIT, PLAYLISTS_PAGE_LIMIT,
    SAVED_TRACKS_PAGE_LIMIT, SNAPSHOT_PREFIX, SNAPSHOT_SUFFIX, build_snapshot, render_snapshot,
    run_backup, snapshot_file_name, snapshot_stamp, write_snapshot,
};

use crate::{
    BackupError, Res,
    clock::Clock,
    notify::Notifier,
    types::{Page, RawPlaylist, SavedItem},
    utils,
};

/// Paged listing capability of the remote service.
///
/// Every method returns one page; [`LibrarySource::next_page`] follows the
/// cursor of a previously returned page. Page sizes passed in are the maxima
/// the endpoints accept.
#[allow(async_fn_in_trait)]
pub trait LibrarySource {
    /// First page of the current user's saved tracks.
    async fn saved_tracks(&mut self, limit: u32) -> Res<Page<SavedItem>>;

    /// First page of the current user's playlists.
    async fn playlists(&mut self, limit: u32) -> Res<Page<RawPlaylist>>;

    /// First page of the items of one playlist.
    async fn playlist_items(&mut self, playlist_id: &str, limit: u32) -> Res<Page<SavedItem>>;

    /// The page following `page`. Callers only invoke this when `page.next` is set.
    async fn next_page<T: DeserializeOwned>(&mut self, page: &Page<T>) -> Res<Page<T>>;
}

/// Per-run settings of the pipeline, derived from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub backup_dir: PathBuf,
    pub retention_days: u32,
    /// Skip pagination and stop after a couple of playlists. Validation runs only.
    pub fast_mode: bool,
    /// Append the time of day to the snapshot stamp.
    pub include_time: bool,
}

/// Counts reported after a successful run.
#[derive(Debug, Clone)]
pub struct BackupSummary {
    pub stamp: String,
    pub path: PathBuf,
    pub liked_songs: usize,
    pub playlists: usize,
    pub deleted_files: usize,
    pub elapsed: Duration,
    pub test_mode: bool,
}

impl BackupSummary {
    pub fn message(&self) -> String {
        let title = if self.test_mode {
            "**Spotify TEST Backup Successful**"
        } else {
            "**Spotify Backup Successful**"
        };

        format!(
            "{title} ✅\n📅 Date: {date}\n🎵 Liked Songs: {liked}\n📂 Playlists: {playlists}\n🗑️ Cleaned: {deleted}\n⏱️ Time: {elapsed}s",
            title = title,
            date = self.stamp,
            liked = self.liked_songs,
            playlists = self.playlists,
            deleted = self.deleted_files,
            elapsed = utils::format_seconds(self.elapsed),
        )
    }
}

pub fn failure_message(err: &BackupError) -> String {
    format!("**Spotify Backup FAILED** ❌\n🚨 Error: `{}`", err)
}

/// Runs one complete backup and reports the outcome to `notifier`.
///
/// The notification is best effort in both directions: a success is returned
/// even when the notifier cannot deliver, and a failure is returned unchanged
/// after the failure message has been attempted.
pub async fn execute<S, N, C>(
    source: &mut S,
    notifier: &N,
    clock: &C,
    settings: &BackupSettings,
) -> Res<BackupSummary>
where
    S: LibrarySource,
    N: Notifier,
    C: Clock,
{
    let started = Instant::now();

    match run_backup(source, clock, settings).await {
        Ok(mut summary) => {
            summary.elapsed = started.elapsed();
            let message = summary.message();
            notifier.notify(&message).await;
            Ok(summary)
        }
        Err(e) => {
            notifier.notify(&failure_message(&e)).await;
            Err(e)
        }
    }
}
