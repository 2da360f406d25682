use std::{
    future::Future,
    io,
    path::{Path, PathBuf},
    pin::pin,
};

use chrono::{NaiveDate, NaiveDateTime};
use futures_util::StreamExt;

use crate::{
    BackupError, Res,
    backup::snapshot::{DATE_STAMP_FORMAT, DATE_TIME_STAMP_FORMAT, SNAPSHOT_PREFIX, SNAPSHOT_SUFFIX},
    info,
};

/// Reads the date encoded in a snapshot file name, as midnight of that day.
///
/// Accepts `spotify_backup_<YYYY-MM-DD>.json` and the time-stamped
/// `spotify_backup_<YYYY-MM-DD_HH-MM-SS>.json`, whose time of day is dropped so
/// both forms age by calendar date. Anything else yields `None`.
pub fn parse_snapshot_stamp(file_name: &str) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_SUFFIX)?;

    let date = match NaiveDate::parse_from_str(stamp, DATE_STAMP_FORMAT) {
        Ok(date) => date,
        Err(_) => NaiveDateTime::parse_from_str(stamp, DATE_TIME_STAMP_FORMAT)
            .ok()?
            .date(),
    };
    date.and_hms_opt(0, 0, 0)
}

/// Deletes every snapshot in `dir` that is more than `retention_days` whole
/// days older than `now` and returns how many were deleted.
///
/// Age comes from the file name only. Files whose name does not carry a valid
/// stamp are left alone. The first failed deletion aborts the sweep.
pub async fn sweep(dir: &Path, retention_days: u32, now: NaiveDateTime) -> Res<usize> {
    sweep_with(dir, retention_days, now, |path| async move {
        async_fs::remove_file(path).await
    })
    .await
}

/// [`sweep`] with the file removal supplied by the caller.
pub async fn sweep_with<F, Fut>(
    dir: &Path,
    retention_days: u32,
    now: NaiveDateTime,
    mut remove: F,
) -> Res<usize>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let mut entries = pin!(async_fs::read_dir(dir).await?);
    let mut deleted = 0;

    while let Some(entry) = entries.next().await {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        let Some(stamped_at) = parse_snapshot_stamp(file_name) else {
            continue;
        };
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let age = (now - stamped_at).num_days();
        if age > i64::from(retention_days) {
            let path = entry.path();
            remove(path.clone())
                .await
                .map_err(|source| BackupError::Delete { path, source })?;
            deleted += 1;
            info!("Deleted old backup: {} ({} days old)", file_name, age);
        }
    }

    Ok(deleted)
}
