use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that abort a backup run or a command.
///
/// Missing or malformed fields inside remote records are never errors; the
/// normalizer maps them to `null`. Undeliverable notifications are never
/// errors either; the notifier logs and drops them.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("authorization error: {0}")]
    Auth(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write snapshot {}: {source}", path.display())]
    Persist { path: PathBuf, source: io::Error },

    #[error("failed to delete old snapshot {}: {source}", path.display())]
    Delete { path: PathBuf, source: io::Error },
}
