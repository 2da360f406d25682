//! Configuration management for Spotify Library Backup.
//!
//! Configuration is resolved once at startup into a [`Config`] value that is
//! handed explicitly to every component. Nothing below the command layer reads
//! the process environment.
//!
//! Values are resolved in this order:
//! 1. Environment variables (highest priority)
//! 2. `.env` files in the working directory and the local data directory
//! 3. `appsettings.json` (only `BackupRetentionDays`)
//! 4. Application defaults

use std::{
    env, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{BackupError, Res, backup::BackupSettings, warning};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5173/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5173";
pub const DEFAULT_SCOPE: &str = "user-library-read playlist-read-private";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_APP_SETTINGS_PATH: &str = "appsettings.json";

/// Application settings file shared with the deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    #[serde(rename = "BackupRetentionDays")]
    pub backup_retention_days: Option<u32>,
}

/// Settings of the Spotify OAuth client.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub oauth: OAuthSettings,
    pub api_url: String,
    pub server_addr: String,
    pub backup_dir: PathBuf,
    pub token_path: PathBuf,
    pub test_mode: bool,
    pub retention_days: u32,
    pub webhook_url: Option<String>,
    pub include_time: bool,
}

impl Config {
    /// Loads `.env` files and `appsettings.json`, then resolves the
    /// configuration from the process environment.
    pub async fn load() -> Res<Self> {
        load_env().await?;

        let settings_path = env::var("APP_SETTINGS_PATH")
            .unwrap_or_else(|_| DEFAULT_APP_SETTINGS_PATH.to_string());
        let app_settings = load_app_settings(Path::new(&settings_path)).await?;

        Self::from_lookup(|key| env::var(key).ok(), app_settings)
    }

    /// Resolves the configuration from a key lookup.
    ///
    /// `lookup` plays the role of the environment; `app_settings` is the parsed
    /// settings file, if one exists. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, app_settings: Option<AppSettings>) -> Res<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = get("SPOTIFY_CLIENT_ID")
            .ok_or_else(|| BackupError::Config("SPOTIFY_CLIENT_ID must be set".to_string()))?;

        let backup_dir = get("BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_backup_dir);
        let token_path = get("TOKEN_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| backup_dir.join(".cache"));

        let retention_days = match get("RETENTION_DAYS") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|e| {
                BackupError::Config(format!("RETENTION_DAYS must be a whole number of days: {e}"))
            })?,
            None => app_settings
                .and_then(|s| s.backup_retention_days)
                .unwrap_or(DEFAULT_RETENTION_DAYS),
        };

        Ok(Self {
            oauth: OAuthSettings {
                client_id,
                client_secret: get("SPOTIFY_CLIENT_SECRET"),
                redirect_uri: get("SPOTIFY_REDIRECT_URI")
                    .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
                scope: get("SPOTIFY_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                auth_url: get("SPOTIFY_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
                token_url: get("SPOTIFY_TOKEN_URL")
                    .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            },
            api_url: get("SPOTIFY_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            server_addr: get("SERVER_ADDRESS")
                .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            backup_dir,
            token_path,
            test_mode: get("TEST_MODE").is_some_and(|v| is_true(&v)),
            retention_days,
            webhook_url: webhook_url_from_lookup(&lookup),
            include_time: get("FILENAME_INCLUDE_TIME").is_some_and(|v| is_true(&v)),
        })
    }

    pub fn backup_settings(&self) -> BackupSettings {
        BackupSettings {
            backup_dir: self.backup_dir.clone(),
            retention_days: self.retention_days,
            fast_mode: self.test_mode,
            include_time: self.include_time,
        }
    }
}

/// Reads the settings file at `path`.
///
/// A missing file means defaults and yields `None`. Any other read failure,
/// or content that is not valid JSON, is an error.
pub async fn load_app_settings(path: &Path) -> Res<Option<AppSettings>> {
    match async_fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str::<AppSettings>(&content)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warning!(
                "{} not found. Defaulting to {} days retention.",
                path.display(),
                DEFAULT_RETENTION_DAYS
            );
            Ok(None)
        }
        Err(e) => Err(BackupError::Config(format!(
            "cannot read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Reads the webhook URL on its own, so a failure to resolve the rest of the
/// configuration can still be reported.
pub fn webhook_url_from_lookup<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("DISCORD_WEBHOOK").filter(|v| !v.trim().is_empty())
}

/// Loads environment variables from `.env` files.
///
/// Looks in the working directory first and then in
/// `<local data dir>/spotify-backup/.env`. Variables that are already set are
/// never overwritten, and missing files are not an error.
pub async fn load_env() -> Res<()> {
    let _ = dotenv::dotenv();

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotify-backup/.env");
    if async_fs::metadata(&path).await.is_ok() {
        dotenv::from_path(&path).map_err(|e| {
            BackupError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
    }
    Ok(())
}

fn default_backup_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotify-backup");
    path
}

fn is_true(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}
