use std::path::{Path, PathBuf};

use chrono::Utc;
use reqwest::Client;

use crate::{
    BackupError, Res,
    config::OAuthSettings,
    spotify::auth::request_token,
    types::Token,
};

/// Seconds before expiry at which the access token is refreshed.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Keeps the OAuth token on disk and refreshes it when it is about to expire.
pub struct TokenManager {
    token: Token,
    path: PathBuf,
    oauth: OAuthSettings,
    client: Client,
}

impl TokenManager {
    pub fn new(token: Token, path: PathBuf, oauth: OAuthSettings) -> Self {
        TokenManager {
            token,
            path,
            oauth,
            client: Client::new(),
        }
    }

    pub async fn load(path: &Path, oauth: OAuthSettings) -> Res<Self> {
        let content = async_fs::read_to_string(path).await.map_err(|e| {
            BackupError::Auth(format!(
                "no cached token at {} ({}). Run `spotify-backup auth` first",
                path.display(),
                e
            ))
        })?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(Self::new(token, path.to_path_buf(), oauth))
    }

    pub async fn persist(&self) -> Res<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.token)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Returns an access token that is valid for at least a few more minutes,
    /// refreshing and persisting it first when needed.
    pub async fn get_valid_token(&mut self) -> Res<String> {
        if self.is_expired() {
            let new_token = self.refresh_token().await?;
            self.token = new_token;
            self.persist().await?;
        }

        Ok(self.token.access_token.clone())
    }

    fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp() as u64;
        now + EXPIRY_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    async fn refresh_token(&self) -> Res<Token> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", self.token.refresh_token.as_str()),
            ("client_id", self.oauth.client_id.as_str()),
        ];
        if let Some(secret) = &self.oauth.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let mut token = request_token(&self.client, &self.oauth.token_url, &form).await?;
        // Spotify may omit the refresh token when it does not rotate it.
        if token.refresh_token.is_empty() {
            token.refresh_token = self.token.refresh_token.clone();
        }
        if token.scope.is_empty() {
            token.scope = self.token.scope.clone();
        }
        Ok(token)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
