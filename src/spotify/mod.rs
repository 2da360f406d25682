//! # Spotify Integration Module
//!
//! HTTP side of the backup: a [`SpotifyClient`] that implements
//! [`LibrarySource`] on top of the Spotify Web API, and the OAuth 2.0 PKCE
//! flow used once to obtain the token that later runs refresh on their own.
//!
//! ```text
//! backup pipeline
//!          ↓
//! SpotifyClient (LibrarySource)
//!     ├── GET /me/tracks                  saved tracks, 50 per page
//!     ├── GET /me/playlists               playlists, 50 per page
//!     ├── GET /playlists/{id}/tracks      playlist items, 100 per page
//!     └── GET <next>                      follow a page cursor
//!          ↓
//! TokenManager (refresh + persist)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Transient Failures
//!
//! Each request is attempted at most [`MAX_ATTEMPTS`] times (see
//! [`RetryPolicy`]):
//! - `502 Bad Gateway` is retried after [`BAD_GATEWAY_DELAY`].
//! - `429 Too Many Requests` is retried after the `Retry-After` delay when that
//!   is at most [`MAX_RETRY_AFTER_SECS`]; longer delays fail the request.
//!
//! Everything else, including exhausted attempts, is returned to the caller
//! as a [`BackupError`]. The pipeline itself never retries.
//!
//! Every request also carries a [`REQUEST_TIMEOUT`].

pub mod auth;

use std::time::Duration;

use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::time::sleep;

use crate::{
    BackupError, Res,
    backup::LibrarySource,
    management::TokenManager,
    types::{Page, RawPlaylist, SavedItem},
    utils, warning,
};

pub const MAX_ATTEMPTS: u32 = 3;
pub const BAD_GATEWAY_DELAY: Duration = Duration::from_secs(10);
pub const MAX_RETRY_AFTER_SECS: u64 = 120;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How [`SpotifyClient`] handles transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub bad_gateway_delay: Duration,
    pub max_retry_after_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            bad_gateway_delay: BAD_GATEWAY_DELAY,
            max_retry_after_secs: MAX_RETRY_AFTER_SECS,
        }
    }
}

pub struct SpotifyClient {
    client: Client,
    api_url: String,
    tokens: TokenManager,
    retry: RetryPolicy,
}

impl SpotifyClient {
    pub fn new(api_url: String, tokens: TokenManager) -> Res<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url,
            tokens,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_page<T: DeserializeOwned>(&mut self, url: &str) -> Res<Page<T>> {
        let mut attempt = 0;

        loop {
            attempt += 1;
            let token = self.tokens.get_valid_token().await?;
            let response = self.client.get(url).bearer_auth(token).send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response.json::<Page<T>>().await?);
            }

            if attempt < self.retry.max_attempts {
                if status == StatusCode::BAD_GATEWAY {
                    warning!(
                        "Spotify returned 502, retrying in {}s",
                        self.retry.bad_gateway_delay.as_secs()
                    );
                    sleep(self.retry.bad_gateway_delay).await;
                    continue;
                }

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = utils::parse_retry_after(
                        response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok()),
                    )
                    .unwrap_or(1);

                    if retry_after <= self.retry.max_retry_after_secs {
                        warning!("Rate limited, retrying in {}s", retry_after);
                        sleep(Duration::from_secs(retry_after)).await;
                        continue;
                    }
                    warning!(
                        "Retry after has reached an abnormal high of {} seconds.",
                        retry_after
                    );
                }
            }

            let message = response.text().await.unwrap_or_default();
            return Err(BackupError::Api {
                status: status.as_u16(),
                message,
            });
        }
    }
}

impl LibrarySource for SpotifyClient {
    async fn saved_tracks(&mut self, limit: u32) -> Res<Page<SavedItem>> {
        let url = format!("{uri}/me/tracks?limit={limit}", uri = self.api_url);
        self.get_page(&url).await
    }

    async fn playlists(&mut self, limit: u32) -> Res<Page<RawPlaylist>> {
        let url = format!("{uri}/me/playlists?limit={limit}", uri = self.api_url);
        self.get_page(&url).await
    }

    async fn playlist_items(&mut self, playlist_id: &str, limit: u32) -> Res<Page<SavedItem>> {
        let url = format!(
            "{uri}/playlists/{id}/tracks?limit={limit}",
            uri = self.api_url,
            id = playlist_id
        );
        self.get_page(&url).await
    }

    async fn next_page<T: DeserializeOwned>(&mut self, page: &Page<T>) -> Res<Page<T>> {
        match &page.next {
            Some(url) => self.get_page(url).await,
            None => Ok(Page::empty()),
        }
    }
}
