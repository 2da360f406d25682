#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::State,
    http::StatusCode,
    routing::post,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use spotify_backup::{
    BackupError, Res,
    backup::LibrarySource,
    config::OAuthSettings,
    notify::Notifier,
    types::{Page, RawPlaylist, SavedItem, Token},
};

/// In-memory Spotify library serving pre-split pages.
///
/// Pages are chained through `next` cursors of the form `fake://<key>/<n>`.
/// Every request is recorded so tests can assert on the calls made.
#[derive(Default)]
pub struct FakeLibrary {
    first_pages: HashMap<String, Value>,
    pages: HashMap<String, Value>,
    pub requests: Vec<String>,
    pub next_calls: usize,
    pub page_limits: Vec<(String, u32)>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `items` under `key`, split into pages of `page_size`.
    pub fn with_collection(mut self, key: &str, items: Vec<Value>, page_size: usize) -> Self {
        let chunks: Vec<Vec<Value>> = if items.is_empty() {
            vec![Vec::new()]
        } else {
            items.chunks(page_size).map(|c| c.to_vec()).collect()
        };
        let count = chunks.len();

        for (n, chunk) in chunks.into_iter().enumerate() {
            let next = if n + 1 < count {
                Value::String(format!("fake://{}/{}", key, n + 1))
            } else {
                Value::Null
            };
            let page = json!({ "items": chunk, "next": next, "total": null });
            if n == 0 {
                self.first_pages.insert(key.to_string(), page);
            } else {
                self.pages.insert(format!("fake://{}/{}", key, n), page);
            }
        }
        self
    }

    pub fn with_liked(self, items: Vec<Value>, page_size: usize) -> Self {
        self.with_collection("liked", items, page_size)
    }

    pub fn with_playlists(self, items: Vec<Value>, page_size: usize) -> Self {
        self.with_collection("playlists", items, page_size)
    }

    pub fn with_playlist_items(self, playlist_id: &str, items: Vec<Value>, page_size: usize) -> Self {
        self.with_collection(&format!("playlist-{}", playlist_id), items, page_size)
    }

    /// Makes the page behind `cursor` disappear so following it fails.
    pub fn break_cursor(mut self, cursor: &str) -> Self {
        self.pages.remove(cursor);
        self
    }

    pub fn first_page<T: DeserializeOwned>(&self, key: &str) -> Res<Page<T>> {
        let page = self.first_pages.get(key).cloned().ok_or_else(|| BackupError::Api {
            status: 404,
            message: format!("no collection {}", key),
        })?;
        Ok(serde_json::from_value(page)?)
    }

    fn serve<T: DeserializeOwned>(&mut self, key: &str, limit: u32) -> Res<Page<T>> {
        self.requests.push(key.to_string());
        self.page_limits.push((key.to_string(), limit));
        self.first_page(key)
    }
}

impl LibrarySource for FakeLibrary {
    async fn saved_tracks(&mut self, limit: u32) -> Res<Page<SavedItem>> {
        self.serve("liked", limit)
    }

    async fn playlists(&mut self, limit: u32) -> Res<Page<RawPlaylist>> {
        self.serve("playlists", limit)
    }

    async fn playlist_items(&mut self, playlist_id: &str, limit: u32) -> Res<Page<SavedItem>> {
        self.serve(&format!("playlist-{}", playlist_id), limit)
    }

    async fn next_page<T: DeserializeOwned>(&mut self, page: &Page<T>) -> Res<Page<T>> {
        self.next_calls += 1;
        let cursor = page.next.clone().unwrap_or_default();
        self.requests.push(cursor.clone());
        let page = self.pages.get(&cursor).cloned().ok_or_else(|| BackupError::Api {
            status: 429,
            message: format!("rate limited at {}", cursor),
        })?;
        Ok(serde_json::from_value(page)?)
    }
}

/// Notifier that keeps every message it is given.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.to_string());
        }
    }
}

pub fn track(name: &str, artists: &[&str]) -> Value {
    json!({
        "name": name,
        "artists": artists.iter().map(|a| json!({ "name": a })).collect::<Vec<_>>(),
        "album": { "name": format!("{} (album)", name), "release_date": "2021-03-05" },
        "external_ids": { "isrc": format!("ISRC-{}", name) },
        "uri": format!("spotify:track:{}", name),
        "duration_ms": 180000,
        "explicit": false
    })
}

pub fn saved(name: &str, artists: &[&str]) -> Value {
    json!({ "added_at": "2024-01-02T03:04:05Z", "track": track(name, artists) })
}

pub fn removed() -> Value {
    json!({ "added_at": "2024-01-02T03:04:05Z", "track": null })
}

pub fn playlist(id: &str, name: &str, owner: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} description", name),
        "owner": { "id": owner }
    })
}

pub fn numbered(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| saved(&format!("{}{}", prefix, n), &["Artist"]))
        .collect()
}

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn oauth_settings(token_url: &str) -> OAuthSettings {
    OAuthSettings {
        client_id: "client-id".to_string(),
        client_secret: None,
        redirect_uri: "http://127.0.0.1:5173/callback".to_string(),
        scope: "user-library-read playlist-read-private".to_string(),
        auth_url: "https://accounts.example.com/authorize".to_string(),
        token_url: token_url.to_string(),
    }
}

/// Token obtained `age_secs` ago that lives for one hour.
pub fn token_aged(access_token: &str, age_secs: u64) -> Token {
    Token {
        access_token: access_token.to_string(),
        refresh_token: "old-refresh".to_string(),
        scope: "user-library-read".to_string(),
        expires_in: 3600,
        obtained_at: Utc::now().timestamp() as u64 - age_secs,
    }
}

/// OAuth token endpoint that records every form it receives and answers with
/// a fixed status and JSON body.
#[derive(Clone)]
pub struct TokenEndpoint {
    pub forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    status: StatusCode,
    body: Value,
}

impl TokenEndpoint {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            forms: Arc::new(Mutex::new(Vec::new())),
            status,
            body,
        }
    }

    /// Serves the endpoint and returns its token URL.
    pub async fn start(&self) -> String {
        let router = Router::new()
            .route("/token", post(token_endpoint))
            .with_state(self.clone());
        format!("{}/token", serve(router).await)
    }

    pub fn forms(&self) -> Vec<HashMap<String, String>> {
        self.forms.lock().unwrap().clone()
    }
}

async fn token_endpoint(
    State(endpoint): State<TokenEndpoint>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    endpoint.forms.lock().unwrap().push(form);
    (endpoint.status, Json(endpoint.body.clone()))
}
