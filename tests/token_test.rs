mod common;

use std::fs;

use axum::http::StatusCode;
use common::{TokenEndpoint, oauth_settings, token_aged};
use serde_json::json;
use spotify_backup::{BackupError, management::TokenManager, types::Token};
use tempfile::TempDir;

fn cached_token(dir: &TempDir) -> Token {
    let content = fs::read_to_string(dir.path().join(".cache")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[tokio::test]
async fn test_valid_token_is_not_refreshed() {
    let dir = TempDir::new().unwrap();
    let endpoint = TokenEndpoint::new(StatusCode::OK, json!({ "access_token": "fresh" }));
    let token_url = endpoint.start().await;
    let mut tokens = TokenManager::new(
        token_aged("current", 60),
        dir.path().join(".cache"),
        oauth_settings(&token_url),
    );

    let access = tokens.get_valid_token().await.unwrap();

    assert_eq!(access, "current");
    assert!(endpoint.forms().is_empty());
    assert!(!dir.path().join(".cache").exists());
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_rotated() {
    let dir = TempDir::new().unwrap();
    let endpoint = TokenEndpoint::new(
        StatusCode::OK,
        json!({ "access_token": "fresh", "token_type": "Bearer", "expires_in": 3600 }),
    );
    let token_url = endpoint.start().await;
    // Inside the four-minute margin before expiry.
    let mut tokens = TokenManager::new(
        token_aged("stale", 3500),
        dir.path().join(".cache"),
        oauth_settings(&token_url),
    );

    let access = tokens.get_valid_token().await.unwrap();

    assert_eq!(access, "fresh");

    let forms = endpoint.forms();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["grant_type"], "refresh_token");
    assert_eq!(forms[0]["refresh_token"], "old-refresh");
    assert_eq!(forms[0]["client_id"], "client-id");
    assert!(!forms[0].contains_key("client_secret"));

    let cached = cached_token(&dir);
    assert_eq!(cached.access_token, "fresh");
    assert_eq!(cached.refresh_token, "old-refresh");
    assert_eq!(cached.scope, "user-library-read");
    assert_eq!(cached.expires_in, 3600);
}

#[tokio::test]
async fn test_refresh_stores_rotated_refresh_token() {
    let dir = TempDir::new().unwrap();
    let endpoint = TokenEndpoint::new(
        StatusCode::OK,
        json!({
            "access_token": "fresh",
            "refresh_token": "new-refresh",
            "scope": "user-library-read playlist-read-private",
            "expires_in": 1800
        }),
    );
    let token_url = endpoint.start().await;
    let mut tokens = TokenManager::new(
        token_aged("stale", 7200),
        dir.path().join(".cache"),
        oauth_settings(&token_url),
    );

    tokens.get_valid_token().await.unwrap();

    let cached = cached_token(&dir);
    assert_eq!(cached.refresh_token, "new-refresh");
    assert_eq!(cached.scope, "user-library-read playlist-read-private");
    assert_eq!(cached.expires_in, 1800);

    let reloaded = TokenManager::load(&dir.path().join(".cache"), oauth_settings(&token_url))
        .await
        .unwrap();
    assert_eq!(reloaded.path(), dir.path().join(".cache").as_path());
}

#[tokio::test]
async fn test_rejected_refresh_is_an_auth_error() {
    let dir = TempDir::new().unwrap();
    let endpoint = TokenEndpoint::new(
        StatusCode::BAD_REQUEST,
        json!({ "error": "invalid_grant" }),
    );
    let token_url = endpoint.start().await;
    let mut tokens = TokenManager::new(
        token_aged("stale", 7200),
        dir.path().join(".cache"),
        oauth_settings(&token_url),
    );

    let err = tokens.get_valid_token().await.unwrap_err();

    match err {
        BackupError::Auth(message) => assert!(message.contains("400")),
        other => panic!("expected an auth error, got {:?}", other),
    }
    assert!(!dir.path().join(".cache").exists());
}

#[tokio::test]
async fn test_load_without_cached_token_asks_for_auth() {
    let dir = TempDir::new().unwrap();

    let err = TokenManager::load(&dir.path().join(".cache"), oauth_settings("http://unused"))
        .await
        .err()
        .unwrap();

    match err {
        BackupError::Auth(message) => assert!(message.contains("spotify-backup auth")),
        other => panic!("expected an auth error, got {:?}", other),
    }
}
