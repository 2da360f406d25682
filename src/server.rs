use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{BackupError, Res, api, config::OAuthSettings, types::PkceToken};

/// Routes of the callback server, with the shared PKCE state and OAuth settings
/// available to every handler.
pub fn callback_router(state: Arc<Mutex<Option<PkceToken>>>, oauth: Arc<OAuthSettings>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
        .layer(Extension(oauth))
}

/// Serves `/health` and `/callback` until the task is aborted.
pub async fn start_api_server(
    addr: &str,
    state: Arc<Mutex<Option<PkceToken>>>,
    oauth: Arc<OAuthSettings>,
) -> Res<()> {
    let app = callback_router(state, oauth);

    let addr = SocketAddr::from_str(addr)
        .map_err(|e| BackupError::Config(format!("invalid SERVER_ADDRESS {addr}: {e}")))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
