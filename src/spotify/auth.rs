use std::{sync::Arc, time::Duration};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    BackupError, Res,
    config::{Config, OAuthSettings},
    management::TokenManager,
    server::start_api_server,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

/// How long `auth` waits for the browser to come back to the callback.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the OAuth 2.0 PKCE authorization flow and stores the token.
///
/// 1. Generates a code verifier and its SHA256 challenge.
/// 2. Starts the local callback server on `config.server_addr`.
/// 3. Opens the authorization URL in the browser, or prints it when no browser
///    can be launched (headless hosts).
/// 4. Waits for the callback handler to exchange the code for a token.
/// 5. Persists the token at `config.token_path` for later backup runs.
pub async fn auth(config: &Config) -> Res<TokenManager> {
    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    // Store verifier before the browser can hit the callback.
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    let server_addr = config.server_addr.clone();
    let server_oauth = Arc::new(config.oauth.clone());
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(&server_addr, server_state, server_oauth).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    let auth_url = authorize_url(&config.oauth, &code_challenge)?;
    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server.abort();

    let token = token.ok_or_else(|| {
        BackupError::Auth("authentication failed or timed out".to_string())
    })?;

    let token_manager = TokenManager::new(token, config.token_path.clone(), config.oauth.clone());
    token_manager.persist().await?;
    Ok(token_manager)
}

pub fn authorize_url(oauth: &OAuthSettings, code_challenge: &str) -> Res<Url> {
    Url::parse_with_params(
        &oauth.auth_url,
        &[
            ("client_id", oauth.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", oauth.redirect_uri.as_str()),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", oauth.scope.as_str()),
        ],
    )
    .map_err(|e| BackupError::Config(format!("invalid SPOTIFY_AUTH_URL: {e}")))
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for Spotify authorization...");
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }

    let start = Instant::now();
    while start.elapsed() < CALLBACK_TIMEOUT {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.clone()) {
            pb.finish_and_clear();
            return Some(token);
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    pb.finish_and_clear();
    None
}

/// Exchanges an authorization code for a token, proving possession of the
/// PKCE verifier.
pub async fn exchange_code_pkce(oauth: &OAuthSettings, code: &str, verifier: &str) -> Res<Token> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("client_id", oauth.client_id.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("redirect_uri", oauth.redirect_uri.as_str()),
    ];
    if let Some(secret) = &oauth.client_secret {
        form.push(("client_secret", secret.as_str()));
    }

    request_token(&Client::new(), &oauth.token_url, &form).await
}

/// Posts a token request form and converts the response into a [`Token`].
///
/// Missing optional fields come back empty; callers that refresh an existing
/// token fill them from the previous one.
pub async fn request_token(client: &Client, token_url: &str, form: &[(&str, &str)]) -> Res<Token> {
    let response = client.post(token_url).form(form).send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(BackupError::Auth(format!(
            "token endpoint returned {}: {}",
            status.as_u16(),
            message
        )));
    }

    let json = response.json::<TokenResponse>().await?;
    Ok(Token {
        access_token: json.access_token,
        refresh_token: json.refresh_token.unwrap_or_default(),
        scope: json.scope.unwrap_or_default(),
        expires_in: json.expires_in.unwrap_or(3600),
        obtained_at: Utc::now().timestamp() as u64,
    })
}
