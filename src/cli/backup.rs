use std::env;

use crate::{
    Res,
    backup::{self, failure_message},
    clock::SystemClock,
    config::{Config, webhook_url_from_lookup},
    error,
    management::TokenManager,
    notify::{Notifier, WebhookNotifier},
    spotify::SpotifyClient,
    success,
};

/// Loads the configuration for a backup run.
///
/// A failure is reported to the `DISCORD_WEBHOOK` webhook, when one is set,
/// before the process exits with status 1.
pub async fn load_backup_config() -> Config {
    let loaded = Config::load().await;
    let notifier = WebhookNotifier::new(webhook_url_from_lookup(|key| env::var(key).ok()));
    match report_config_failure(loaded, &notifier).await {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    }
}

/// Sends the failure message of a configuration error to `notifier` and
/// hands the result back unchanged.
pub async fn report_config_failure<N: Notifier>(loaded: Res<Config>, notifier: &N) -> Res<Config> {
    if let Err(e) = &loaded {
        notifier.notify(&failure_message(e)).await;
    }
    loaded
}

/// Runs one scheduled backup.
///
/// Any failure, including a missing token, is sent to the webhook before the
/// process exits with status 1 so the scheduler sees the run as failed.
pub async fn backup(config: &Config) {
    let notifier = WebhookNotifier::new(config.webhook_url.clone());

    let tokens = match TokenManager::load(&config.token_path, config.oauth.clone()).await {
        Ok(tokens) => tokens,
        Err(e) => {
            notifier.notify(&failure_message(&e)).await;
            error!("{}", e);
        }
    };

    let mut client = match SpotifyClient::new(config.api_url.clone(), tokens) {
        Ok(client) => client,
        Err(e) => {
            notifier.notify(&failure_message(&e)).await;
            error!("{}", e);
        }
    };

    match backup::execute(
        &mut client,
        &notifier,
        &SystemClock,
        &config.backup_settings(),
    )
    .await
    {
        Ok(summary) => success!("{}", summary.message()),
        Err(e) => error!("Backup failed: {}", e),
    }
}
