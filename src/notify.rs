//! Outcome notification.
//!
//! A notifier accepts one text message per run. Delivery is best effort:
//! implementations log their own failures and never hand them back, so a dead
//! webhook can not fail a backup.

use std::time::Duration;

use reqwest::Client;

use crate::{types::WebhookMessage, warning};

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn notify(&self, message: &str);
}

/// Posts messages to a Discord-style webhook as `{"content": message}`.
///
/// Without a URL every message is dropped silently.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    async fn deliver(&self, url: &str, message: &str) -> Result<(), reqwest::Error> {
        self.client
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(&WebhookMessage {
                content: message.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) {
        let Some(url) = &self.url else {
            return;
        };

        if let Err(e) = self.deliver(url, message).await {
            warning!("Failed to send Discord notification: {}", e);
        }
    }
}
