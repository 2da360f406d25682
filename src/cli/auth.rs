use crate::{config::Config, error, spotify, success};

pub async fn auth(config: &Config) {
    match spotify::auth::auth(config).await {
        Ok(tokens) => success!(
            "Authentication successful! Token stored at {}",
            tokens.path().display()
        ),
        Err(e) => error!("{}", e),
    }
}
