use crate::{
    backup,
    clock::{Clock, SystemClock},
    config::Config,
    error, success,
};

pub async fn sweep(config: &Config) {
    let now = SystemClock.now();
    match backup::sweep(&config.backup_dir, config.retention_days, now).await {
        Ok(deleted) => success!(
            "Removed {} snapshot(s) older than {} days from {}",
            deleted,
            config.retention_days,
            config.backup_dir.display()
        ),
        Err(e) => error!("Retention sweep failed: {}", e),
    }
}
