use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotify_backup::{cli, config::Config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API and cache the token
    Auth,

    /// Export liked songs and playlists into a snapshot file
    Backup(BackupOptions),

    /// Delete snapshots older than the retention window
    Sweep(SweepOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct BackupOptions {
    /// Quick validation run: first page only and at most two playlists
    #[clap(long)]
    pub test_mode: bool,

    /// Directory receiving the snapshot files
    #[clap(long)]
    pub backup_dir: Option<PathBuf>,

    /// Maximum snapshot age in days
    #[clap(long)]
    pub retention_days: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct SweepOptions {
    /// Directory holding the snapshot files
    #[clap(long)]
    pub backup_dir: Option<PathBuf>,

    /// Maximum snapshot age in days
    #[clap(long)]
    pub retention_days: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

async fn load_config() -> Config {
    match Config::load().await {
        Ok(config) => config,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    }
}

fn apply_overrides(
    config: &mut Config,
    backup_dir: Option<PathBuf>,
    retention_days: Option<u32>,
) {
    if let Some(dir) = backup_dir {
        config.backup_dir = dir;
    }
    if let Some(days) = retention_days {
        config.retention_days = days;
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let config = load_config().await;
            cli::auth(&config).await;
        }
        Command::Backup(opt) => {
            let mut config = cli::load_backup_config().await;
            apply_overrides(&mut config, opt.backup_dir, opt.retention_days);
            config.test_mode |= opt.test_mode;
            cli::backup(&config).await;
        }
        Command::Sweep(opt) => {
            let mut config = load_config().await;
            apply_overrides(&mut config, opt.backup_dir, opt.retention_days);
            cli::sweep(&config).await;
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
