//! Spotify Library Backup
//!
//! This library exports the state of a Spotify library (liked songs and the
//! user's own playlists) into timestamped JSON snapshot files, prunes snapshots
//! that have aged out of the retention window, and reports the outcome of each
//! run to a webhook.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints for the local OAuth callback server
//! - `backup` - Collection fetching, normalization, snapshot writing and retention
//! - `cli` - Command-line interface implementations
//! - `clock` - Time source abstraction used for stamping and retention
//! - `config` - Configuration value object and environment loading
//! - `error` - Error taxonomy shared by all modules
//! - `management` - Token persistence and refresh
//! - `notify` - Outcome notification sinks
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Wire and snapshot data structures
//! - `utils` - PKCE helpers and small formatting utilities
//!
//! # Example
//!
//! ```
//! use spotify_backup::{backup, clock::SystemClock, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> spotify_backup::Res<()> {
//!     let config = Config::load().await?;
//!     // Build a SpotifyClient and a notifier, then call backup::execute...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod management;
pub mod notify;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

pub use error::BackupError;

/// A convenient Result type alias for operations that may fail.
///
/// Every fallible operation in the crate reports a [`BackupError`], so callers
/// can propagate with `?` and render a single message for the notifier.
pub type Res<T> = std::result::Result<T, BackupError>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Fetching liked songs...");
/// info!("Found {} playlists", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message to stderr with a red exclamation mark and exits
/// the program with status 1.
///
/// Only the command layer uses this macro. Library code returns
/// [`BackupError`] instead so the failure can be reported before exiting.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message to stderr with a yellow exclamation mark.
///
/// Used for recoverable problems such as a failed notification delivery or a
/// rate-limit pause.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
