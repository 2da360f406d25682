//! # CLI Module
//!
//! Command handlers behind the `spotify-backup` binary. Each handler resolves
//! what it needs from the [`crate::config::Config`] it is given, calls into
//! the library and turns failures into a non-zero exit status with
//! [`crate::error!`].
//!
//! ```text
//! spotify-backup auth          # one-time browser authorization
//! spotify-backup backup        # scheduled, unattended snapshot run
//! spotify-backup sweep         # prune old snapshots only
//! ```

mod auth;
mod backup;
mod sweep;

pub use auth::auth;
pub use backup::{backup, load_backup_config, report_config_failure};
pub use sweep::sweep;
