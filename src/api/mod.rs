//! # API Module
//!
//! HTTP endpoints of the short-lived server that `spotify-backup auth` runs
//! while the user authorizes the application in a browser.
//!
//! - [`callback`] - Receives the authorization code from Spotify and exchanges
//!   it for a token using the PKCE verifier held in shared state.
//! - [`health`] - Reports that the server is up, with the package version.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
