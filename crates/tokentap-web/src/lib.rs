//! Local callback server for tokentap.
//!
//! This crate serves the three routes the interactive authorization code
//! flow needs and owns the lifecycle of the run:
//!
//! - `GET /` serves a small landing page.
//! - `GET /login` redirects the browser to the IDP.
//! - `GET|POST <callback path>` hands the IDP's redirect to the flow and
//!   serves the result page.
//!
//! Every terminal outcome goes through [`Lifecycle::request_exit`]. The main
//! control path in [`CallbackServer::run`] waits for that request, shuts the
//! listener down within a bounded grace period and returns the exit code.

pub mod error;
pub mod frontend;
pub mod handlers;
pub mod lifecycle;
pub mod server;
pub mod state;

pub use error::ServerError;
pub use lifecycle::{Lifecycle, clamp_exit_code};
pub use server::{CallbackServer, ServerState};
pub use state::AppState;

/// Default shutdown grace period in seconds.
pub const DEFAULT_GRACE_SECS: u64 = 15;

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl WebConfig {
    /// The `host:port` string to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: tokentap_auth::config::DEFAULT_PORT,
        }
    }
}
