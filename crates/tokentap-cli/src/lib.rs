//! The tokentap command-line tool.
//!
//! `main.rs` parses arguments and initialises logging; everything else
//! lives here so it can be tested without spawning the binary.

pub mod browser;
pub mod cli;
pub mod config;
pub mod helpers;
pub mod jwt;
pub mod output;

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};

use tokentap_auth::{AuthCodeFlow, FlowMode, TokenSink, run_direct_grant};
use tokentap_web::{AppState, CallbackServer, Lifecycle};

use crate::config::Settings;

/// Exit code of a run that did not produce tokens for a reason other than a
/// callback failure.
pub const EXIT_FAILURE: u8 = 1;

/// Run the flow selected by `settings` and return the process exit code.
///
/// The refresh token and client credentials grants call the token endpoint
/// once and never start the callback server. The authorization code flow
/// serves until its callback completes or `interrupt` resolves.
///
/// # Errors
///
/// Fails if the callback server cannot be started.
pub async fn run<F>(settings: Settings, sink: Arc<dyn TokenSink>, interrupt: F) -> Result<u8>
where
    F: Future<Output = ()>,
{
    match settings.flow.mode() {
        FlowMode::RefreshToken | FlowMode::ClientCredentials => {
            match run_direct_grant(&settings.flow, sink.as_ref()).await {
                Ok(_) => Ok(0),
                Err(e) => {
                    tracing::error!(error = %e, "could not obtain tokens");
                    Ok(EXIT_FAILURE)
                }
            }
        }
        FlowMode::AuthorizationCode => {
            let flow = AuthCodeFlow::new(settings.flow).context("failed to set up token client")?;
            let flow = Arc::new(flow);
            let login_url = flow.config().login_url();

            let state = AppState::new(flow, sink, Lifecycle::new())
                .context("failed to build authorization URL")?;
            let server = CallbackServer::bind(&settings.web, state)
                .await
                .context("failed to start callback server")?;

            eprintln!("Open {login_url} in a browser to log in.");
            if settings.open_browser {
                if let Err(e) = browser::open(&login_url) {
                    tracing::warn!(error = %e, "could not launch browser automatically");
                }
            }

            Ok(server.run(settings.grace, interrupt).await)
        }
    }
}
