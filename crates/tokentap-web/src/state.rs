//! Shared application state for the callback server.
//!
//! [`AppState`] is wrapped in an `Arc` and shared across all request
//! handlers. It holds the single pending authorization, the sink that
//! receives tokens and the lifecycle handle that ends the run.

use std::sync::Arc;

use tokentap_auth::{AuthCodeFlow, ConfigError, TokenSink};

use crate::lifecycle::Lifecycle;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The authorization this server completes.
    pub flow: Arc<AuthCodeFlow>,

    /// Receives the tokens of a successful callback.
    pub sink: Arc<dyn TokenSink>,

    /// Soft-exit handle shared with the main control path.
    pub lifecycle: Lifecycle,

    /// Pre-built IDP authorization URL served by `/login`.
    pub authorization_url: String,
}

impl AppState {
    /// Build the state, computing the authorization URL once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the authorization endpoint is not a URL.
    pub fn new(
        flow: Arc<AuthCodeFlow>,
        sink: Arc<dyn TokenSink>,
        lifecycle: Lifecycle,
    ) -> Result<Self, ConfigError> {
        let authorization_url = flow.authorization_url()?.to_string();
        Ok(Self {
            flow,
            sink,
            lifecycle,
            authorization_url,
        })
    }

    /// The configured callback path.
    pub fn callback_path(&self) -> &str {
        &self.flow.config().callback_path
    }
}
