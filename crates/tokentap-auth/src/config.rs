//! The resolved, read-only configuration of a single run.
//!
//! [`FlowConfig`] is produced by the command-line layer (flags, environment,
//! config file, discovery) and validated once before any flow starts. The
//! `state` and `pkce` fields double as the single pending authorization of
//! the process.

use std::time::Duration;

use serde::Serialize;
use url::Url;

use crate::error::ConfigError;
use crate::pkce::{self, PkcePair};

/// Default callback path registered with the IDP.
pub const DEFAULT_CALLBACK_PATH: &str = "/oauth2/callback";

/// Default local listener port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default outbound HTTP timeout for token, userinfo and discovery calls.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Path of the login-redirect route on the local listener.
pub const LOGIN_PATH: &str = "/login";

/// Which grant a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    /// Interactive flow through the local callback server.
    AuthorizationCode,
    /// Redeem a configured refresh token; no listener.
    RefreshToken,
    /// Machine-to-machine grant; no listener.
    ClientCredentials,
}

/// Everything a run needs to talk to the IDP.
#[derive(Debug, Clone, Serialize)]
pub struct FlowConfig {
    /// Authorization endpoint the browser is redirected to.
    pub authorization_endpoint: String,

    /// Token endpoint for the back-channel exchange.
    pub token_endpoint: String,

    /// Userinfo endpoint, if known.
    pub userinfo_endpoint: Option<String>,

    /// Path of the redirect URI on the local listener, e.g. `/oauth2/callback`.
    pub callback_path: String,

    /// Local listener port, also part of the redirect URI.
    pub port: u16,

    /// OAuth client ID.
    pub client_id: String,

    /// OAuth client secret (confidential clients only).
    pub client_secret: Option<String>,

    /// Space-delimited scope string.
    pub scope: String,

    /// Expected `state` of the pending authorization.
    pub state: String,

    /// PKCE verifier/challenge, `None` when PKCE is disabled.
    pub pkce: Option<PkcePair>,

    /// Fetch userinfo after obtaining tokens.
    pub fetch_userinfo: bool,

    /// A refresh token to redeem instead of running the interactive flow.
    pub refresh_token: Option<String>,

    /// Run the client credentials grant instead of the interactive flow.
    pub client_credentials: bool,

    /// Timeout for each outbound HTTP call.
    #[serde(skip)]
    pub http_timeout: Duration,
}

impl FlowConfig {
    /// Create a configuration for the interactive flow with the given
    /// endpoints and client, using defaults for everything else.
    ///
    /// PKCE is disabled and the state is empty; callers fill those in.
    pub fn new(
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            userinfo_endpoint: None,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            port: DEFAULT_PORT,
            client_id: client_id.into(),
            client_secret: None,
            scope: String::new(),
            state: String::new(),
            pkce: None,
            fetch_userinfo: false,
            refresh_token: None,
            client_credentials: false,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// The grant this configuration selects.
    pub fn mode(&self) -> FlowMode {
        if self.client_credentials {
            FlowMode::ClientCredentials
        } else if self.refresh_token.as_deref().is_some_and(|t| !t.is_empty()) {
            FlowMode::RefreshToken
        } else {
            FlowMode::AuthorizationCode
        }
    }

    /// The redirect URI sent to the IDP: `http://localhost:<port><callback_path>`.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{}", self.port, self.callback_path)
    }

    /// The URL the operator opens to start the interactive flow.
    pub fn login_url(&self) -> String {
        format!("http://localhost:{}{}", self.port, LOGIN_PATH)
    }

    /// Check every invariant the flows rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mode = self.mode();

        if mode == FlowMode::AuthorizationCode {
            require_url("authorization endpoint", &self.authorization_endpoint)?;
        }
        require_url("token endpoint", &self.token_endpoint)?;

        if self.port == 0 {
            return Err(ConfigError::Invalid {
                field: "port",
                reason: "must be in 1..=65535".to_string(),
            });
        }

        if self.callback_path.len() < 2 || !self.callback_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "callback path",
                reason: format!(
                    "`{}` must start with '/' and name a path",
                    self.callback_path
                ),
            });
        }
        if self.callback_path == LOGIN_PATH {
            return Err(ConfigError::Invalid {
                field: "callback path",
                reason: format!("`{LOGIN_PATH}` is reserved for the login redirect"),
            });
        }

        if self.client_id.is_empty() {
            return Err(ConfigError::Missing { field: "client ID" });
        }

        if self.fetch_userinfo {
            match self.userinfo_endpoint.as_deref() {
                Some(endpoint) if !endpoint.is_empty() => require_url("userinfo endpoint", endpoint)?,
                _ => return Err(ConfigError::Missing { field: "userinfo endpoint" }),
            }
        }

        if self.state.is_empty() {
            return Err(ConfigError::Missing { field: "state" });
        }

        if let Some(pair) = &self.pkce {
            if !pkce::is_valid_verifier(&pair.verifier) {
                return Err(ConfigError::Invalid {
                    field: "PKCE code verifier",
                    reason: format!(
                        "must be {}..={} characters from [A-Za-z0-9-._~]",
                        pkce::MIN_VERIFIER_LEN,
                        pkce::MAX_VERIFIER_LEN
                    ),
                });
            }
            if pair.challenge != pkce::derive_challenge(&pair.verifier) {
                return Err(ConfigError::Invalid {
                    field: "PKCE code challenge",
                    reason: "does not match the S256 transform of the verifier".to_string(),
                });
            }
        }

        Ok(())
    }

    /// A copy safe to print: the client secret is masked and the refresh
    /// token truncated.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.client_secret = self
            .client_secret
            .as_ref()
            .map(|secret| "*".repeat(secret.chars().count()));
        copy.refresh_token = self.refresh_token.as_ref().map(|token| {
            if token.chars().count() > 15 {
                let head: String = token.chars().take(15).collect();
                format!("{head}...")
            } else {
                token.clone()
            }
        });
        copy
    }
}

fn require_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing { field });
    }
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("`{value}`: {e}"),
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
