//! Back-channel calls to the token endpoint.
//!
//! Every grant is a form-encoded POST. The response body is decoded as a
//! token payload whatever the HTTP status; a payload without an access token
//! is an error that carries the raw body so the operator can read what the
//! IDP said.

use std::time::Duration;

use reqwest::header::ACCEPT;
use url::Url;

use crate::config::FlowConfig;
use crate::error::ExchangeError;
use crate::tokens::TokenSet;

/// The grant to request from the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantRequest {
    /// Redeem an authorization code.
    AuthorizationCode {
        code: String,
        redirect_uri: String,
        /// Sent only when PKCE is enabled.
        code_verifier: Option<String>,
    },
    /// Redeem a refresh token.
    RefreshToken { refresh_token: String },
    /// Client credentials grant.
    ClientCredentials { scope: String },
}

impl GrantRequest {
    /// Value of the `grant_type` form field.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::RefreshToken { .. } => "refresh_token",
            Self::ClientCredentials { .. } => "client_credentials",
        }
    }
}

/// HTTP client bound to one token endpoint and one OAuth client.
#[derive(Debug, Clone)]
pub struct TokenClient {
    client: reqwest::Client,
    token_endpoint: Url,
    client_id: String,
    client_secret: Option<String>,
}

impl TokenClient {
    /// Create a client for `token_endpoint`.
    ///
    /// An empty `client_secret` is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::InvalidEndpoint`] if the endpoint is not a
    /// URL, or [`ExchangeError::Transport`] if the HTTP client cannot be
    /// built.
    pub fn new(
        token_endpoint: &str,
        client_id: impl Into<String>,
        client_secret: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let token_endpoint =
            Url::parse(token_endpoint).map_err(|source| ExchangeError::InvalidEndpoint {
                url: token_endpoint.to_string(),
                source,
            })?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            token_endpoint,
            client_id: client_id.into(),
            client_secret: client_secret.filter(|s| !s.is_empty()),
        })
    }

    /// Create a client from a validated run configuration.
    pub fn from_config(config: &FlowConfig) -> Result<Self, ExchangeError> {
        Self::new(
            &config.token_endpoint,
            config.client_id.clone(),
            config.client_secret.clone(),
            config.http_timeout,
        )
    }

    /// The form fields sent for `grant`, in wire order.
    pub fn form_params<'a>(&'a self, grant: &'a GrantRequest) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("grant_type", grant.grant_type())];

        match grant {
            GrantRequest::AuthorizationCode {
                code,
                redirect_uri,
                code_verifier,
            } => {
                params.push(("code", code.as_str()));
                params.push(("redirect_uri", redirect_uri.as_str()));
                if let Some(verifier) = code_verifier {
                    params.push(("code_verifier", verifier.as_str()));
                }
            }
            GrantRequest::RefreshToken { refresh_token } => {
                params.push(("refresh_token", refresh_token.as_str()));
            }
            GrantRequest::ClientCredentials { scope } => {
                if !scope.is_empty() {
                    params.push(("scope", scope.as_str()));
                }
            }
        }

        params.push(("client_id", self.client_id.as_str()));
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        params
    }

    /// Perform one token request.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Transport`] on network failure,
    /// [`ExchangeError::Decode`] if the body is not a JSON token payload and
    /// [`ExchangeError::MissingAccessToken`] if it carries no access token.
    pub async fn exchange(&self, grant: &GrantRequest) -> Result<TokenSet, ExchangeError> {
        let params = self.form_params(grant);

        tracing::debug!(
            token_endpoint = %self.token_endpoint,
            grant_type = grant.grant_type(),
            "requesting tokens"
        );

        let response = self
            .client
            .post(self.token_endpoint.clone())
            .header(ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let tokens: TokenSet = serde_json::from_str(&body).map_err(|source| {
            ExchangeError::Decode {
                status,
                source,
                body: body.clone(),
            }
        })?;

        if tokens.access_token.is_empty() {
            return Err(ExchangeError::MissingAccessToken {
                status,
                body: pretty_body(&body),
            });
        }

        tracing::debug!(%status, token_type = %tokens.token_type, "token request succeeded");
        Ok(tokens)
    }
}

/// Re-indent a JSON body for display; non-JSON bodies pass through.
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
