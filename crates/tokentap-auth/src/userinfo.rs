//! OIDC userinfo lookups.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::{Map, Value};

use crate::error::UserInfoError;

/// Fetches the claims of the user an access token was issued to.
#[derive(Debug, Clone)]
pub struct UserInfoClient {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl UserInfoClient {
    /// Create a client for `endpoint`. With no endpoint every fetch fails
    /// with [`UserInfoError::NotConfigured`].
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.filter(|e| !e.is_empty()),
        })
    }

    /// GET the userinfo endpoint with `access_token` as a bearer credential.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, a non-2xx status, or a body that is not a
    /// JSON object.
    pub async fn fetch(&self, access_token: &str) -> Result<Map<String, Value>, UserInfoError> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or(UserInfoError::NotConfigured)?;

        tracing::debug!(%endpoint, "fetching userinfo");

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UserInfoError::Status { status, body });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
