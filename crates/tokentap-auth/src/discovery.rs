//! OpenID Connect discovery (`.well-known/openid-configuration`).

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::error::DiscoveryError;

/// The subset of provider metadata used to fill in endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

/// Fetch and decode the metadata document at `url`.
///
/// # Errors
///
/// Returns [`DiscoveryError::Status`] for anything but a 200 response and
/// [`DiscoveryError::Transport`] when the request or JSON decoding fails.
pub async fn fetch_metadata(url: &str, timeout: Duration) -> Result<ProviderMetadata, DiscoveryError> {
    tracing::debug!(%url, "fetching provider metadata");

    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    if response.status() != StatusCode::OK {
        return Err(DiscoveryError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    Ok(response.json().await?)
}

impl ProviderMetadata {
    /// Copy each endpoint into `target` only where `target` is still empty.
    pub fn fill_missing(
        &self,
        authorization_endpoint: &mut String,
        token_endpoint: &mut String,
        userinfo_endpoint: &mut Option<String>,
    ) {
        if authorization_endpoint.is_empty() {
            authorization_endpoint.clone_from(&self.authorization_endpoint);
        }
        if token_endpoint.is_empty() {
            token_endpoint.clone_from(&self.token_endpoint);
        }
        if userinfo_endpoint.as_deref().is_none_or(str::is_empty)
            && !self.userinfo_endpoint.is_empty()
        {
            *userinfo_endpoint = Some(self.userinfo_endpoint.clone());
        }
    }
}
