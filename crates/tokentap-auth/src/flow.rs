//! The authorization code flow and the two non-interactive grants.
//!
//! # Flow Overview
//!
//! 1. [`AuthCodeFlow::authorization_url`] builds the IDP redirect carrying
//!    the expected `state` and, with PKCE, the code challenge.
//! 2. The IDP redirects the browser back to the callback path.
//!    [`CallbackParams::parse`] pulls the parameters out of the query
//!    string and, for `form_post` responses, the body.
//! 3. [`AuthCodeFlow::handle_callback`] checks `state`, claims the single
//!    pending authorization and redeems the code.
//! 4. Userinfo is fetched on a best-effort basis.
//!
//! [`run_direct_grant`] covers the refresh token and client credentials
//! grants, which need no browser and no listener.

use std::sync::atomic::{AtomicBool, Ordering};

use url::Url;
use url::form_urlencoded;

use crate::config::{FlowConfig, FlowMode};
use crate::error::{ConfigError, DirectGrantError, ExchangeError, FlowError};
use crate::exchange::{GrantRequest, TokenClient};
use crate::pkce::CHALLENGE_METHOD;
use crate::sink::TokenSink;
use crate::tokens::TokenSet;
use crate::userinfo::UserInfoClient;

// ---------------------------------------------------------------------------
// Callback parameters
// ---------------------------------------------------------------------------

/// Parameters the IDP sends back to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse the raw query string and an optional form body.
    ///
    /// Query and body parameters are merged. A parameter the flow relies on
    /// (`code`, `state`, `error`) appearing more than once is ambiguous and
    /// rejected, as is a body that is not UTF-8.
    pub fn parse(query: Option<&str>, body: Option<&[u8]>) -> Result<Self, FlowError> {
        let body = match body {
            Some(bytes) if !bytes.is_empty() => {
                Some(std::str::from_utf8(bytes).map_err(|e| FlowError::MalformedRequest {
                    reason: format!("form body is not UTF-8: {e}"),
                })?)
            }
            _ => None,
        };

        let mut params = Self::default();
        let sources = query.into_iter().chain(body);
        for source in sources {
            for (key, value) in form_urlencoded::parse(source.as_bytes()) {
                let slot = match &*key {
                    "code" => &mut params.code,
                    "state" => &mut params.state,
                    "error" => &mut params.error,
                    "error_description" => &mut params.error_description,
                    _ => continue,
                };
                if slot.is_some() {
                    return Err(FlowError::MalformedRequest {
                        reason: format!("duplicate '{key}' parameter"),
                    });
                }
                *slot = Some(value.into_owned());
            }
        }

        Ok(params)
    }
}

// ---------------------------------------------------------------------------
// Authorization code flow
// ---------------------------------------------------------------------------

/// The single pending authorization of this process and the clients needed
/// to complete it.
#[derive(Debug)]
pub struct AuthCodeFlow {
    config: FlowConfig,
    tokens: TokenClient,
    userinfo: Option<UserInfoClient>,
    consumed: AtomicBool,
}

impl AuthCodeFlow {
    /// Build the flow for a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP clients cannot be built or the token endpoint is
    /// not a URL.
    pub fn new(config: FlowConfig) -> Result<Self, ExchangeError> {
        let tokens = TokenClient::from_config(&config)?;
        let userinfo = userinfo_client(&config)?;
        Ok(Self {
            config,
            tokens,
            userinfo,
            consumed: AtomicBool::new(false),
        })
    }

    /// The configuration this flow was built from.
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Whether a callback has already claimed the pending authorization.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::SeqCst)
    }

    /// Build the URL the browser is redirected to.
    ///
    /// Parameters are appended to any query already present on the
    /// authorization endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the authorization endpoint is not
    /// a URL.
    pub fn authorization_url(&self) -> Result<Url, ConfigError> {
        let config = &self.config;
        let mut url =
            Url::parse(&config.authorization_endpoint).map_err(|e| ConfigError::Invalid {
                field: "authorization endpoint",
                reason: format!("`{}`: {e}", config.authorization_endpoint),
            })?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("client_id", &config.client_id);
            params.append_pair("redirect_uri", &config.redirect_uri());
            params.append_pair("scope", &config.scope);
            params.append_pair("response_type", "code");
            params.append_pair("state", &config.state);

            if let Some(pair) = &config.pkce {
                params.append_pair("code_challenge", &pair.challenge);
                params.append_pair("code_challenge_method", CHALLENGE_METHOD);
            }
        }

        Ok(url)
    }

    /// Validate one callback and redeem its code.
    ///
    /// Checks run in this order: `state` (the only CSRF defence, checked
    /// even when `code` is absent), an IDP `error`, a non-empty `code`, and
    /// finally single-use consumption. Only the last step makes network
    /// calls; a callback rejected before it leaves the pending authorization
    /// available.
    ///
    /// # Errors
    ///
    /// See [`FlowError`].
    pub async fn handle_callback(&self, params: CallbackParams) -> Result<TokenSet, FlowError> {
        let received = params.state.unwrap_or_default();
        if received != self.config.state {
            return Err(FlowError::StateMismatch {
                expected: self.config.state.clone(),
                received,
            });
        }

        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            return Err(FlowError::AuthorizationDenied {
                error,
                description: params.error_description.filter(|d| !d.is_empty()),
            });
        }

        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(FlowError::MissingCode)?;

        if self.consumed.swap(true, Ordering::SeqCst) {
            return Err(FlowError::AlreadyConsumed);
        }

        tracing::debug!("redeeming authorization code");

        let grant = GrantRequest::AuthorizationCode {
            code,
            redirect_uri: self.config.redirect_uri(),
            code_verifier: self.config.pkce.as_ref().map(|p| p.verifier.clone()),
        };
        let mut tokens = self.tokens.exchange(&grant).await?;

        attach_userinfo(self.userinfo.as_ref(), &mut tokens).await;
        Ok(tokens)
    }
}

// ---------------------------------------------------------------------------
// Direct grants
// ---------------------------------------------------------------------------

/// Run the refresh token or client credentials grant once and deliver the
/// result to `sink`.
///
/// # Errors
///
/// Returns [`DirectGrantError::Interactive`] for an authorization code
/// configuration, otherwise the exchange failure. Userinfo failures are only
/// logged.
pub async fn run_direct_grant(
    config: &FlowConfig,
    sink: &dyn TokenSink,
) -> Result<TokenSet, DirectGrantError> {
    let grant = match config.mode() {
        FlowMode::RefreshToken => GrantRequest::RefreshToken {
            refresh_token: config.refresh_token.clone().unwrap_or_default(),
        },
        FlowMode::ClientCredentials => GrantRequest::ClientCredentials {
            scope: config.scope.clone(),
        },
        FlowMode::AuthorizationCode => return Err(DirectGrantError::Interactive),
    };

    tracing::debug!(grant_type = grant.grant_type(), "running direct grant");

    let client = TokenClient::from_config(config)?;
    let mut tokens = client.exchange(&grant).await?;

    let userinfo = userinfo_client(config)?;
    attach_userinfo(userinfo.as_ref(), &mut tokens).await;

    sink.deliver(&tokens);
    Ok(tokens)
}

fn userinfo_client(config: &FlowConfig) -> Result<Option<UserInfoClient>, ExchangeError> {
    if !config.fetch_userinfo {
        return Ok(None);
    }
    let client = UserInfoClient::new(config.userinfo_endpoint.clone(), config.http_timeout)?;
    Ok(Some(client))
}

async fn attach_userinfo(client: Option<&UserInfoClient>, tokens: &mut TokenSet) {
    let Some(client) = client else {
        return;
    };
    match client.fetch(&tokens.access_token).await {
        Ok(claims) => tokens.userinfo = Some(claims),
        Err(e) => tracing::warn!(error = %e, "could not fetch userinfo"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkce::PkcePair;

    fn config() -> FlowConfig {
        let mut config = FlowConfig::new(
            "https://idp.example/authorize",
            "https://idp.example/token",
            "abc",
        );
        config.callback_path = "/cb".to_string();
        config.port = 9000;
        config.scope = "openid offline_access".to_string();
        config.state = "xyz".to_string();
        config
    }

    #[test]
    fn authorization_url_parameter_order() {
        let flow = AuthCodeFlow::new(config()).unwrap();
        let url = flow.authorization_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://idp.example/authorize?client_id=abc\
             &redirect_uri=http%3A%2F%2Flocalhost%3A9000%2Fcb\
             &scope=openid+offline_access&response_type=code&state=xyz"
        );
    }

    #[test]
    fn authorization_url_with_pkce_and_existing_query() {
        let mut config = config();
        config.authorization_endpoint = "https://idp.example/authorize?prompt=login".to_string();
        let pair = PkcePair::generate();
        config.pkce = Some(pair.clone());

        let flow = AuthCodeFlow::new(config).unwrap();
        let url = flow.authorization_url().unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs[0], ("prompt".to_string(), "login".to_string()));
        assert_eq!(pairs[1].0, "client_id");
        assert_eq!(
            &pairs[pairs.len() - 2..],
            &[
                ("code_challenge".to_string(), pair.challenge),
                ("code_challenge_method".to_string(), "S256".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_authorization_endpoint_is_a_config_error() {
        let mut config = config();
        config.authorization_endpoint = "not a url".to_string();
        let flow = AuthCodeFlow::new(config).unwrap();
        assert!(matches!(
            flow.authorization_url(),
            Err(ConfigError::Invalid { field: "authorization endpoint", .. })
        ));
    }

    #[test]
    fn parse_query_only() {
        let params = CallbackParams::parse(Some("code=XYZ123&state=xyz&session_state=s"), None)
            .unwrap();
        assert_eq!(params.code.as_deref(), Some("XYZ123"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }

    #[test]
    fn parse_merges_form_body() {
        let params =
            CallbackParams::parse(Some("state=xyz"), Some(b"code=a%2Bb".as_slice())).unwrap();
        assert_eq!(params.code.as_deref(), Some("a+b"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn parse_rejects_duplicates_and_bad_bodies() {
        assert!(matches!(
            CallbackParams::parse(Some("code=a&code=b"), None),
            Err(FlowError::MalformedRequest { .. })
        ));
        assert!(matches!(
            CallbackParams::parse(Some("state=xyz"), Some(b"state=xyz".as_slice())),
            Err(FlowError::MalformedRequest { .. })
        ));
        assert!(matches!(
            CallbackParams::parse(None, Some([0xff, 0xfe].as_slice())),
            Err(FlowError::MalformedRequest { .. })
        ));
    }

    #[test]
    fn parse_error_response() {
        let params = CallbackParams::parse(
            Some("error=access_denied&error_description=user+cancelled&state=xyz"),
            None,
        )
        .unwrap();
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.error_description.as_deref(), Some("user cancelled"));
    }

    #[tokio::test]
    async fn denied_authorization_is_reported_after_state() {
        let flow = AuthCodeFlow::new(config()).unwrap();
        let params = CallbackParams {
            state: Some("xyz".to_string()),
            error: Some("access_denied".to_string()),
            ..CallbackParams::default()
        };
        let err = flow.handle_callback(params).await.unwrap_err();
        assert!(matches!(err, FlowError::AuthorizationDenied { .. }));
        assert!(!flow.is_consumed());
    }

    #[tokio::test]
    async fn direct_grant_refuses_interactive_config() {
        let sink = |_: &TokenSet| {};
        let err = run_direct_grant(&config(), &sink).await.unwrap_err();
        assert!(matches!(err, DirectGrantError::Interactive));
    }
}
