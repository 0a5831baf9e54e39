//! Error types for the tokentap auth crate.
//!
//! Each concern gets its own enum so callers can tell a bad configuration
//! (fatal before any network activity) from a failed callback (fatal to the
//! run, reported to the browser) from a failed userinfo fetch (logged and
//! ignored).

use reqwest::StatusCode;

/// The resolved configuration violates an invariant.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is empty.
    #[error("{field} not configured")]
    Missing {
        /// The setting that is missing.
        field: &'static str,
    },

    /// A setting is present but unusable.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// The offending setting.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// The back-channel call to the token endpoint failed.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The token endpoint URL could not be parsed.
    #[error("invalid token endpoint `{url}`: {source}")]
    InvalidEndpoint {
        /// The configured endpoint.
        url: String,
        /// The parse failure.
        source: url::ParseError,
    },

    /// Connection refused, timeout, TLS failure and similar.
    #[error("could not reach token endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body is not a JSON token response.
    #[error("could not parse token response (HTTP {status}): {source}; raw body: {body}")]
    Decode {
        /// HTTP status of the response.
        status: StatusCode,
        /// The JSON error.
        source: serde_json::Error,
        /// The raw response body.
        body: String,
    },

    /// The response decoded but carries no access token, which is how some
    /// IDPs report errors alongside a 200 status.
    #[error("no access token received (HTTP {status}), response: {body}")]
    MissingAccessToken {
        /// HTTP status of the response.
        status: StatusCode,
        /// The raw response body.
        body: String,
    },
}

/// The userinfo request failed. Never fatal to a flow.
#[derive(Debug, thiserror::Error)]
pub enum UserInfoError {
    /// No userinfo endpoint is configured.
    #[error("userinfo endpoint not configured")]
    NotConfigured,

    /// The request could not be sent or the body could not be read.
    #[error("could not send request for userinfo: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("userinfo request failed (HTTP {status}): {body}")]
    Status {
        /// HTTP status of the response.
        status: StatusCode,
        /// The raw response body.
        body: String,
    },

    /// The body is not a JSON object.
    #[error("could not parse userinfo response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Fetching the OIDC discovery document failed.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The request could not be sent or the body could not be read.
    #[error("could not fetch metadata document: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200.
    #[error("unexpected status code for {url}: {status}")]
    Status {
        /// The metadata URL.
        url: String,
        /// HTTP status of the response.
        status: StatusCode,
    },
}

/// A callback request could not be turned into tokens.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The query string or form body could not be parsed.
    #[error("could not parse query in callback: {reason}")]
    MalformedRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The `code` parameter is missing or empty.
    #[error("missing 'code' parameter in callback")]
    MissingCode,

    /// The `state` parameter does not match the pending authorization.
    #[error("unexpected state parameter value in callback, expected: {expected}, got: {received}")]
    StateMismatch {
        /// The state sent in the authorization request.
        expected: String,
        /// The state echoed back in the callback.
        received: String,
    },

    /// The IDP redirected back with an `error` parameter.
    #[error("authorization server returned error: {error}{}", description_suffix(.description))]
    AuthorizationDenied {
        /// The OAuth error code, e.g. `access_denied`.
        error: String,
        /// The optional `error_description`.
        description: Option<String>,
    },

    /// The pending authorization was already used by an earlier callback.
    #[error("authorization already consumed by an earlier callback")]
    AlreadyConsumed,

    /// The token exchange failed.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(#[from] ExchangeError),
}

impl FlowError {
    /// HTTP status reported to the browser for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ExchangeFailed(_) => StatusCode::BAD_GATEWAY,
            Self::AlreadyConsumed => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// A refresh token or client credentials grant could not produce tokens.
#[derive(Debug, thiserror::Error)]
pub enum DirectGrantError {
    /// The configuration selects the interactive flow.
    #[error("configuration selects the authorization code flow, which needs the callback server")]
    Interactive,

    /// The token request failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

fn description_suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::Missing { field: "client ID" };
        assert_eq!(err.to_string(), "client ID not configured");

        let err = ConfigError::Invalid {
            field: "port",
            reason: "must be in 1..=65535".to_string(),
        };
        assert_eq!(err.to_string(), "invalid port: must be in 1..=65535");
    }

    #[test]
    fn state_mismatch_display_names_both_values() {
        let err = FlowError::StateMismatch {
            expected: "abc".to_string(),
            received: "xyz".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected: abc"));
        assert!(msg.contains("got: xyz"));
    }

    #[test]
    fn authorization_denied_display() {
        let err = FlowError::AuthorizationDenied {
            error: "access_denied".to_string(),
            description: None,
        };
        assert_eq!(
            err.to_string(),
            "authorization server returned error: access_denied"
        );

        let err = FlowError::AuthorizationDenied {
            error: "access_denied".to_string(),
            description: Some("user cancelled".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "authorization server returned error: access_denied (user cancelled)"
        );
    }

    #[test]
    fn missing_access_token_keeps_raw_body() {
        let err = ExchangeError::MissingAccessToken {
            status: StatusCode::OK,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert!(err.to_string().contains("invalid_grant"));
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn flow_error_status_mapping() {
        assert_eq!(FlowError::MissingCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            FlowError::StateMismatch {
                expected: "a".into(),
                received: "b".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(FlowError::AlreadyConsumed.status(), StatusCode::CONFLICT);
        let exchange = FlowError::ExchangeFailed(ExchangeError::MissingAccessToken {
            status: StatusCode::OK,
            body: String::new(),
        });
        assert_eq!(exchange.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConfigError>();
        assert_send_sync::<ExchangeError>();
        assert_send_sync::<UserInfoError>();
        assert_send_sync::<DiscoveryError>();
        assert_send_sync::<FlowError>();
        assert_send_sync::<DirectGrantError>();
    }
}
