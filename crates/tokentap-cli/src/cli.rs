//! CLI argument definitions for tokentap.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! running the selected flow. Every setting can also come from a
//! `TOKENTAP_*` environment variable or the `--config` file; see
//! [`crate::config`] for the precedence rules.

use std::path::PathBuf;

use clap::Parser;

/// tokentap -- fetch and inspect OAuth 2.0 / OIDC tokens.
#[derive(Debug, Parser)]
#[command(
    name = "tokentap",
    version,
    about = "tokentap -- fetch and inspect OAuth 2.0 / OIDC tokens",
    long_about = "Runs the authorization code flow (with optional PKCE) against an identity \
                  provider through a local callback server, or redeems a refresh token or \
                  client credentials directly, and prints the resulting tokens as JSON."
)]
pub struct Cli {
    /// TOML file with default settings.
    #[arg(long, env = "TOKENTAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// OIDC discovery document used to fill in missing endpoints.
    #[arg(long, env = "TOKENTAP_METADATA_ENDPOINT")]
    pub metadata_endpoint: Option<String>,

    /// IDP authorization endpoint.
    #[arg(long, env = "TOKENTAP_AUTH_ENDPOINT")]
    pub auth_endpoint: Option<String>,

    /// IDP token endpoint.
    #[arg(long, env = "TOKENTAP_TOKEN_ENDPOINT")]
    pub token_endpoint: Option<String>,

    /// IDP userinfo endpoint.
    #[arg(long, env = "TOKENTAP_USERINFO_ENDPOINT")]
    pub userinfo_endpoint: Option<String>,

    /// Path of the redirect URI [default: /oauth2/callback].
    #[arg(long, env = "TOKENTAP_CALLBACK_PATH")]
    pub callback_path: Option<String>,

    /// Port of the local callback server [default: 8080].
    #[arg(long, short, env = "TOKENTAP_PORT")]
    pub port: Option<u16>,

    /// Address the callback server binds to [default: 127.0.0.1].
    #[arg(long, env = "TOKENTAP_BIND")]
    pub bind: Option<String>,

    /// OAuth client ID.
    #[arg(long, env = "TOKENTAP_CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret.
    #[arg(long, env = "TOKENTAP_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Requested scopes, comma or space separated [default: openid,offline_access].
    #[arg(long, env = "TOKENTAP_SCOPE")]
    pub scope: Option<String>,

    /// State sent with the authorization request [default: random].
    #[arg(long, env = "TOKENTAP_STATE")]
    pub state: Option<String>,

    /// Use PKCE [default: true].
    #[arg(
        long,
        env = "TOKENTAP_PKCE",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub pkce: Option<bool>,

    /// PKCE code verifier [default: random].
    #[arg(long, env = "TOKENTAP_CODE_VERIFIER", hide_env_values = true)]
    pub code_verifier: Option<String>,

    /// PKCE code challenge [default: derived from the verifier].
    #[arg(long, env = "TOKENTAP_CODE_CHALLENGE")]
    pub code_challenge: Option<String>,

    /// Redeem this refresh token instead of running the interactive flow.
    #[arg(long, env = "TOKENTAP_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Run the client credentials grant instead of the interactive flow.
    #[arg(long, env = "TOKENTAP_CLIENT_CREDENTIALS")]
    pub client_credentials: bool,

    /// Fetch userinfo after obtaining tokens.
    #[arg(long, env = "TOKENTAP_USERINFO")]
    pub userinfo: bool,

    /// Do not open a browser window; only print the login URL.
    #[arg(long, env = "TOKENTAP_NO_BROWSER")]
    pub no_browser: bool,

    /// Print diagnostics, the effective configuration and decoded tokens.
    #[arg(long, short, env = "TOKENTAP_VERBOSE")]
    pub verbose: bool,

    /// Timeout for each call to the IDP in seconds [default: 30].
    #[arg(long, env = "TOKENTAP_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Shutdown grace period in seconds [default: 15].
    #[arg(long, env = "TOKENTAP_GRACE_SECS")]
    pub grace_secs: Option<u64>,
}
