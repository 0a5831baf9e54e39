//! Effective run configuration.
//!
//! Each setting is taken from the first source that provides it:
//!
//! 1. command-line flag
//! 2. `TOKENTAP_*` environment variable (clap reads these; `.env` is loaded
//!    by `main` before parsing)
//! 3. the `--config` TOML file
//! 4. the built-in default
//!
//! Boolean switches are on if any source turns them on. Endpoints still
//! missing afterwards are filled from the discovery document when a
//! metadata endpoint is configured.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tokentap_auth::config::{DEFAULT_CALLBACK_PATH, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_PORT};
use tokentap_auth::{ConfigError, FlowConfig, PkcePair, fetch_metadata, generate_state, pkce};
use tokentap_web::{DEFAULT_GRACE_SECS, WebConfig};

use crate::cli::Cli;

/// Scopes requested when none are configured.
pub const DEFAULT_SCOPE: &str = "openid,offline_access";

/// Address the callback server binds to by default.
pub const DEFAULT_BIND: &str = "127.0.0.1";

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Settings read from the `--config` TOML file. Keys are the long flag names
/// with `_` instead of `-`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub metadata_endpoint: Option<String>,
    pub auth_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub userinfo_endpoint: Option<String>,
    pub callback_path: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub state: Option<String>,
    pub pkce: Option<bool>,
    pub code_verifier: Option<String>,
    pub code_challenge: Option<String>,
    pub refresh_token: Option<String>,
    pub client_credentials: Option<bool>,
    pub userinfo: Option<bool>,
    pub no_browser: Option<bool>,
    pub verbose: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub grace_secs: Option<u64>,
}

impl FileConfig {
    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Everything `main` needs for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub flow: FlowConfig,
    pub web: WebConfig,
    pub grace: Duration,
    pub open_browser: bool,
    pub verbose: bool,
}

/// Printable form of [`Settings`] with secrets masked.
#[derive(Serialize)]
struct SettingsDump {
    #[serde(flatten)]
    flow: FlowConfig,
    mode: tokentap_auth::FlowMode,
    bind: String,
    timeout_secs: u64,
    grace_secs: u64,
    open_browser: bool,
    verbose: bool,
}

impl Settings {
    /// Check the flow configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flow.validate()
    }

    /// The effective configuration as pretty JSON, secrets masked.
    pub fn redacted_json(&self) -> String {
        let dump = SettingsDump {
            flow: self.flow.redacted(),
            mode: self.flow.mode(),
            bind: self.web.bind_addr.clone(),
            timeout_secs: self.flow.http_timeout.as_secs(),
            grace_secs: self.grace.as_secs(),
            open_browser: self.open_browser,
            verbose: self.verbose,
        };
        serde_json::to_string_pretty(&dump).unwrap_or_default()
    }
}

/// Layer flags, environment, config file and defaults, then run discovery.
///
/// # Errors
///
/// Fails only if the config file cannot be read or parsed. Invalid values
/// are left for [`Settings::validate`]; discovery failures are logged.
pub async fn resolve(cli: Cli) -> Result<Settings> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let mut settings = layer(cli, file);

    if let Some(metadata_endpoint) = settings.metadata_endpoint.take() {
        match fetch_metadata(&metadata_endpoint, settings.settings.flow.http_timeout).await {
            Ok(metadata) => {
                let flow = &mut settings.settings.flow;
                metadata.fill_missing(
                    &mut flow.authorization_endpoint,
                    &mut flow.token_endpoint,
                    &mut flow.userinfo_endpoint,
                );
            }
            Err(e) => tracing::warn!(
                url = %metadata_endpoint,
                error = %e,
                "could not fetch provider metadata"
            ),
        }
    }

    Ok(settings.settings)
}

/// Settings plus the discovery URL still to be applied.
pub struct Layered {
    pub settings: Settings,
    pub metadata_endpoint: Option<String>,
}

/// Combine `cli` and `file` without any network activity.
pub fn layer(cli: Cli, file: FileConfig) -> Layered {
    let verbose = cli.verbose || file.verbose.unwrap_or(false);
    let port = cli.port.or(file.port).unwrap_or(DEFAULT_PORT);

    let mut flow = FlowConfig::new(
        cli.auth_endpoint.or(file.auth_endpoint).unwrap_or_default(),
        cli.token_endpoint.or(file.token_endpoint).unwrap_or_default(),
        cli.client_id.or(file.client_id).unwrap_or_default(),
    );
    flow.userinfo_endpoint = cli
        .userinfo_endpoint
        .or(file.userinfo_endpoint)
        .filter(|e| !e.is_empty());
    flow.callback_path = cli
        .callback_path
        .or(file.callback_path)
        .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string());
    flow.port = port;
    flow.client_secret = cli.client_secret.or(file.client_secret).filter(|s| !s.is_empty());
    flow.scope = normalize_scope(
        &cli.scope
            .or(file.scope)
            .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
    );
    flow.state = cli
        .state
        .or(file.state)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(generate_state);
    flow.fetch_userinfo = cli.userinfo || file.userinfo.unwrap_or(false);
    flow.refresh_token = cli.refresh_token.or(file.refresh_token).filter(|t| !t.is_empty());
    flow.client_credentials = cli.client_credentials || file.client_credentials.unwrap_or(false);
    flow.http_timeout = Duration::from_secs(
        cli.timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    );

    if cli.pkce.or(file.pkce).unwrap_or(true) {
        let verifier = cli
            .code_verifier
            .or(file.code_verifier)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(pkce::generate_verifier);
        let mut pair = PkcePair::from_verifier(verifier);
        if let Some(challenge) = cli.code_challenge.or(file.code_challenge).filter(|c| !c.is_empty()) {
            pair.challenge = challenge;
        }
        flow.pkce = Some(pair);
    }

    let web = WebConfig {
        bind_addr: cli
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        port,
    };

    Layered {
        settings: Settings {
            flow,
            web,
            grace: Duration::from_secs(
                cli.grace_secs.or(file.grace_secs).unwrap_or(DEFAULT_GRACE_SECS),
            ),
            open_browser: !(cli.no_browser || file.no_browser.unwrap_or(false)),
            verbose,
        },
        metadata_endpoint: cli
            .metadata_endpoint
            .or(file.metadata_endpoint)
            .filter(|e| !e.is_empty()),
    }
}

/// Turn comma and/or space separated scopes into a single space separated
/// string.
pub fn normalize_scope(scope: &str) -> String {
    scope
        .split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
