//! OAuth 2.0 / OpenID Connect client flows for tokentap.
//!
//! This crate holds everything that talks to the identity provider:
//!
//! - **PKCE** verifier/challenge generation (RFC 7636, `S256` only)
//! - **State** generation for callback correlation
//! - **Token exchange** for the authorization code, refresh token and
//!   client credentials grants
//! - **Userinfo** and **discovery** lookups
//! - **Flow orchestration**: authorization URL building and single-use
//!   callback validation
//!
//! It has no HTTP server and no process lifecycle; the `tokentap-web` crate
//! serves the callback and decides when the run ends.
//!
//! # Architecture
//!
//! ```text
//! AuthCodeFlow
//! ├── FlowConfig      (validated, read-only)
//! ├── TokenClient     (POST token endpoint)
//! └── UserInfoClient  (GET userinfo endpoint, best-effort)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tokentap_auth::{AuthCodeFlow, CallbackParams, FlowConfig, PkcePair, generate_state};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = FlowConfig::new(
//!     "https://idp.example/authorize",
//!     "https://idp.example/token",
//!     "my-client",
//! );
//! config.state = generate_state();
//! config.pkce = Some(PkcePair::generate());
//! config.validate()?;
//!
//! let flow = AuthCodeFlow::new(config)?;
//! println!("open {}", flow.authorization_url()?);
//!
//! let params = CallbackParams::parse(Some("code=abc&state=..."), None)?;
//! let tokens = flow.handle_callback(params).await?;
//! println!("{}", tokens.to_pretty_json());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod pkce;
pub mod sink;
pub mod state;
pub mod tokens;
pub mod userinfo;

// Re-export key types at the crate root for convenience.
pub use config::{FlowConfig, FlowMode};
pub use discovery::{ProviderMetadata, fetch_metadata};
pub use error::{
    ConfigError, DirectGrantError, DiscoveryError, ExchangeError, FlowError, UserInfoError,
};
pub use exchange::{GrantRequest, TokenClient};
pub use flow::{AuthCodeFlow, CallbackParams, run_direct_grant};
pub use pkce::PkcePair;
pub use sink::TokenSink;
pub use state::generate_state;
pub use tokens::TokenSet;
pub use userinfo::UserInfoClient;
