//! Error types for the callback server.

/// The listener could not be started or failed while serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The address could not be bound, typically because the port is taken.
    #[error("could not listen on {addr}: {source}")]
    Bind {
        /// The `host:port` that was requested.
        addr: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Accepting connections failed.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    /// The login redirect URL could not be built.
    #[error(transparent)]
    Config(#[from] tokentap_auth::ConfigError),
}
