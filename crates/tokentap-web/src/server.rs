//! Listener setup and the main control loop.
//!
//! [`CallbackServer`] composes the Axum router and owns the bound listener.
//! [`CallbackServer::run`] is the only place the listener is shut down:
//!
//! ```text
//! Idle ──bind──▶ Listening ──exit requested / interrupt──▶ ShuttingDown ──▶ Stopped
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::{CACHE_CONTROL, EXPIRES, PRAGMA};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::WebConfig;
use crate::error::ServerError;
use crate::handlers;
use crate::lifecycle::Lifecycle;
use crate::state::AppState;

/// Where the listener is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Listening,
    ShuttingDown,
    Stopped,
}

/// The local callback server.
pub struct CallbackServer {
    listener: TcpListener,
    state: Arc<AppState>,
    status: watch::Sender<ServerState>,
}

impl CallbackServer {
    /// Bind `config`'s address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(config: &WebConfig, state: AppState) -> Result<Self, ServerError> {
        let addr = config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self::from_listener(listener, state))
    }

    /// Serve on an already bound listener.
    pub fn from_listener(listener: TcpListener, state: AppState) -> Self {
        let (status, _) = watch::channel(ServerState::Idle);
        Self {
            listener,
            state: Arc::new(state),
            status,
        }
    }

    /// The bound address.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.status.subscribe()
    }

    /// The lifecycle handle shared with the handlers.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.state.lifecycle
    }

    /// Build the Axum router with all routes registered.
    ///
    /// The callback path is matched in the fallback handler so that any
    /// configured path is served verbatim, whatever characters it holds.
    pub fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/", get(handlers::index))
            .route("/login", get(handlers::login))
            .fallback(handlers::fallback)
            .layer(SetResponseHeaderLayer::overriding(
                CACHE_CONTROL,
                HeaderValue::from_static("no-cache, private, max-age=0"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                PRAGMA,
                HeaderValue::from_static("no-cache"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                EXPIRES,
                HeaderValue::from_static("0"),
            ))
            .with_state(state)
    }

    /// Serve until an exit is requested or `interrupt` resolves, then shut
    /// down within `grace` and return the exit code.
    ///
    /// An interrupt requests exit code 1 unless a handler already requested
    /// one. If the listener stops on its own the run ends with code 1.
    pub async fn run<F>(self, grace: Duration, interrupt: F) -> u8
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            state,
            status,
        } = self;
        let lifecycle = state.lifecycle.clone();
        let router = Self::router(state);

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(addr = %addr, "callback server listening");
        }
        status.send_replace(ServerState::Listening);

        let shutdown = {
            let lifecycle = lifecycle.clone();
            async move { lifecycle.wait().await }
        };
        let mut serve = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
        });

        tokio::pin!(interrupt);
        tokio::select! {
            () = lifecycle.wait() => {}
            () = &mut interrupt => {
                tracing::info!("interrupted, shutting down");
                lifecycle.request_exit_if_idle(1);
            }
            result = &mut serve => {
                match result {
                    Ok(Ok(())) => tracing::error!("callback server stopped unexpectedly"),
                    Ok(Err(e)) => tracing::error!(error = %e, "callback server failed"),
                    Err(e) => tracing::error!(error = %e, "callback server task failed"),
                }
                lifecycle.request_exit(1);
                status.send_replace(ServerState::Stopped);
                return lifecycle.exit_code();
            }
        }

        status.send_replace(ServerState::ShuttingDown);
        tracing::debug!(grace_secs = grace.as_secs(), "shutting down callback server");

        match tokio::time::timeout(grace, &mut serve).await {
            Ok(Ok(Ok(()))) => tracing::debug!("callback server stopped"),
            Ok(Ok(Err(e))) => tracing::error!(error = %e, "callback server failed during shutdown"),
            Ok(Err(e)) => tracing::error!(error = %e, "callback server task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "grace period expired, closing listener"
                );
                serve.abort();
            }
        }

        status.send_replace(ServerState::Stopped);
        lifecycle.exit_code()
    }
}
