//! Request handlers.
//!
//! Only the callback path ends the run; `/` and `/login` can be hit any
//! number of times.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{RawQuery, State};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

use tokentap_auth::CallbackParams;

use crate::frontend::{INDEX_HTML, SUCCESS_HTML};
use crate::state::AppState;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /login`: 302 to the IDP authorization endpoint.
pub async fn login(State(state): State<Arc<AppState>>) -> Response {
    tracing::debug!(url = %state.authorization_url, "redirecting to authorization endpoint");

    match HeaderValue::from_str(&state.authorization_url) {
        Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "authorization URL is not a valid header value");
            (StatusCode::INTERNAL_SERVER_ERROR, "invalid authorization URL").into_response()
        }
    }
}

/// Everything that is not `/` or `/login`. Requests to the callback path
/// are resolved by the flow; anything else is a 404.
pub async fn fallback(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    if uri.path() != state.callback_path() {
        return StatusCode::NOT_FOUND.into_response();
    }
    if method != Method::GET && method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    // The flow runs detached from the connection. If the client goes away,
    // the finished response is dropped with the join handle and its body
    // still requests the exit.
    let task = tokio::spawn({
        let state = Arc::clone(&state);
        async move { callback(&state, query.as_deref(), &body).await }
    });
    match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "callback task failed");
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            respond(
                &state,
                status,
                TEXT_PLAIN,
                "callback failed",
                i64::from(status.as_u16()),
            )
        }
    }
}

/// Resolve one callback and end the run with its outcome.
///
/// Tokens are handed to the sink before the response is built. The exit is
/// requested once the response body has been written or dropped.
async fn callback(state: &AppState, query: Option<&str>, body: &[u8]) -> Response {
    tracing::debug!("processing callback for authorization code");

    let result = match CallbackParams::parse(query, Some(body)) {
        Ok(params) => state.flow.handle_callback(params).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tokens) => {
            state.sink.deliver(&tokens);
            tracing::info!("tokens received");
            respond(state, StatusCode::OK, TEXT_HTML, SUCCESS_HTML, 0)
        }
        Err(e) => {
            let status = e.status();
            tracing::error!(%status, error = %e, "callback failed");
            respond(state, status, TEXT_PLAIN, e.to_string(), i64::from(status.as_u16()))
        }
    }
}

fn respond(
    state: &AppState,
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
    exit_code: i64,
) -> Response {
    let body: Body = state.lifecycle.body_then_exit(body, exit_code);
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static(content_type))],
        body,
    )
        .into_response()
}
