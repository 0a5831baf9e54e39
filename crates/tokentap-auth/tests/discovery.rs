//! Provider metadata retrieval against a stub IDP.

use std::time::Duration;

use tokentap_auth::{DiscoveryError, fetch_metadata};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const METADATA_PATH: &str = "/.well-known/openid-configuration";

#[tokio::test]
async fn metadata_request_asks_for_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(METADATA_PATH))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"issuer":"https://idp.example","token_endpoint":"https://idp.example/token"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}{METADATA_PATH}", server.uri());
    let metadata = fetch_metadata(&url, Duration::from_secs(5))
        .await
        .expect("metadata");

    assert_eq!(metadata.issuer, "https://idp.example");
    assert_eq!(metadata.token_endpoint, "https://idp.example/token");
    assert!(metadata.authorization_endpoint.is_empty());
}

#[tokio::test]
async fn non_ok_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}{METADATA_PATH}", server.uri());
    let err = fetch_metadata(&url, Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DiscoveryError::Status { status, .. } if status.as_u16() == 404),
        "got {err}"
    );
}
