//! Token endpoint behaviour against a stub IDP.

use std::sync::Mutex;
use std::time::Duration;

use tokentap_auth::{
    DirectGrantError, ExchangeError, FlowConfig, GrantRequest, TokenClient, TokenSet,
    run_direct_grant,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, secret: Option<&str>) -> TokenClient {
    TokenClient::new(
        &format!("{}/token", server.uri()),
        "abc",
        secret.map(String::from),
        Duration::from_secs(5),
    )
    .expect("token client")
}

fn refresh_config(server: &MockServer) -> FlowConfig {
    let mut config = FlowConfig::new("", format!("{}/token", server.uri()), "abc");
    config.client_secret = Some("shh".to_string());
    config.refresh_token = Some("RT-OLD".to_string());
    config.state = "unused".to_string();
    config
}

#[tokio::test]
async fn authorization_code_grant_posts_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=XYZ123"))
        .and(body_string_contains("code_verifier=V"))
        .and(body_string_contains("client_secret=shh"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"access_token":"AT1","token_type":"Bearer","expires_in":3600,"refresh_token":"RT1"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let grant = GrantRequest::AuthorizationCode {
        code: "XYZ123".to_string(),
        redirect_uri: "http://localhost:9000/cb".to_string(),
        code_verifier: Some("V".to_string()),
    };
    let tokens = client(&server, Some("shh")).exchange(&grant).await.unwrap();

    assert_eq!(tokens.access_token, "AT1");
    assert_eq!(tokens.expires_in, 3600);
    assert_eq!(tokens.refresh_token.as_deref(), Some("RT1"));
}

#[tokio::test]
async fn empty_access_token_on_200_is_a_failure_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"access_token":"","error":"invalid_grant"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let grant = GrantRequest::RefreshToken {
        refresh_token: "RT".to_string(),
    };
    let err = client(&server, None).exchange(&grant).await.unwrap_err();

    match err {
        ExchangeError::MissingAccessToken { status, body } => {
            assert_eq!(status.as_u16(), 200);
            assert!(body.contains("invalid_grant"), "body was: {body}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn error_status_with_json_body_is_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":"invalid_client","error_description":"bad secret"}"#,
        ))
        .mount(&server)
        .await;

    let grant = GrantRequest::ClientCredentials {
        scope: String::new(),
    };
    let err = client(&server, None).exchange(&grant).await.unwrap_err();

    match err {
        ExchangeError::MissingAccessToken { status, body } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("bad secret"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let grant = GrantRequest::RefreshToken {
        refresh_token: "RT".to_string(),
    };
    let err = client(&server, None).exchange(&grant).await.unwrap_err();

    match err {
        ExchangeError::Decode { status, body, .. } => {
            assert_eq!(status.as_u16(), 502);
            assert_eq!(body, "<html>bad gateway</html>");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let endpoint = format!("http://127.0.0.1:{port}/token");
    let client = TokenClient::new(&endpoint, "abc", None, Duration::from_secs(2))
        .expect("token client");
    let grant = GrantRequest::RefreshToken {
        refresh_token: "RT".to_string(),
    };
    let err = client.exchange(&grant).await.unwrap_err();
    assert!(matches!(err, ExchangeError::Transport(_)), "got {err}");
}

#[tokio::test]
async fn refresh_grant_calls_token_endpoint_once_and_delivers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=RT-OLD"))
        .and(body_string_contains("client_id=abc"))
        .and(body_string_contains("client_secret=shh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"access_token":"AT2","expires_in":"60"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Mutex::new(Vec::new());
    let sink = |tokens: &TokenSet| delivered.lock().unwrap().push(tokens.clone());

    let tokens = run_direct_grant(&refresh_config(&server), &sink).await.unwrap();

    assert_eq!(tokens.access_token, "AT2");
    assert_eq!(tokens.expires_in, 60);
    assert_eq!(*delivered.lock().unwrap(), vec![tokens]);
}

#[tokio::test]
async fn refresh_grant_failure_delivers_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let delivered = Mutex::new(0usize);
    let sink = |_: &TokenSet| *delivered.lock().unwrap() += 1;

    let err = run_direct_grant(&refresh_config(&server), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DirectGrantError::Exchange(ExchangeError::MissingAccessToken { .. })
    ));
    assert_eq!(*delivered.lock().unwrap(), 0);
}

#[tokio::test]
async fn client_credentials_grant_attaches_userinfo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("scope=api"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"access_token":"AT3"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer AT3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"sub":"svc"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = FlowConfig::new("", format!("{}/token", server.uri()), "abc");
    config.client_credentials = true;
    config.scope = "api".to_string();
    config.fetch_userinfo = true;
    config.userinfo_endpoint = Some(format!("{}/userinfo", server.uri()));

    let sink = |_: &TokenSet| {};
    let tokens = run_direct_grant(&config, &sink).await.unwrap();

    let userinfo = tokens.userinfo.expect("userinfo attached");
    assert_eq!(userinfo["sub"], "svc");
}
