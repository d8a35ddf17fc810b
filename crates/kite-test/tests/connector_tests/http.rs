//! The connector over the real HTTP transport, against a mock daemon.

use std::sync::Arc;

use kite_core::{ConnectorConfig, HealthState, HttpClient, KiteConnector, RequestOptions};
use kite_test::{KiteSetup, TestAdapter};

fn connector_for(server: &mockito::ServerGuard, setup: &KiteSetup) -> (KiteConnector, HttpClient) {
    let config = ConnectorConfig::default()
        .with_hostname("127.0.0.1")
        .with_port(server.socket_address().port());
    let http = HttpClient::from_config(&config).unwrap();
    let connector = KiteConnector::new(Arc::new(TestAdapter::new(setup)), Arc::new(http.clone())).with_config(config);
    (connector, http)
}

#[tokio::test]
async fn ready_daemon_over_http() {
    let mut server = mockito::Server::new_async().await;
    let settings = server.mock("GET", "/settings").with_status(200).create_async().await;
    let user = server
        .mock("GET", "/clientapi/user")
        .with_status(200)
        .with_body(r#"{"name":"kite"}"#)
        .create_async()
        .await;

    let (kite, _) = connector_for(&server, &KiteSetup::new().reachable(true));
    assert_eq!(kite.check_health().await.unwrap(), HealthState::Ready);
    settings.assert_async().await;
    user.assert_async().await;
}

#[tokio::test]
async fn logged_out_daemon_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _settings = server.mock("GET", "/settings").with_status(200).create_async().await;
    let _user = server.mock("GET", "/clientapi/user").with_status(401).create_async().await;

    let (kite, _) = connector_for(&server, &KiteSetup::new().reachable(true));
    assert_eq!(kite.check_health().await.unwrap(), HealthState::Unlogged);
}

#[tokio::test]
async fn health_probe_error_status_is_unreachable() {
    let mut server = mockito::Server::new_async().await;
    let _settings = server.mock("GET", "/settings").with_status(503).create_async().await;

    let (kite, _) = connector_for(&server, &KiteSetup::new().reachable(true));
    assert_eq!(kite.check_health().await.unwrap(), HealthState::Unreachable);
}

#[tokio::test]
async fn session_cookie_is_sent_back() {
    let mut server = mockito::Server::new_async().await;
    let _login = server
        .mock("POST", "/clientapi/login")
        .with_status(200)
        .with_header("set-cookie", "kite-session=abc123; Path=/; HttpOnly")
        .create_async()
        .await;
    let authed = server
        .mock("GET", "/clientapi/user")
        .match_header("cookie", "kite-session=abc123")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let (kite, http) = connector_for(&server, &KiteSetup::new().reachable(true));
    kite.request(&RequestOptions::post("/clientapi/login"), Some(b"{}"), None).await.unwrap();
    assert_eq!(http.cookies().header().as_deref(), Some("kite-session=abc123"));

    kite.request(&RequestOptions::get("/clientapi/user"), None, None).await.unwrap();
    authed.assert_async().await;
}

#[tokio::test]
async fn refused_connection_is_diagnosed() {
    let config = ConnectorConfig::default().with_hostname("127.0.0.1").with_port(9);
    let kite = KiteConnector::from_config(Arc::new(TestAdapter::new(&KiteSetup::new().installed(true))), config)
        .unwrap();
    let err = kite.request(&RequestOptions::get("/clientapi/user"), None, None).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::NotRunning));
}

#[tokio::test]
async fn toggling_request_debug_keeps_connector_usable() {
    let mut server = mockito::Server::new_async().await;
    let _settings = server.mock("GET", "/settings").with_status(200).expect(2).create_async().await;

    let (kite, _) = connector_for(&server, &KiteSetup::new().reachable(true));
    assert!(!kite.is_request_debug());
    kite.is_kite_reachable().await.unwrap();

    assert!(kite.toggle_request_debug().unwrap());
    assert!(kite.is_request_debug());
    kite.is_kite_reachable().await.unwrap();
}
