//! Guarded requests: status mapping and transport failure diagnosis.

use std::sync::Arc;

use kite_core::{Edition, ErrorKind, HealthState, KiteError, Method, RequestOptions};
use kite_test::{AdapterCall, CheckFailure, KiteSetup, fake_response, with_kite};
use parking_lot::Mutex;

#[tokio::test]
async fn status_codes_map_to_errors() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.route_get("/unlogged", 401, "");
    kite.client.route_get("/forbidden", 403, "");
    kite.client.route_get("/ok", 200, "hello");

    let err = kite.connector.request(&RequestOptions::get("/unlogged"), None, None).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unlogged));

    let err = kite.connector.request(&RequestOptions::get("/forbidden"), None, None).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::NotWhitelisted));

    let err = kite.connector.request(&RequestOptions::get("/missing"), None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadStatus);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.content(), Some("not found"));

    let response = kite.connector.request(&RequestOptions::get("/ok"), None, None).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.text(), "hello");
}

#[tokio::test]
async fn redirects_and_informational_statuses_pass_through() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.route(
        Method::Get,
        "/moved",
        fake_response(302, "").with_header("Location", "/elsewhere"),
    );
    let response = kite.connector.request(&RequestOptions::get("/moved"), None, None).await.unwrap();
    assert_eq!(response.status_code, 302);
    assert_eq!(response.header("location"), Some("/elsewhere"));
}

#[tokio::test]
async fn body_and_timeout_are_forwarded() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.route(Method::Post, "/clientapi/editor/event", fake_response(200, ""));

    let options = RequestOptions::post("/clientapi/editor/event").with_header("Content-Type", "application/json");
    let timeout = Some(std::time::Duration::from_secs(2));
    kite.connector.request(&options, Some(br#"{"source":"vim"}"#), timeout).await.unwrap();

    let seen = kite.client.requests().pop().unwrap();
    assert_eq!(seen.options, options);
    assert_eq!(seen.body.as_deref(), Some(&br#"{"source":"vim"}"#[..]));
    assert_eq!(seen.timeout, timeout);
}

#[tokio::test]
async fn transport_failure_is_diagnosed() {
    let cases = [
        (KiteSetup::new().supported(false), HealthState::Unsupported),
        (KiteSetup::new().supported(true), HealthState::Uninstalled),
        (KiteSetup::new().installed(true), HealthState::NotRunning),
        (KiteSetup::new().running(true), HealthState::Unreachable),
    ];

    for (setup, expected) in cases {
        let kite = with_kite(setup);
        let err = kite
            .connector
            .request(&RequestOptions::get("/clientapi/status"), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.state(), Some(expected), "{}", kite.state());
    }
}

#[tokio::test]
async fn transport_failure_while_running_carries_transport_message() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.refuse_all();
    let err = kite.connector.request(&RequestOptions::get("/x"), None, None).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unreachable));
    assert!(err.to_string().contains("connection refused"), "{err}");
}

#[tokio::test]
async fn diagnosis_keeps_process_failures() {
    let kite = with_kite(KiteSetup::new().running(true));
    kite.client.refuse_all();
    kite.adapter.fail_check(AdapterCall::IsRunning(Edition::Community), CheckFailure::ps_error());

    let err = kite.connector.request(&RequestOptions::get("/x"), None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessError);

    kite.adapter.fail_check(
        AdapterCall::IsRunning(Edition::Enterprise),
        CheckFailure::unsupported("no enterprise on linux"),
    );
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let _sub = kite.connector.on_did_fail_request(move |e: &KiteError| s.lock().push(e.kind()));

    let err = kite.connector.request(&RequestOptions::get("/x"), None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessError);
    assert_eq!(err.state(), None);
    assert_eq!(*seen.lock(), vec![ErrorKind::ProcessError]);
}
