//! Failure listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kite_core::{HealthState, KiteError, RequestOptions};
use kite_test::{KiteSetup, with_kite};
use parking_lot::Mutex;

#[tokio::test]
async fn every_rejection_reaches_each_listener_once() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.route_get("/forbidden", 403, "");

    let first = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::clone(&first);
    let s = Arc::clone(&seen);
    let _a = kite.connector.on_did_fail_request(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    let _b = kite.connector.on_did_fail_request(move |e: &KiteError| s.lock().push(e.state()));

    let _ = kite.connector.request(&RequestOptions::get("/forbidden"), None, None).await;
    let _ = kite.connector.request(&RequestOptions::get("/missing"), None, None).await;

    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(*seen.lock(), vec![Some(HealthState::NotWhitelisted), None]);
}

#[tokio::test]
async fn successful_requests_are_silent() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let _sub = kite.connector.on_did_fail_request(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    kite.connector.request(&RequestOptions::get("/settings"), None, None).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disposed_listener_is_never_called_again() {
    let kite = with_kite(KiteSetup::new().running(true));
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let sub = kite.connector.on_did_fail_request(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    let _ = kite.connector.request(&RequestOptions::get("/x"), None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    sub.dispose();
    let _ = kite.connector.request(&RequestOptions::get("/x"), None, None).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn listeners_do_not_alter_the_error() {
    let kite = with_kite(KiteSetup::new().installed(true));
    let _sub = kite.connector.on_did_fail_request(|_| {});
    let err = kite.connector.request(&RequestOptions::get("/x"), None, None).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::NotRunning));
}

#[tokio::test]
async fn health_probes_do_not_notify() {
    let kite = with_kite(KiteSetup::new().running(true));
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let _sub = kite.connector.on_did_fail_request(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Unreachable);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
