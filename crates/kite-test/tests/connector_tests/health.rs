//! Health pipeline: first unmet precondition wins.

use std::time::Duration;

use kite_core::{Edition, ErrorKind, HealthState};
use kite_test::{AdapterCall, CheckFailure, KiteSetup, TEST_USER, with_kite};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn check_health_reports_first_unmet_precondition() {
    let cases = [
        (KiteSetup::new().supported(false), HealthState::Unsupported),
        (KiteSetup::new().supported(true), HealthState::Uninstalled),
        (KiteSetup::new().installed(true), HealthState::NotRunning),
        (KiteSetup::new().running(true), HealthState::Unreachable),
        (KiteSetup::new().running_enterprise(true), HealthState::Unreachable),
        (KiteSetup::new().reachable(true).authenticated(false), HealthState::Unlogged),
        (KiteSetup::new().reachable(true), HealthState::Ready),
    ];

    for (setup, expected) in cases {
        let kite = with_kite(setup);
        let state = kite.connector.check_health().await.unwrap();
        assert_eq!(state, expected, "{}", kite.state());
    }
}

#[tokio::test]
async fn unsupported_host_stops_before_any_other_check() {
    let kite = with_kite(KiteSetup::new().supported(false));
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Unsupported);
    assert_eq!(kite.adapter.calls(), vec![AdapterCall::IsSupported]);
    assert!(kite.client.requests().is_empty());
}

#[tokio::test]
async fn not_running_stops_before_network_probe() {
    let kite = with_kite(KiteSetup::new().installed(true));
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::NotRunning);
    assert_eq!(kite.adapter.call_count(&AdapterCall::IsRunning(Edition::Community)), 1);
    assert!(kite.client.requests().is_empty());
}

#[tokio::test]
async fn uninstalled_stops_before_liveness_checks() {
    let kite = with_kite(KiteSetup::new().supported(true));
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Uninstalled);
    for edition in Edition::ALL {
        assert_eq!(kite.adapter.call_count(&AdapterCall::IsInstalled(edition)), 1);
        assert_eq!(kite.adapter.call_count(&AdapterCall::IsRunning(edition)), 0);
    }
    assert!(kite.client.requests().is_empty());
}

#[tokio::test]
async fn unreachable_stops_before_user_lookup() {
    let kite = with_kite(KiteSetup::new().running(true));
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Unreachable);
    assert_eq!(kite.client.request_count("/settings"), 1);
    assert_eq!(kite.client.request_count("/clientapi/user"), 0);
}

#[tokio::test]
async fn reachability_probe_uses_short_timeout() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    assert_ok!(kite.connector.is_kite_reachable().await);
    let probe = &kite.client.requests()[0];
    assert_eq!(probe.options.path, "/settings");
    assert_eq!(probe.timeout, Some(Duration::from_millis(100)));
}

#[tokio::test]
async fn user_lookup_failure_is_not_a_health_state() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    kite.client.route_get("/clientapi/user", 500, "boom");

    let err = kite.connector.check_health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadStatus);
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.content(), Some("boom"));
}

#[tokio::test]
async fn authenticated_user_body_is_returned() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    assert_eq!(kite.connector.is_user_authenticated().await.unwrap(), TEST_USER);
}

#[tokio::test]
async fn either_edition_satisfies_install_and_run_checks() {
    let kite = with_kite(KiteSetup::new().running_enterprise(true));
    assert_ok!(kite.connector.is_kite_installed().await);
    assert_ok!(kite.connector.is_kite_running().await);
    assert_ok!(kite.connector.is_kite_enterprise_running().await);
    assert_err!(kite.connector.has_both_kite_installed().await);

    let kite = with_kite(KiteSetup::new().installed(true).installed_enterprise(true));
    assert_ok!(kite.connector.has_both_kite_installed().await);
}

#[tokio::test]
async fn failed_edition_checks_report_most_advanced_state() {
    // Community installed but stopped; enterprise absent.
    let kite = with_kite(KiteSetup::new().installed(true));
    assert_ok!(kite.connector.is_kite_installed().await);
    let err = kite.connector.is_kite_running().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::NotRunning));
}

#[tokio::test]
async fn process_failure_in_liveness_check_is_an_error() {
    let kite = with_kite(KiteSetup::new().installed(true));
    kite.adapter.fail_check(AdapterCall::IsRunning(Edition::Community), CheckFailure::ps_error());

    let err = kite.connector.check_health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessError);
    assert!(err.to_string().contains("unable to list processes"), "{err}");
}

#[tokio::test]
async fn process_failure_beats_unsupported_edition() {
    // Linux and Windows hosts report the enterprise edition as unsupported.
    let kite = with_kite(KiteSetup::new().installed(true));
    kite.adapter.fail_check(AdapterCall::IsRunning(Edition::Community), CheckFailure::ps_error());
    kite.adapter.fail_check(
        AdapterCall::IsRunning(Edition::Enterprise),
        CheckFailure::unsupported("no enterprise on linux"),
    );

    let err = kite.connector.check_health().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessError);
    assert_eq!(err.state(), None);

    let err = kite.connector.is_kite_running().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessError);
}

#[tokio::test]
async fn unsupported_edition_does_not_mask_missing_install() {
    let kite = with_kite(KiteSetup::new().supported(true));
    kite.adapter.fail_check(
        AdapterCall::IsInstalled(Edition::Enterprise),
        CheckFailure::unsupported("no enterprise on linux"),
    );
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Uninstalled);
}

#[tokio::test(start_paused = true)]
async fn wait_for_kite_exhausts_attempts() {
    let kite = with_kite(KiteSetup::new().running(true));
    let err = kite.connector.wait_for_kite(5, Duration::ZERO).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unreachable));
    assert_eq!(kite.client.request_count("/settings"), 5);
}

#[tokio::test(start_paused = true)]
async fn wait_for_kite_sleeps_only_between_attempts() {
    let kite = with_kite(KiteSetup::new().running(true));
    let start = tokio::time::Instant::now();
    assert_err!(kite.connector.wait_for_kite(3, Duration::from_secs(1)).await);
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn wait_for_kite_returns_on_first_success() {
    let kite = with_kite(KiteSetup::new().reachable(true));
    let start = tokio::time::Instant::now();
    assert_ok!(kite.connector.wait_for_kite(10, Duration::from_secs(1)).await);
    assert_eq!(kite.client.request_count("/settings"), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
#[allow(deprecated)]
async fn handle_state_matches_check_health() {
    let kite = with_kite(KiteSetup::new().running(true));
    assert_eq!(
        kite.connector.handle_state().await.unwrap(),
        kite.connector.check_health().await.unwrap()
    );
}
