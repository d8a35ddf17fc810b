//! Install, download and launch.

use std::sync::Arc;
use std::time::Duration;

use kite_core::{Edition, HealthState, InstallOptions, InstallStep, RunOptions};
use kite_test::{AdapterCall, KiteSetup, with_kite};
use parking_lot::Mutex;
use tokio_test::assert_ok;

#[tokio::test]
async fn can_install_only_when_supported_and_absent() {
    let kite = with_kite(KiteSetup::new().supported(true));
    assert_ok!(kite.connector.can_install_kite().await);

    let kite = with_kite(KiteSetup::new().installed(true));
    let err = kite.connector.can_install_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::INSTALLED));

    let kite = with_kite(KiteSetup::new().supported(false));
    let err = kite.connector.can_install_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unsupported));

    // Left behind after the host stopped being supported.
    let kite = with_kite(KiteSetup::new().supported(false));
    kite.adapter.update_state(|s| s.installed = true);
    let err = kite.connector.can_install_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unsupported));
}

#[tokio::test]
async fn can_run_only_when_installed_and_stopped() {
    let kite = with_kite(KiteSetup::new().installed(true));
    assert_ok!(kite.connector.can_run_kite().await);

    let kite = with_kite(KiteSetup::new().running(true));
    let err = kite.connector.can_run_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::RUNNING));

    let kite = with_kite(KiteSetup::new().supported(true));
    let err = kite.connector.can_run_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Uninstalled));
}

#[tokio::test]
async fn can_run_enterprise_checks_enterprise_only() {
    let kite = with_kite(KiteSetup::new().running(true).installed_enterprise(true));
    assert_ok!(kite.connector.can_run_kite_enterprise().await);
    assert!(kite.connector.can_run_kite().await.is_err());
}

#[tokio::test]
async fn run_kite_and_wait_reaches_ready() {
    let kite = with_kite(KiteSetup::new().installed(true));
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::NotRunning);

    kite.connector
        .run_kite_and_wait(&RunOptions::default(), 3, Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(kite.adapter.call_count(&AdapterCall::Run(Edition::Community)), 1);
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Ready);
}

#[tokio::test]
async fn run_enterprise_targets_enterprise_edition() {
    let kite = with_kite(KiteSetup::new().installed_enterprise(true));
    kite.connector
        .run_kite_enterprise_and_wait(&RunOptions::default(), 1, Duration::ZERO)
        .await
        .unwrap();
    assert!(kite.state().running_enterprise);
    assert!(!kite.state().running);
}

#[tokio::test]
async fn run_failure_skips_waiting() {
    let kite = with_kite(KiteSetup::new().supported(true));
    let err = kite
        .connector
        .run_kite_and_wait(&RunOptions::default(), 5, Duration::ZERO)
        .await
        .unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Uninstalled));
    assert!(kite.client.requests().is_empty());
}

#[tokio::test]
async fn download_release_forwards_options_and_installs() {
    let kite = with_kite(KiteSetup::new().supported(true).can_download(true));
    let steps = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (Arc::clone(&steps), Arc::clone(&steps), Arc::clone(&steps));
    let options = InstallOptions::new()
        .with_install(true)
        .on_download(move || a.lock().push(InstallStep::Download))
        .on_install_start(move || b.lock().push(InstallStep::InstallStart))
        .on_copy(move || c.lock().push(InstallStep::Copy));

    kite.connector.download_kite_release(&options).await.unwrap();

    assert_eq!(
        *steps.lock(),
        vec![InstallStep::Download, InstallStep::InstallStart, InstallStep::Copy]
    );
    assert_eq!(
        kite.adapter.calls(),
        vec![
            AdapterCall::Download("https://kite.test/dls/current".to_string()),
            AdapterCall::Install,
        ]
    );
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::NotRunning);
}

#[tokio::test]
async fn download_without_install_leaves_kite_absent() {
    let kite = with_kite(KiteSetup::new().supported(true).can_download(true));
    kite.connector
        .download_kite("https://kite.test/custom", &InstallOptions::new())
        .await
        .unwrap();
    assert_eq!(kite.adapter.call_count(&AdapterCall::Install), 0);
    assert_eq!(kite.connector.check_health().await.unwrap(), HealthState::Uninstalled);
}

#[tokio::test]
async fn install_kite_delegates_to_adapter() {
    let kite = with_kite(KiteSetup::new().supported(true));
    kite.connector.install_kite(&InstallOptions::new()).await.unwrap();
    assert!(kite.state().installed);
}
