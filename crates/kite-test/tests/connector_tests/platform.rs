//! Real platform adapters behind the connector.

use std::sync::Arc;
use std::time::Duration;

use kite_core::{
    ConnectorConfig, Edition, HealthState, InstallOptions, KiteAdapter, KiteConnector, Platform,
    RunOptions,
};
use kite_platform::{LinuxAdapter, UnsupportedAdapter, detect_platform, select_adapter};
use kite_test::TestClient;

#[tokio::test]
async fn unsupported_platform_reports_unsupported_everywhere() {
    let kite = KiteConnector::new(select_adapter(Platform::Unsupported), Arc::new(TestClient::new()));
    assert_eq!(kite.check_health().await.unwrap(), HealthState::Unsupported);

    let err = kite.can_install_kite().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unsupported));
    let err = kite.download_kite_release(&InstallOptions::new()).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unsupported));
    let err = kite.run_kite(&RunOptions::default()).await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Unsupported));
}

#[tokio::test]
async fn adapter_can_be_swapped_at_runtime() {
    let kite = KiteConnector::new(Arc::new(UnsupportedAdapter), Arc::new(TestClient::new()));
    assert_eq!(kite.adapter().platform(), Platform::Unsupported);

    kite.set_adapter(select_adapter(detect_platform()));
    assert_eq!(kite.adapter().platform(), detect_platform());
}

#[tokio::test]
async fn linux_adapter_without_opt_in_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = LinuxAdapter::new()
        .with_flag_path(dir.path().join("KITE_LINUX"))
        .with_kited_path(dir.path().join("kited"));
    let kite = KiteConnector::new(Arc::new(adapter), Arc::new(TestClient::new()));
    assert_eq!(kite.check_health().await.unwrap(), HealthState::Unsupported);
}

#[tokio::test]
async fn linux_adapter_install_checks_follow_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = LinuxAdapter::new()
        .with_flag_path(dir.path().join("KITE_LINUX"))
        .with_kited_path(dir.path().join("kited"))
        .with_install_check(1, Duration::ZERO);
    let kite = KiteConnector::new(Arc::new(adapter), Arc::new(TestClient::new()));

    let err = kite.is_kite_installed().await.unwrap_err();
    assert_eq!(err.state(), Some(HealthState::Uninstalled));

    std::fs::write(dir.path().join("kited"), b"").unwrap();
    tokio_test::assert_ok!(kite.is_kite_installed().await);
    assert_eq!(
        kite.adapter().install_path(Edition::Community).await,
        Some(dir.path().join("kited"))
    );
}

#[tokio::test]
async fn current_platform_connector_builds_from_config() {
    let kite = kite_platform::connector_for_current_platform(ConnectorConfig::default()).unwrap();
    assert_eq!(kite.adapter().platform(), detect_platform());
    assert_eq!(kite.config().port, kite_core::DEFAULT_PORT);
}
