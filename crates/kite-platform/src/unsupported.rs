//! Fallback adapter for hosts Kite does not run on.

use async_trait::async_trait;
use kite_core::{
    Edition, HealthState, InstallOptions, KiteAdapter, KiteError, Platform, Result, RunOptions,
};
use std::path::PathBuf;

/// Adapter that reports every check as unsupported.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedAdapter;

impl UnsupportedAdapter {
    fn unsupported() -> KiteError {
        KiteError::bad_state(
            HealthState::Unsupported,
            format!("Kite is not supported on {}", std::env::consts::OS),
        )
    }
}

#[async_trait]
impl KiteAdapter for UnsupportedAdapter {
    fn platform(&self) -> Platform {
        Platform::Unsupported
    }

    fn is_os_supported(&self) -> bool {
        false
    }

    async fn is_os_version_supported(&self) -> bool {
        false
    }

    async fn is_admin(&self) -> bool {
        false
    }

    fn release_url(&self) -> Option<String> {
        None
    }

    fn download_path(&self) -> Option<PathBuf> {
        None
    }

    async fn install_paths(&self, _edition: Edition) -> Vec<PathBuf> {
        Vec::new()
    }

    fn session_file_path(&self) -> Option<PathBuf> {
        None
    }

    async fn is_installed(&self, _edition: Edition) -> Result<()> {
        Err(Self::unsupported())
    }

    async fn is_running(&self, _edition: Edition) -> Result<()> {
        Err(Self::unsupported())
    }

    async fn install(&self, _options: &InstallOptions) -> Result<()> {
        Err(Self::unsupported())
    }

    async fn download(&self, _url: &str, _options: &InstallOptions) -> Result<()> {
        Err(Self::unsupported())
    }

    async fn run(&self, _edition: Edition, _options: &RunOptions) -> Result<()> {
        Err(Self::unsupported())
    }
}
