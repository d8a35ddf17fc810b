//! macOS adapter.
//!
//! # Overview
//!
//! Kite ships as `Kite.app` inside a disk image. This adapter:
//!
//! - finds installs through Spotlight (`mdfind`) by bundle identifier, with
//!   `/Applications/Kite.app` as a fallback for unindexed volumes
//! - detects the daemon in `ps -axco command` by its exact process name
//! - installs by mounting the image, copying the app and cleaning up, then
//!   waits for Spotlight to index the new app
//! - launches through `open -a`
//!
//! Both editions are supported; the enterprise edition has its own bundle
//! identifier and process name.

use async_trait::async_trait;
use kite_core::{
    Edition, HealthState, InstallOptions, InstallStep, KiteAdapter, KiteError, Platform, Result,
    RunOptions, retry,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::detect::{kite_home_file, os_release, parse_version, user_in_groups};
use crate::download::download_and_install;
use crate::process::{CommandSpec, run_command};

/// Release installer URL.
pub const RELEASE_URL: &str = "https://alpha.kite.com/release/dls/mac/current";

/// Minimum Darwin kernel major version (OS X 10.10).
const MIN_DARWIN_VERSION: f64 = 14.0;

/// macOS adapter.
#[derive(Debug, Clone)]
pub struct MacOsAdapter {
    release_url: String,
    apps_dir: PathBuf,
    dmg_path: PathBuf,
    volume_path: PathBuf,
    default_app_path: PathBuf,
    session_file: Option<PathBuf>,
    install_attempts: u32,
    install_interval: Duration,
}

impl Default for MacOsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MacOsAdapter {
    /// Creates an adapter with the stock install layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            release_url: RELEASE_URL.to_string(),
            apps_dir: PathBuf::from("/Applications/"),
            dmg_path: PathBuf::from("/tmp/Kite.dmg"),
            volume_path: PathBuf::from("/Volumes/Kite/"),
            default_app_path: PathBuf::from("/Applications/Kite.app"),
            session_file: kite_home_file("session.json"),
            install_attempts: 10,
            install_interval: Duration::from_millis(1500),
        }
    }

    /// Overrides the release URL.
    #[must_use]
    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    /// Overrides where the disk image is downloaded.
    #[must_use]
    pub fn with_dmg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dmg_path = path.into();
        self
    }

    /// Overrides the fallback application path checked when Spotlight has
    /// no result.
    #[must_use]
    pub fn with_default_app_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_app_path = path.into();
        self
    }

    /// Overrides how often the install is re-checked after copying.
    #[must_use]
    pub const fn with_install_check(mut self, attempts: u32, interval: Duration) -> Self {
        self.install_attempts = attempts;
        self.install_interval = interval;
        self
    }

    /// Returns the bundle identifier of the edition.
    #[must_use]
    pub const fn bundle_id(edition: Edition) -> &'static str {
        match edition {
            Edition::Community => "com.kite.Kite",
            Edition::Enterprise => "enterprise.kite.Kite",
        }
    }

    /// Returns the process name of the edition.
    #[must_use]
    pub const fn process_name(edition: Edition) -> &'static str {
        match edition {
            Edition::Community => "Kite",
            Edition::Enterprise => "KiteEnterprise",
        }
    }

    fn mounted_app_path(&self) -> PathBuf {
        self.volume_path.join("Kite.app")
    }

    fn mdfind(edition: Edition) -> CommandSpec {
        CommandSpec::new("mdfind").arg(format!(
            "kMDItemCFBundleIdentifier = \"{}\"",
            Self::bundle_id(edition)
        ))
    }

    async fn spotlight_paths(edition: Edition) -> Result<Vec<PathBuf>> {
        let stdout = run_command(
            &Self::mdfind(edition),
            "mdfind_error",
            "Unable to run mdfind and verify that Kite is installed",
        )
        .await?;
        Ok(parse_path_list(&stdout))
    }

    fn has_default_app(&self) -> bool {
        self.default_app_path.exists()
    }
}

/// Splits command output into one path per non-empty line.
fn parse_path_list(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Returns true if `name` is one of the process names listed in `stdout`.
fn process_listed(stdout: &str, name: &str) -> bool {
    stdout.lines().any(|line| line.trim() == name)
}

fn with_fallback(mut paths: Vec<PathBuf>, fallback: &Path, fallback_exists: bool) -> Vec<PathBuf> {
    if fallback_exists && !paths.iter().any(|p| p == fallback) {
        paths.push(fallback.to_path_buf());
    }
    paths
}

#[async_trait]
impl KiteAdapter for MacOsAdapter {
    fn platform(&self) -> Platform {
        Platform::MacOS
    }

    fn is_os_supported(&self) -> bool {
        true
    }

    async fn is_os_version_supported(&self) -> bool {
        os_release()
            .and_then(|release| parse_version(&release))
            .is_some_and(|version| version >= MIN_DARWIN_VERSION)
    }

    async fn is_admin(&self) -> bool {
        user_in_groups(&["admin"])
    }

    fn release_url(&self) -> Option<String> {
        Some(self.release_url.clone())
    }

    fn download_path(&self) -> Option<PathBuf> {
        Some(self.dmg_path.clone())
    }

    async fn install_paths(&self, edition: Edition) -> Vec<PathBuf> {
        let found = Self::spotlight_paths(edition).await.unwrap_or_default();
        match edition {
            Edition::Community => with_fallback(found, &self.default_app_path, self.has_default_app()),
            Edition::Enterprise => found,
        }
    }

    fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file.clone()
    }

    async fn is_installed(&self, edition: Edition) -> Result<()> {
        let found = Self::spotlight_paths(edition).await?;
        let installed = match edition {
            Edition::Community => !found.is_empty() || self.has_default_app(),
            Edition::Enterprise => !found.is_empty(),
        };
        if installed {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::Uninstalled,
                format!("Unable to find Kite {edition} application install using mdfind"),
            ))
        }
    }

    async fn is_running(&self, edition: Edition) -> Result<()> {
        let stdout = run_command(
            &CommandSpec::new("/bin/ps").args(["-axco", "command"]),
            "ps_error",
            "Unable to run the ps command and verify that Kite is running",
        )
        .await?;
        if process_listed(&stdout, Self::process_name(edition)) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::NotRunning,
                format!("Kite {edition} process could not be found in the processes list"),
            ))
        }
    }

    async fn install(&self, options: &InstallOptions) -> Result<()> {
        info!(dmg = %self.dmg_path.display(), "installing Kite.app");
        options.notify(InstallStep::InstallStart);

        let dmg = self.dmg_path.to_string_lossy().into_owned();
        run_command(
            &CommandSpec::new("hdiutil").args(["attach", "-nobrowse", dmg.as_str()]),
            "mount_error",
            "Unable to mount Kite.dmg",
        )
        .await?;
        options.notify(InstallStep::Mount);

        run_command(
            &CommandSpec::new("cp").args([
                "-r".to_string(),
                self.mounted_app_path().to_string_lossy().into_owned(),
                self.apps_dir.to_string_lossy().into_owned(),
            ]),
            "cp_error",
            "Unable to copy Kite.app in the applications directory",
        )
        .await?;
        options.notify(InstallStep::Copy);

        run_command(
            &CommandSpec::new("hdiutil").args(["detach".to_string(), self.volume_path.to_string_lossy().into_owned()]),
            "unmount_error",
            "Unable to unmount Kite.dmg",
        )
        .await?;
        options.notify(InstallStep::Unmount);

        run_command(
            &CommandSpec::new("rm").arg(dmg),
            "rm_error",
            "Unable to remove Kite.dmg",
        )
        .await?;
        options.notify(InstallStep::Remove);

        // Spotlight needs time to index the copied app.
        retry(
            || self.is_installed(Edition::Community),
            self.install_attempts,
            self.install_interval,
        )
        .await
    }

    async fn download(&self, url: &str, options: &InstallOptions) -> Result<()> {
        download_and_install(self, url, options).await
    }

    async fn run(&self, edition: Edition, options: &RunOptions) -> Result<()> {
        if self.is_running(edition).await.is_ok() {
            debug!(%edition, "kite already running");
            return Ok(());
        }

        run_command(
            &CommandSpec::new("defaults").args(["write", Self::bundle_id(edition), "shouldReopenSidebar", "0"]),
            "defaults_error",
            "Unable to run defaults command",
        )
        .await?;

        let app = self.install_path(edition).await.ok_or_else(|| {
            KiteError::bad_state(HealthState::Uninstalled, format!("no Kite {edition} install to open"))
        })?;

        let mut open = CommandSpec::new("open")
            .arg("-a")
            .arg(app.to_string_lossy())
            .env_remove("ELECTRON_RUN_AS_NODE");
        if edition == Edition::Community {
            open = open.args(["--args", "--plugin-launch"]);
        }
        for (key, value) in &options.env {
            open = open.env(key.as_str(), value.as_str());
        }

        info!(%edition, app = %app.display(), "opening kite");
        run_command(&open, "open_error", "Unable to run the open command to start Kite").await?;
        Ok(())
    }
}
