//! Linux adapter.
//!
//! Kite is distributed as a `.deb` that installs `/usr/bin/kited` and a
//! versioned tree under `/opt/kite`. Linux support is opt-in: the host is
//! only considered supported once `~/.kite/KITE_LINUX` exists.

use async_trait::async_trait;
use kite_core::{
    Edition, HealthState, InstallOptions, InstallStep, KiteAdapter, KiteError, Platform, Result,
    RunOptions, retry,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::detect::{kite_home_file, parse_version, user_in_groups};
use crate::download::download_and_install;
use crate::process::{CommandSpec, run_command, spawn_detached};

/// Release package URL.
pub const RELEASE_URL: &str = "https://linux.kite.com/dls/linux/current";

/// Minimum Ubuntu release.
const MIN_RELEASE: f64 = 18.04;

/// Groups whose members may install system packages.
const ADMIN_GROUPS: &[&str] = &["root", "adm", "admin", "sudo"];

/// Linux adapter.
#[derive(Debug, Clone)]
pub struct LinuxAdapter {
    release_url: String,
    deb_path: PathBuf,
    kited_path: PathBuf,
    current_link: PathBuf,
    flag_path: Option<PathBuf>,
    session_file: Option<PathBuf>,
    install_attempts: u32,
    install_interval: Duration,
}

impl Default for LinuxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl LinuxAdapter {
    /// Creates an adapter with the stock package layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            release_url: RELEASE_URL.to_string(),
            deb_path: PathBuf::from("/tmp/kite-installer.deb"),
            kited_path: PathBuf::from("/usr/bin/kited"),
            current_link: PathBuf::from("/opt/kite/kite-current"),
            flag_path: kite_home_file("KITE_LINUX"),
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

    /// Overrides where the package is downloaded.
    #[must_use]
    pub fn with_deb_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.deb_path = path.into();
        self
    }

    /// Overrides the daemon binary location.
    #[must_use]
    pub fn with_kited_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kited_path = path.into();
        self
    }

    /// Overrides the `kite-current` symlink checked after install.
    #[must_use]
    pub fn with_current_link(mut self, path: impl Into<PathBuf>) -> Self {
        self.current_link = path.into();
        self
    }

    /// Overrides the opt-in flag file.
    #[must_use]
    pub fn with_flag_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.flag_path = Some(path.into());
        self
    }

    /// Overrides how often the install is re-checked after the package
    /// manager returns.
    #[must_use]
    pub const fn with_install_check(mut self, attempts: u32, interval: Duration) -> Self {
        self.install_attempts = attempts;
        self.install_interval = interval;
        self
    }

    fn unsupported_enterprise() -> KiteError {
        KiteError::bad_state(
            HealthState::Unsupported,
            "Kite Enterprise is currently not supported on Linux",
        )
    }

    /// Checks that the package finished unpacking a versioned tree.
    async fn is_initially_installed(&self) -> Result<()> {
        let target = tokio::fs::read_link(&self.current_link).await.map_err(|e| {
            debug!(link = %self.current_link.display(), error = %e, "kite-current not readable");
            KiteError::bad_state(HealthState::Uninstalled, "Kite is not installed yet")
        })?;
        if is_versioned_tree(&target) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::Uninstalled,
                format!("{} is not a Kite release", target.display()),
            ))
        }
    }
}

fn is_versioned_tree(target: &std::path::Path) -> bool {
    target
        .file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with("kite-v"))
}

fn kited_listed(stdout: &str) -> bool {
    stdout.lines().any(|line| line.contains("kited"))
}

#[async_trait]
impl KiteAdapter for LinuxAdapter {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn is_os_supported(&self) -> bool {
        self.flag_path.as_ref().is_some_and(|flag| flag.exists())
    }

    async fn is_os_version_supported(&self) -> bool {
        if self.arch() != "x86_64" {
            return false;
        }
        run_command(
            &CommandSpec::new("lsb_release").arg("-r"),
            "lsb_release_error",
            "Unable to read the distribution release",
        )
        .await
        .ok()
        .and_then(|stdout| parse_version(&stdout))
        .is_some_and(|release| release >= MIN_RELEASE)
    }

    async fn is_admin(&self) -> bool {
        user_in_groups(ADMIN_GROUPS)
    }

    fn release_url(&self) -> Option<String> {
        Some(self.release_url.clone())
    }

    fn download_path(&self) -> Option<PathBuf> {
        Some(self.deb_path.clone())
    }

    async fn install_paths(&self, edition: Edition) -> Vec<PathBuf> {
        match edition {
            Edition::Community => vec![self.kited_path.clone()],
            Edition::Enterprise => Vec::new(),
        }
    }

    fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file.clone()
    }

    async fn is_installed(&self, edition: Edition) -> Result<()> {
        if edition == Edition::Enterprise {
            return Err(Self::unsupported_enterprise());
        }
        if tokio::fs::try_exists(&self.kited_path).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::Uninstalled,
                format!("{} does not exist", self.kited_path.display()),
            ))
        }
    }

    async fn is_running(&self, edition: Edition) -> Result<()> {
        if edition == Edition::Enterprise {
            return Err(Self::unsupported_enterprise());
        }
        let stdout = run_command(
            &CommandSpec::new("/bin/ps").arg("-axo").arg("pid,command"),
            "ps_error",
            "Unable to run the ps command and verify that Kite is running",
        )
        .await?;
        if kited_listed(&stdout) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::NotRunning,
                "Kite process could not be found in the processes list",
            ))
        }
    }

    async fn install(&self, options: &InstallOptions) -> Result<()> {
        info!(package = %self.deb_path.display(), "installing Kite package");
        options.notify(InstallStep::InstallStart);

        let apt = CommandSpec::new("apt")
            .args(["install", "-f"])
            .arg(self.deb_path.to_string_lossy());
        run_command(&apt, "apt_install_error", "Unable to install Kite package").await?;
        options.notify(InstallStep::Mount);

        tokio::fs::remove_file(&self.deb_path).await?;
        options.notify(InstallStep::Remove);

        retry(
            || self.is_initially_installed(),
            self.install_attempts,
            self.install_interval,
        )
        .await
    }

    async fn download(&self, url: &str, options: &InstallOptions) -> Result<()> {
        download_and_install(self, url, options).await
    }

    async fn run(&self, edition: Edition, options: &RunOptions) -> Result<()> {
        if edition == Edition::Enterprise {
            return Err(Self::unsupported_enterprise());
        }
        if self.is_running(edition).await.is_ok() {
            debug!("kited already running");
            return Ok(());
        }

        let mut spec = CommandSpec::new(self.kited_path.to_string_lossy())
            .arg("--plugin-launch")
            .arg(format!("--channel={}", options.channel))
            .env_remove("ELECTRON_RUN_AS_NODE")
            .env("SKIP_KITE_ONBOARDING", "1");
        for (key, value) in &options.env {
            spec = spec.env(key.as_str(), value.as_str());
        }
        spawn_detached(&spec, "kited_error", "Unable to run kited")?;
        Ok(())
    }
}
