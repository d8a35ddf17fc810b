//! Platform adapter trait and lifecycle options.
//!
//! An adapter knows how to detect, install, download and launch the daemon
//! on one operating system. The connector holds exactly one adapter and
//! never inspects the platform itself.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{KiteError, Result};
use crate::platform::Platform;
use crate::state::{Edition, HealthState};

// =============================================================================
// Install options
// =============================================================================

/// Point in the download/install sequence at which a hook fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStep {
    /// Installation is about to start.
    InstallStart,
    /// The installer finished downloading.
    Download,
    /// The installer image was mounted, or the package was installed.
    Mount,
    /// The application was copied into place.
    Copy,
    /// The installer image was unmounted.
    Unmount,
    /// The downloaded installer was removed.
    Remove,
}

type Hook = Arc<dyn Fn() + Send + Sync>;
type ProgressHook = Arc<dyn Fn(u64, u64, f64) + Send + Sync>;

/// Options forwarded to `download` and `install`.
#[derive(Clone, Default)]
pub struct InstallOptions {
    /// Install right after a successful download.
    pub install: bool,
    hooks: Vec<(InstallStep, Hook)>,
    progress: Option<ProgressHook>,
}

impl InstallOptions {
    /// Creates options with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests installation after download.
    #[must_use]
    pub const fn with_install(mut self, install: bool) -> Self {
        self.install = install;
        self
    }

    /// Registers a hook for `step`.
    #[must_use]
    pub fn with_hook<F>(mut self, step: InstallStep, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hooks.push((step, Arc::new(hook)));
        self
    }

    /// Registers the `InstallStart` hook.
    #[must_use]
    pub fn on_install_start<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::InstallStart, hook)
    }

    /// Registers the `Download` hook.
    #[must_use]
    pub fn on_download<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::Download, hook)
    }

    /// Registers the `Mount` hook.
    #[must_use]
    pub fn on_mount<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::Mount, hook)
    }

    /// Registers the `Copy` hook.
    #[must_use]
    pub fn on_copy<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::Copy, hook)
    }

    /// Registers the `Unmount` hook.
    #[must_use]
    pub fn on_unmount<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::Unmount, hook)
    }

    /// Registers the `Remove` hook.
    #[must_use]
    pub fn on_remove<F: Fn() + Send + Sync + 'static>(self, hook: F) -> Self {
        self.with_hook(InstallStep::Remove, hook)
    }

    /// Registers the download progress hook, called with
    /// `(downloaded, total, ratio)`.
    #[must_use]
    pub fn on_download_progress<F>(mut self, hook: F) -> Self
    where
        F: Fn(u64, u64, f64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(hook));
        self
    }

    /// Fires every hook registered for `step`, in registration order.
    pub fn notify(&self, step: InstallStep) {
        for (_, hook) in self.hooks.iter().filter(|(s, _)| *s == step) {
            hook();
        }
    }

    /// Reports download progress. A `total` of 0 means unknown length.
    pub fn progress(&self, downloaded: u64, total: u64) {
        if let Some(progress) = &self.progress {
            #[allow(clippy::cast_precision_loss)]
            let ratio = if total == 0 {
                0.0
            } else {
                downloaded as f64 / total as f64
            };
            progress(downloaded, total, ratio);
        }
    }

    /// Returns true if a progress hook is registered.
    #[must_use]
    pub const fn tracks_progress(&self) -> bool {
        self.progress.is_some()
    }
}

impl std::fmt::Debug for InstallOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallOptions")
            .field("install", &self.install)
            .field(
                "hooks",
                &self.hooks.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            )
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

// =============================================================================
// Run options
// =============================================================================

/// Default distribution channel passed to the daemon on launch.
pub const DEFAULT_CHANNEL: &str = "autocomplete-python";

/// Options forwarded to `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Distribution channel reported by the daemon.
    pub channel: String,
    /// Launch with the copilot window (Windows only).
    pub copilot: bool,
    /// Extra environment variables for the daemon process.
    pub env: Vec<(String, String)>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            channel: DEFAULT_CHANNEL.to_string(),
            copilot: false,
            env: Vec::new(),
        }
    }
}

impl RunOptions {
    /// Sets the channel.
    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    /// Enables the copilot launch.
    #[must_use]
    pub const fn with_copilot(mut self, copilot: bool) -> Self {
        self.copilot = copilot;
        self
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

// =============================================================================
// KiteAdapter trait
// =============================================================================

/// Platform-specific daemon adapter.
///
/// Check methods report failure as [`KiteError::BadState`] carrying the
/// state that was found; subprocess failures surface as process errors.
#[async_trait]
pub trait KiteAdapter: Send + Sync {
    /// Returns the platform identifier.
    fn platform(&self) -> Platform;

    /// Returns true if the operating system family is supported.
    fn is_os_supported(&self) -> bool;

    /// Returns true if the operating system version is supported.
    async fn is_os_version_supported(&self) -> bool;

    /// Returns true if the daemon can run on this host at all.
    async fn is_supported(&self) -> bool {
        self.is_os_supported() && self.is_os_version_supported().await
    }

    /// Returns true if the current user has administrator rights.
    async fn is_admin(&self) -> bool;

    /// Returns the CPU architecture name.
    fn arch(&self) -> &'static str {
        std::env::consts::ARCH
    }

    /// Returns the URL of the current release installer.
    fn release_url(&self) -> Option<String>;

    /// Returns where downloaded installers are written.
    fn download_path(&self) -> Option<PathBuf>;

    /// Returns every location the edition is installed at.
    async fn install_paths(&self, edition: Edition) -> Vec<PathBuf>;

    /// Returns the preferred install location of the edition.
    async fn install_path(&self, edition: Edition) -> Option<PathBuf> {
        self.install_paths(edition).await.into_iter().next()
    }

    /// Returns true if the edition is installed in more than one place.
    async fn has_many_installations(&self, edition: Edition) -> bool {
        self.install_paths(edition).await.len() > 1
    }

    /// Returns the daemon's session file, if the platform has one.
    fn session_file_path(&self) -> Option<PathBuf>;

    /// Checks that the edition is installed.
    ///
    /// # Errors
    /// Returns a state error with [`HealthState::Uninstalled`] (or
    /// [`HealthState::Unsupported`]) when not installed.
    async fn is_installed(&self, edition: Edition) -> Result<()>;

    /// Checks that the edition's process is running.
    ///
    /// # Errors
    /// Returns a state error with [`HealthState::NotRunning`] when no
    /// process is found.
    async fn is_running(&self, edition: Edition) -> Result<()>;

    /// Checks that both editions are installed.
    ///
    /// # Errors
    /// Returns the first failing install check.
    async fn has_both_installed(&self) -> Result<()> {
        self.is_installed(Edition::Community).await?;
        self.is_installed(Edition::Enterprise).await
    }

    /// Installs the previously downloaded release.
    ///
    /// # Errors
    /// Returns an error if any install step fails.
    async fn install(&self, options: &InstallOptions) -> Result<()>;

    /// Downloads an installer from `url`, then installs it if requested.
    ///
    /// # Errors
    /// Returns an error if the download or the install fails.
    async fn download(&self, url: &str, options: &InstallOptions) -> Result<()>;

    /// Downloads the current release.
    ///
    /// # Errors
    /// Returns [`HealthState::Unsupported`] when there is no release for
    /// this platform, or any download error.
    async fn download_release(&self, options: &InstallOptions) -> Result<()> {
        let url = self.release_url().ok_or_else(|| {
            KiteError::bad_state(HealthState::Unsupported, "no release available for this platform")
        })?;
        self.download(&url, options).await
    }

    /// Launches the edition.
    ///
    /// # Errors
    /// Returns an error if the process cannot be started.
    async fn run(&self, edition: Edition, options: &RunOptions) -> Result<()>;
}
