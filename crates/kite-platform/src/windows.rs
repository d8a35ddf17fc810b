//! Windows adapter.
//!
//! The daemon is `kited.exe` inside the install directory recorded in the
//! registry. Only the community edition ships for Windows.

use async_trait::async_trait;
use kite_core::{
    Edition, HealthState, InstallOptions, InstallStep, KiteAdapter, KiteError, Platform, Result,
    RunOptions,
};
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::detect::parse_version;
use crate::download::download_and_install;
use crate::process::{CommandSpec, run_command, spawn_detached};

/// Release installer URL.
pub const RELEASE_URL: &str = "https://alpha.kite.com/release/dls/windows/current";

/// Registry key holding the install directory.
const INSTALL_KEY: &str = r"HKLM\Software\Kite\AppData";

/// Minimum NT kernel version (Windows 7).
const MIN_NT_VERSION: f64 = 6.1;

/// Windows adapter.
#[derive(Debug)]
pub struct WindowsAdapter {
    release_url: String,
    installer_path: PathBuf,
    session_file: Option<PathBuf>,
    exe_path: OnceCell<PathBuf>,
}

impl Default for WindowsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowsAdapter {
    /// Creates an adapter that resolves `kited.exe` from the registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            release_url: RELEASE_URL.to_string(),
            installer_path: std::env::temp_dir().join("KiteSetup.exe"),
            session_file: std::env::var_os("LOCALAPPDATA")
                .map(|dir| PathBuf::from(dir).join("Kite").join("session.json")),
            exe_path: OnceCell::new(),
        }
    }

    /// Uses a fixed `kited.exe` location instead of the registry.
    #[must_use]
    pub fn with_exe_path(self, path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: OnceCell::new_with(Some(path.into())),
            ..self
        }
    }

    /// Overrides where the installer is downloaded.
    #[must_use]
    pub fn with_installer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.installer_path = path.into();
        self
    }

    /// Returns the `kited.exe` path, querying the registry on first use.
    pub async fn exe_path(&self) -> &PathBuf {
        self.exe_path
            .get_or_init(|| async {
                let dir = match registry_install_dir().await {
                    Some(dir) => dir,
                    None => fallback_install_dir(),
                };
                dir.join("kited.exe")
            })
            .await
    }

    fn unsupported_enterprise() -> KiteError {
        KiteError::bad_state(
            HealthState::Unsupported,
            "Kite Enterprise is currently not supported on windows",
        )
    }
}

async fn registry_install_dir() -> Option<PathBuf> {
    let spec = CommandSpec::new("reg").args(["query", INSTALL_KEY, "/v", "InstallPath"]);
    match run_command(&spec, "reg_error", "Unable to read the Kite install path").await {
        Ok(stdout) => parse_registry_value(&stdout),
        Err(e) => {
            debug!(error = %e, "install path not in registry");
            None
        }
    }
}

fn fallback_install_dir() -> PathBuf {
    std::env::var_os("ProgramW6432").map_or_else(
        || PathBuf::from(r"C:\Program Files\Kite"),
        |dir| PathBuf::from(dir).join("Kite"),
    )
}

/// Extracts the value of a `REG_SZ` line from `reg query` output.
fn parse_registry_value(stdout: &str) -> Option<PathBuf> {
    stdout.lines().find_map(|line| {
        let (_, value) = line.split_once("REG_SZ")?;
        let value = value.trim();
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}

fn task_listed(stdout: &str) -> bool {
    stdout.lines().any(|line| line.contains("kited.exe"))
}

/// Builds the daemon launch arguments.
fn launch_args(options: &RunOptions) -> Vec<String> {
    let launch = if options.copilot {
        "--plugin-launch-with-copilot"
    } else {
        "--plugin-launch"
    };
    vec![launch.to_string(), format!("--channel={}", options.channel)]
}

#[async_trait]
impl KiteAdapter for WindowsAdapter {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn is_os_supported(&self) -> bool {
        true
    }

    async fn is_os_version_supported(&self) -> bool {
        if !cfg!(target_pointer_width = "64") {
            return false;
        }
        let spec = CommandSpec::new("cmd").args(["/C", "ver"]);
        run_command(&spec, "ver_error", "Unable to read the Windows version")
            .await
            .ok()
            .and_then(|stdout| parse_version(&stdout))
            .is_some_and(|version| version >= MIN_NT_VERSION)
    }

    async fn is_admin(&self) -> bool {
        run_command(&CommandSpec::new("net").arg("session"), "net_error", "not an administrator")
            .await
            .is_ok()
    }

    fn release_url(&self) -> Option<String> {
        Some(self.release_url.clone())
    }

    fn download_path(&self) -> Option<PathBuf> {
        Some(self.installer_path.clone())
    }

    async fn install_paths(&self, edition: Edition) -> Vec<PathBuf> {
        match edition {
            Edition::Community => vec![self.exe_path().await.clone()],
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
        let exe = self.exe_path().await;
        if tokio::fs::try_exists(exe).await.unwrap_or(false) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::Uninstalled,
                format!("{} does not exist", exe.display()),
            ))
        }
    }

    async fn is_running(&self, edition: Edition) -> Result<()> {
        if edition == Edition::Enterprise {
            return Err(Self::unsupported_enterprise());
        }
        let stdout = run_command(
            &CommandSpec::new("tasklist"),
            "tasklist_error",
            "Unable to run the tasklist command and verify whether kite is running or not",
        )
        .await?;
        if task_listed(&stdout) {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::NotRunning,
                "Unable to find kited.exe process in the tasks list",
            ))
        }
    }

    async fn install(&self, options: &InstallOptions) -> Result<()> {
        info!(installer = %self.installer_path.display(), "running Kite installer");
        options.notify(InstallStep::InstallStart);

        let installer = CommandSpec::new(self.installer_path.to_string_lossy())
            .args([
                "--skip-onboarding",
                "--plugin-launch-with-copilot",
                "--channel=autocomplete-python",
            ])
            .env("KITE_SKIP_ONBOARDING", "1");
        run_command(&installer, "kite_install_error", "Unable to run Kite installer").await?;
        options.notify(InstallStep::Copy);

        tokio::fs::remove_file(&self.installer_path).await?;
        options.notify(InstallStep::Remove);
        Ok(())
    }

    async fn download(&self, url: &str, options: &InstallOptions) -> Result<()> {
        download_and_install(self, url, options).await
    }

    async fn run(&self, edition: Edition, options: &RunOptions) -> Result<()> {
        if edition == Edition::Enterprise {
            return Err(Self::unsupported_enterprise());
        }
        if self.is_running(edition).await.is_ok() {
            debug!("kited.exe already running");
            return Ok(());
        }

        let exe = self.exe_path().await;
        let mut spec = CommandSpec::new(exe.to_string_lossy())
            .args(launch_args(options))
            .env_remove("ELECTRON_RUN_AS_NODE");
        if !options.copilot {
            spec = spec.env("KITE_SKIP_ONBOARDING", "1");
        }
        for (key, value) in &options.env {
            spec = spec.env(key.as_str(), value.as_str());
        }
        spawn_detached(&spec, "kite_exe_error", "Unable to run kite executable")?;
        Ok(())
    }
}
