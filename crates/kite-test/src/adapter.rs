//! Scripted platform adapter.

use async_trait::async_trait;
use kite_core::{
    Edition, HealthState, InstallOptions, InstallStep, KiteAdapter, KiteError, Platform,
    ProcessFailure, Result, RunOptions,
};
use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;

use crate::setup::{KiteSetup, KiteState};

/// One adapter call, as recorded by [`TestAdapter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterCall {
    /// `is_supported`.
    IsSupported,
    /// `is_installed`.
    IsInstalled(Edition),
    /// `is_running`.
    IsRunning(Edition),
    /// `install`.
    Install,
    /// `download` with the URL.
    Download(String),
    /// `run`.
    Run(Edition),
}

/// Scripted failure of one adapter check, overriding the state's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// The check fails with a state error.
    State(HealthState, String),
    /// The check's subprocess fails.
    Process(ProcessFailure),
}

impl CheckFailure {
    /// A failing `ps` liveness check.
    #[must_use]
    pub fn ps_error() -> Self {
        Self::Process(
            ProcessFailure::new("ps_error", "unable to list processes", "/bin/ps -axo pid,command")
                .with_output("", "ps: permission denied"),
        )
    }

    /// An edition this platform cannot host.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::State(HealthState::Unsupported, message.into())
    }

    fn to_error(&self) -> KiteError {
        match self {
            Self::State(state, message) => KiteError::bad_state(*state, message.clone()),
            Self::Process(failure) => KiteError::Process(failure.clone()),
        }
    }
}

/// Adapter whose answers come from a [`KiteState`].
///
/// `install` and `run` succeed only when the daemon is not already
/// installed or running. A successful `run` marks the edition as running
/// and the daemon as reachable, so later checks observe the launch.
/// Checks scripted with [`TestAdapter::fail_check`] fail regardless of the
/// state.
#[derive(Debug)]
pub struct TestAdapter {
    state: RwLock<KiteState>,
    release_url: Option<String>,
    download_path: Option<PathBuf>,
    install_paths: Vec<PathBuf>,
    enterprise_install_paths: Vec<PathBuf>,
    session_file: Option<PathBuf>,
    calls: Mutex<Vec<AdapterCall>>,
    failures: Mutex<Vec<(AdapterCall, CheckFailure)>>,
}

impl TestAdapter {
    /// Creates an adapter for `setup`.
    #[must_use]
    pub fn new(setup: &KiteSetup) -> Self {
        Self::from_state(setup.resolve())
    }

    /// Creates an adapter for an already resolved state.
    #[must_use]
    pub fn from_state(state: KiteState) -> Self {
        Self {
            state: RwLock::new(state),
            release_url: Some("https://kite.test/dls/current".to_string()),
            download_path: Some(PathBuf::from("/tmp/kite-test-installer")),
            install_paths: vec![PathBuf::from("/opt/kite/kited")],
            enterprise_install_paths: vec![PathBuf::from("/opt/kite-enterprise/kited")],
            session_file: Some(PathBuf::from("/tmp/kite-test-session.json")),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Sets the release URL.
    #[must_use]
    pub fn with_release_url(mut self, url: Option<String>) -> Self {
        self.release_url = url;
        self
    }

    /// Sets the install locations of `edition`.
    #[must_use]
    pub fn with_install_paths(mut self, edition: Edition, paths: Vec<PathBuf>) -> Self {
        match edition {
            Edition::Community => self.install_paths = paths,
            Edition::Enterprise => self.enterprise_install_paths = paths,
        }
        self
    }

    /// Makes `call` fail with `failure` until the failures are cleared.
    #[must_use]
    pub fn with_failure(self, call: AdapterCall, failure: CheckFailure) -> Self {
        self.fail_check(call, failure);
        self
    }

    /// Makes `call` fail with `failure` until the failures are cleared.
    ///
    /// Only `is_installed` and `is_running` consult scripted failures.
    pub fn fail_check(&self, call: AdapterCall, failure: CheckFailure) {
        let mut failures = self.failures.lock();
        failures.retain(|(c, _)| *c != call);
        failures.push((call, failure));
    }

    /// Forgets scripted failures.
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> KiteState {
        *self.state.read()
    }

    /// Replaces the current state.
    pub fn set_state(&self, state: KiteState) {
        *self.state.write() = state;
    }

    /// Applies `f` to the current state.
    pub fn update_state(&self, f: impl FnOnce(&mut KiteState)) {
        f(&mut *self.state.write());
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().clone()
    }

    /// Returns how many times `call` was made.
    #[must_use]
    pub fn call_count(&self, call: &AdapterCall) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: AdapterCall) {
        tracing::trace!(?call, "test adapter call");
        self.calls.lock().push(call);
    }

    fn scripted(&self, call: &AdapterCall) -> Result<()> {
        self.failures
            .lock()
            .iter()
            .find(|(c, _)| c == call)
            .map_or(Ok(()), |(_, failure)| Err(failure.to_error()))
    }

    fn edition_flags(&self, edition: Edition) -> (bool, bool) {
        let state = self.state();
        match edition {
            Edition::Community => (state.installed, state.running),
            Edition::Enterprise => (state.installed_enterprise, state.running_enterprise),
        }
    }
}

#[async_trait]
impl KiteAdapter for TestAdapter {
    fn platform(&self) -> Platform {
        Platform::Linux
    }

    fn is_os_supported(&self) -> bool {
        self.state().supported
    }

    async fn is_os_version_supported(&self) -> bool {
        self.state().supported
    }

    async fn is_supported(&self) -> bool {
        self.record(AdapterCall::IsSupported);
        self.state().supported
    }

    async fn is_admin(&self) -> bool {
        self.state().admin
    }

    fn arch(&self) -> &'static str {
        "x86_64"
    }

    fn release_url(&self) -> Option<String> {
        self.release_url.clone()
    }

    fn download_path(&self) -> Option<PathBuf> {
        self.download_path.clone()
    }

    async fn install_paths(&self, edition: Edition) -> Vec<PathBuf> {
        match edition {
            Edition::Community => self.install_paths.clone(),
            Edition::Enterprise => self.enterprise_install_paths.clone(),
        }
    }

    fn session_file_path(&self) -> Option<PathBuf> {
        self.session_file.clone()
    }

    async fn is_installed(&self, edition: Edition) -> Result<()> {
        self.record(AdapterCall::IsInstalled(edition));
        self.scripted(&AdapterCall::IsInstalled(edition))?;
        if self.edition_flags(edition).0 {
            Ok(())
        } else {
            Err(KiteError::bad_state(HealthState::Uninstalled, format!("kite {edition} is not installed")))
        }
    }

    async fn is_running(&self, edition: Edition) -> Result<()> {
        self.record(AdapterCall::IsRunning(edition));
        self.scripted(&AdapterCall::IsRunning(edition))?;
        if self.edition_flags(edition).1 {
            Ok(())
        } else {
            Err(KiteError::bad_state(HealthState::NotRunning, format!("kite {edition} is not running")))
        }
    }

    async fn install(&self, options: &InstallOptions) -> Result<()> {
        self.record(AdapterCall::Install);
        if self.state().installed {
            return Err(KiteError::bad_state(HealthState::INSTALLED, "kite is already installed"));
        }
        options.notify(InstallStep::InstallStart);
        options.notify(InstallStep::Copy);
        self.update_state(|s| s.installed = true);
        Ok(())
    }

    async fn download(&self, url: &str, options: &InstallOptions) -> Result<()> {
        self.record(AdapterCall::Download(url.to_string()));
        if !self.state().can_download {
            return Err(KiteError::request(format!("unable to download {url}"), Some(404)));
        }
        options.progress(1, 1);
        options.notify(InstallStep::Download);
        if options.install {
            self.install(options).await?;
        }
        Ok(())
    }

    async fn run(&self, edition: Edition, _options: &RunOptions) -> Result<()> {
        self.record(AdapterCall::Run(edition));
        let (installed, running) = self.edition_flags(edition);
        if running {
            return Err(KiteError::bad_state(HealthState::RUNNING, format!("kite {edition} is already running")));
        }
        if !installed {
            return Err(KiteError::bad_state(HealthState::Uninstalled, format!("kite {edition} is not installed")));
        }
        self.update_state(|s| {
            match edition {
                Edition::Community => s.running = true,
                Edition::Enterprise => s.running_enterprise = true,
            }
            s.reachable = true;
        });
        Ok(())
    }
}
