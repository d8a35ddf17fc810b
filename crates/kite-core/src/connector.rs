//! The connector: health reconciliation and guarded requests.
//!
//! [`KiteConnector`] owns one adapter and one transport, both swappable at
//! runtime. `check_health` walks a fixed pipeline of preconditions and
//! stops at the first one that fails:
//!
//! ```text
//! supported -> installed -> running -> reachable -> authenticated
//! ```
//!
//! Each stage fails with a state error naming how far the daemon got.
//! Only `check_health` turns state errors into a value; everything else
//! propagates them.

use parking_lot::RwLock;
use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::adapter::{InstallOptions, KiteAdapter, RunOptions};
use crate::client::{HttpClient, KiteClient, RequestOptions, Response, TracingClient, TransportError};
use crate::combinators::{any_ok, negate, retry};
use crate::config::{ConfigError, ConnectorConfig};
use crate::error::{KiteError, Result};
use crate::events::{FailureListeners, Subscription};
use crate::state::{Edition, HealthState};

/// Reconciles the daemon's health and mediates requests to it.
pub struct KiteConnector {
    adapter: RwLock<Arc<dyn KiteAdapter>>,
    client: RwLock<Arc<dyn KiteClient>>,
    listeners: FailureListeners,
    config: ConnectorConfig,
    request_debug: AtomicBool,
}

impl KiteConnector {
    /// Creates a connector with default settings.
    #[must_use]
    pub fn new(adapter: Arc<dyn KiteAdapter>, client: Arc<dyn KiteClient>) -> Self {
        Self {
            adapter: RwLock::new(adapter),
            client: RwLock::new(client),
            listeners: FailureListeners::new(),
            config: ConnectorConfig::default(),
            request_debug: AtomicBool::new(false),
        }
    }

    /// Creates a connector with an HTTP transport built from `config`.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the transport
    /// cannot be built.
    pub fn from_config(adapter: Arc<dyn KiteAdapter>, config: ConnectorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let client = build_client(&config, config.request_debug)?;
        Ok(Self::new(adapter, client).with_config(config))
    }

    /// Replaces the settings used for probe paths and timeouts.
    ///
    /// The current transport is kept.
    #[must_use]
    pub fn with_config(mut self, config: ConnectorConfig) -> Self {
        self.request_debug = AtomicBool::new(config.request_debug);
        self.config = config;
        self
    }

    /// Returns the connector settings.
    #[must_use]
    pub const fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Returns the current adapter.
    #[must_use]
    pub fn adapter(&self) -> Arc<dyn KiteAdapter> {
        Arc::clone(&self.adapter.read())
    }

    /// Swaps the adapter.
    pub fn set_adapter(&self, adapter: Arc<dyn KiteAdapter>) {
        *self.adapter.write() = adapter;
    }

    /// Returns the current transport.
    #[must_use]
    pub fn client(&self) -> Arc<dyn KiteClient> {
        Arc::clone(&self.client.read())
    }

    /// Swaps the transport.
    pub fn set_client(&self, client: Arc<dyn KiteClient>) {
        *self.client.write() = client;
    }

    /// Returns true if request debug logging is on.
    #[must_use]
    pub fn is_request_debug(&self) -> bool {
        self.request_debug.load(Ordering::SeqCst)
    }

    /// Flips request debug logging and rebuilds the HTTP transport.
    ///
    /// Returns the new debug flag. Any custom transport set with
    /// [`set_client`](Self::set_client) is replaced.
    ///
    /// # Errors
    /// Returns an error if the transport cannot be built.
    pub fn toggle_request_debug(&self) -> std::result::Result<bool, ConfigError> {
        let enabled = !self.request_debug.load(Ordering::SeqCst);
        let client = build_client(&self.config, enabled)?;
        self.set_client(client);
        self.request_debug.store(enabled, Ordering::SeqCst);
        info!(enabled, "request debug toggled");
        Ok(enabled)
    }

    /// Registers a listener called with every error returned by
    /// [`request`](Self::request).
    pub fn on_did_fail_request<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&KiteError) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    // =========================================================================
    // Health pipeline
    // =========================================================================

    /// Returns the first unmet precondition, or [`HealthState::Ready`].
    ///
    /// # Errors
    /// Returns status and process errors, which are not health states.
    pub async fn check_health(&self) -> Result<HealthState> {
        match self.health_pipeline().await {
            Ok(()) => {
                debug!(state = %HealthState::AUTHENTICATED, "kite health checked");
                Ok(HealthState::AUTHENTICATED)
            }
            Err(KiteError::BadState { state, message }) => {
                debug!(state = %state, reason = %message, "kite health checked");
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "kite health check failed");
                Err(e)
            }
        }
    }

    /// Alias of [`check_health`](Self::check_health).
    ///
    /// # Errors
    /// See [`check_health`](Self::check_health).
    #[deprecated(note = "use check_health")]
    pub async fn handle_state(&self) -> Result<HealthState> {
        self.check_health().await
    }

    async fn health_pipeline(&self) -> Result<()> {
        self.is_kite_supported().await?;
        self.is_kite_installed().await?;
        self.is_kite_running().await?;
        self.is_kite_reachable().await?;
        self.is_user_authenticated().await?;
        Ok(())
    }

    /// Checks that the platform can host the daemon.
    ///
    /// # Errors
    /// Fails with [`HealthState::Unsupported`].
    pub async fn is_kite_supported(&self) -> Result<()> {
        if self.adapter().is_supported().await {
            Ok(())
        } else {
            Err(KiteError::bad_state(
                HealthState::Unsupported,
                "kite is not supported on this platform",
            ))
        }
    }

    /// Checks that either edition is installed.
    ///
    /// # Errors
    /// Fails with the first non-state error, otherwise with the most advanced
    /// state reported by the two editions.
    pub async fn is_kite_installed(&self) -> Result<()> {
        let adapter = self.adapter();
        any_ok(Edition::ALL.map(|edition| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.is_installed(edition).await }
        }))
        .await
        .map_err(|errors| most_advanced(errors, HealthState::Uninstalled))
    }

    /// Checks that either edition is running.
    ///
    /// # Errors
    /// Fails with the first non-state error, otherwise with the most advanced
    /// state reported by the two editions.
    pub async fn is_kite_running(&self) -> Result<()> {
        let adapter = self.adapter();
        any_ok(Edition::ALL.map(|edition| {
            let adapter = Arc::clone(&adapter);
            async move { adapter.is_running(edition).await }
        }))
        .await
        .map_err(|errors| most_advanced(errors, HealthState::NotRunning))
    }

    /// Checks that the enterprise edition is installed.
    ///
    /// # Errors
    /// Fails with the adapter's state error.
    pub async fn is_kite_enterprise_installed(&self) -> Result<()> {
        self.adapter().is_installed(Edition::Enterprise).await
    }

    /// Checks that the enterprise edition is running.
    ///
    /// # Errors
    /// Fails with the adapter's state error.
    pub async fn is_kite_enterprise_running(&self) -> Result<()> {
        self.adapter().is_running(Edition::Enterprise).await
    }

    /// Checks that both editions are installed.
    ///
    /// # Errors
    /// Fails with the first missing edition's state error.
    pub async fn has_both_kite_installed(&self) -> Result<()> {
        self.adapter().has_both_installed().await
    }

    /// Probes the health path with the short reachability timeout.
    ///
    /// # Errors
    /// Fails with [`HealthState::Unreachable`] on a transport error or a
    /// non-2xx answer.
    pub async fn is_kite_reachable(&self) -> Result<()> {
        let options = RequestOptions::get(self.config.health_path.clone());
        let timeout = Some(self.config.reachability_timeout);
        match self.client().request(&options, None, timeout).await {
            Ok(response) if response.is_success() => Ok(()),
            Ok(response) => Err(KiteError::bad_state(
                HealthState::Unreachable,
                format!("health probe answered {}", response.status_code),
            )),
            Err(e) => Err(KiteError::bad_state(
                HealthState::Unreachable,
                format!("health probe failed: {e}"),
            )),
        }
    }

    /// Fetches the logged-in user and returns the response body.
    ///
    /// # Errors
    /// Fails with [`HealthState::Unreachable`] on a transport error,
    /// [`HealthState::Unlogged`] on 401, and a status error otherwise.
    pub async fn is_user_authenticated(&self) -> Result<String> {
        let options = RequestOptions::get(self.config.user_path.clone());
        let response = self.client().request(&options, None, None).await.map_err(|e| {
            KiteError::bad_state(HealthState::Unreachable, format!("user lookup failed: {e}"))
        })?;
        match response.status_code {
            200 => Ok(response.text()),
            401 => Err(KiteError::bad_state(HealthState::Unlogged, "no user is logged in")),
            _ => Err(KiteError::from_response(response)),
        }
    }

    /// Retries the reachability probe, sleeping `interval` between attempts.
    ///
    /// # Errors
    /// Fails with the last probe error.
    pub async fn wait_for_kite(&self, attempts: u32, interval: Duration) -> Result<()> {
        debug!(attempts, ?interval, "waiting for kite");
        retry(|| self.is_kite_reachable(), attempts, interval).await
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Sends a request to the daemon.
    ///
    /// A transport failure is diagnosed by re-running the support, install
    /// and running checks. Error statuses map to states: 401 is
    /// [`HealthState::Unlogged`], 403 is [`HealthState::NotWhitelisted`],
    /// any other status from 400 up is a status error carrying the body.
    /// Every error is reported to the failure listeners before it is
    /// returned.
    ///
    /// # Errors
    /// Returns the diagnosed state error or a status error.
    pub async fn request(
        &self,
        options: &RequestOptions,
        body: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let result = self.send(options, body, timeout).await;
        if let Err(e) = &result {
            debug!(method = %options.method, path = %options.path, error = %e, "request failed");
            self.listeners.emit(e);
        }
        result
    }

    async fn send(
        &self,
        options: &RequestOptions,
        body: Option<&[u8]>,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let response = match self.client().request(options, body, timeout).await {
            Ok(response) => response,
            Err(transport) => return Err(self.diagnose(&transport).await),
        };
        match response.status_code {
            401 => Err(KiteError::bad_state(HealthState::Unlogged, "request requires a logged-in user")),
            403 => Err(KiteError::bad_state(
                HealthState::NotWhitelisted,
                format!("{} is not whitelisted", options.path),
            )),
            status if status >= 400 => Err(KiteError::from_response(response)),
            _ => Ok(response),
        }
    }

    async fn diagnose(&self, transport: &TransportError) -> KiteError {
        debug!(error = %transport, "transport failure, diagnosing");
        let checks = async {
            self.is_kite_supported().await?;
            self.is_kite_installed().await?;
            self.is_kite_running().await
        };
        match checks.await {
            Ok(()) => KiteError::bad_state(HealthState::Unreachable, transport.to_string()),
            Err(e) => e,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Resolves if the platform is supported and Kite is not installed.
    ///
    /// # Errors
    /// Fails with [`HealthState::Unsupported`], or with
    /// [`HealthState::INSTALLED`] when already installed.
    pub async fn can_install_kite(&self) -> Result<()> {
        self.is_kite_supported().await?;
        let adapter = self.adapter();
        negate(
            adapter.is_installed(Edition::Community),
            KiteError::bad_state(HealthState::INSTALLED, "kite is already installed"),
            (),
        )
        .await
    }

    /// Resolves if Kite is installed and not running.
    ///
    /// # Errors
    /// Fails with the install check's error, or with
    /// [`HealthState::RUNNING`] when already running.
    pub async fn can_run_kite(&self) -> Result<()> {
        self.can_run(Edition::Community).await
    }

    /// Resolves if Kite Enterprise is installed and not running.
    ///
    /// # Errors
    /// See [`can_run_kite`](Self::can_run_kite).
    pub async fn can_run_kite_enterprise(&self) -> Result<()> {
        self.can_run(Edition::Enterprise).await
    }

    async fn can_run(&self, edition: Edition) -> Result<()> {
        let adapter = self.adapter();
        adapter.is_installed(edition).await?;
        negate(
            adapter.is_running(edition),
            KiteError::bad_state(HealthState::RUNNING, format!("kite {edition} is already running")),
            (),
        )
        .await
    }

    /// Installs the downloaded release.
    ///
    /// # Errors
    /// Returns the adapter's install error.
    pub async fn install_kite(&self, options: &InstallOptions) -> Result<()> {
        info!("installing kite");
        self.adapter().install(options).await
    }

    /// Downloads an installer from `url`.
    ///
    /// # Errors
    /// Returns the adapter's download error.
    pub async fn download_kite(&self, url: &str, options: &InstallOptions) -> Result<()> {
        info!(url, "downloading kite");
        self.adapter().download(url, options).await
    }

    /// Downloads the current release for this platform.
    ///
    /// # Errors
    /// Returns the adapter's download error.
    pub async fn download_kite_release(&self, options: &InstallOptions) -> Result<()> {
        info!("downloading kite release");
        self.adapter().download_release(options).await
    }

    /// Launches Kite.
    ///
    /// # Errors
    /// Returns the adapter's launch error.
    pub async fn run_kite(&self, options: &RunOptions) -> Result<()> {
        info!(edition = %Edition::Community, "starting kite");
        self.adapter().run(Edition::Community, options).await
    }

    /// Launches Kite Enterprise.
    ///
    /// # Errors
    /// Returns the adapter's launch error.
    pub async fn run_kite_enterprise(&self, options: &RunOptions) -> Result<()> {
        info!(edition = %Edition::Enterprise, "starting kite");
        self.adapter().run(Edition::Enterprise, options).await
    }

    /// Launches Kite, then waits for it to become reachable.
    ///
    /// # Errors
    /// Returns the launch error or the last reachability error.
    pub async fn run_kite_and_wait(&self, options: &RunOptions, attempts: u32, interval: Duration) -> Result<()> {
        self.run_kite(options).await?;
        self.wait_for_kite(attempts, interval).await
    }

    /// Launches Kite Enterprise, then waits for it to become reachable.
    ///
    /// # Errors
    /// Returns the launch error or the last reachability error.
    pub async fn run_kite_enterprise_and_wait(
        &self,
        options: &RunOptions,
        attempts: u32,
        interval: Duration,
    ) -> Result<()> {
        self.run_kite_enterprise(options).await?;
        self.wait_for_kite(attempts, interval).await
    }
}

impl std::fmt::Debug for KiteConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteConnector")
            .field("platform", &self.adapter().platform())
            .field("config", &self.config)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

fn build_client(config: &ConnectorConfig, debug: bool) -> std::result::Result<Arc<dyn KiteClient>, ConfigError> {
    let http = HttpClient::from_config(config)?;
    if debug {
        Ok(Arc::new(TracingClient::new(http)))
    } else {
        Ok(Arc::new(http))
    }
}

/// Picks the error to report when every edition check failed.
///
/// A non-state error is never replaced by a state: the first one wins. When
/// every error is a state error, the one closest to ready wins.
fn most_advanced(errors: Vec<KiteError>, fallback: HealthState) -> KiteError {
    let chosen = errors.iter().position(|e| e.state().is_none()).unwrap_or_else(|| {
        errors
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.state().map(|s| (s, Reverse(i))))
            .max()
            .map_or(0, |(_, Reverse(i))| i)
    });
    let mut kept = None;
    for (i, e) in errors.into_iter().enumerate() {
        if i == chosen {
            kept = Some(e);
        } else {
            debug!(error = %e, "discarding edition check error");
        }
    }
    kept.unwrap_or_else(|| KiteError::bad_state(fallback, "no edition check ran"))
}
