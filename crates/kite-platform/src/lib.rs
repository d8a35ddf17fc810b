#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # kite-platform
//!
//! Operating system adapters for the Kite daemon connector.
//!
//! - **macOS**: Spotlight lookup, `.dmg` install, `open -a` launch
//! - **Windows**: registry lookup, `KiteSetup.exe` install, detached `kited.exe`
//! - **Linux**: opt-in flag, `.deb` install through `apt`, detached `kited`
//! - **Unsupported** (fallback): every check reports `UNSUPPORTED`
//!
//! Every adapter compiles on every host so its parsing and path logic can be
//! tested anywhere; [`select_adapter`] picks the one matching the build
//! target.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kite_platform::connector_for_current_platform;
//!
//! let kite = connector_for_current_platform(ConnectorConfig::default())?;
//! println!("{}", kite.check_health().await?);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod detect;
pub mod download;
pub mod process;
pub mod unsupported;

#[cfg(feature = "linux")]
pub mod linux;

#[cfg(feature = "macos")]
pub mod macos;

#[cfg(feature = "windows")]
pub mod windows;

pub use detect::{Platform, detect_platform};
pub use download::{download_and_install, stream_download};
pub use process::{CommandSpec, run_command, spawn_detached};
pub use unsupported::UnsupportedAdapter;

#[cfg(feature = "linux")]
pub use linux::LinuxAdapter;
#[cfg(feature = "macos")]
pub use macos::MacOsAdapter;
#[cfg(feature = "windows")]
pub use windows::WindowsAdapter;

use kite_core::{ConfigError, ConnectorConfig, KiteAdapter, KiteConnector};
use std::sync::Arc;
use tracing::debug;

/// Returns the adapter for `platform`.
///
/// Falls back to [`UnsupportedAdapter`] when the platform has no adapter or
/// its feature is disabled.
#[must_use]
pub fn select_adapter(platform: Platform) -> Arc<dyn KiteAdapter> {
    debug!(%platform, "selecting adapter");
    match platform {
        #[cfg(feature = "macos")]
        Platform::MacOS => Arc::new(MacOsAdapter::new()),
        #[cfg(feature = "windows")]
        Platform::Windows => Arc::new(WindowsAdapter::new()),
        #[cfg(feature = "linux")]
        Platform::Linux => Arc::new(LinuxAdapter::new()),
        _ => Arc::new(UnsupportedAdapter),
    }
}

/// Returns the adapter for the build target.
#[must_use]
pub fn select_adapter_auto() -> Arc<dyn KiteAdapter> {
    select_adapter(detect_platform())
}

/// Builds a connector for the build target from `config`.
///
/// # Errors
/// Returns a config error if `config` is invalid or the HTTP client cannot
/// be built.
pub fn connector_for_current_platform(config: ConnectorConfig) -> Result<KiteConnector, ConfigError> {
    KiteConnector::from_config(select_adapter_auto(), config)
}
