//! kite-connect: Kite daemon connector for editor plugins.
//!
//! Detects whether the local Kite daemon is supported, installed, running,
//! reachable and logged in, and installs or launches it when it is not.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kite_connect::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let kite = connector_for_current_platform(ConnectorConfig::default())?;
//! match kite.check_health().await? {
//!     HealthState::Ready => println!("kite is ready"),
//!     HealthState::NotRunning => kite.run_kite(&RunOptions::default()).await?,
//!     state => println!("kite is {state}"),
//! }
//! # Ok(())
//! # }
//! ```

pub use kite_core as core;
pub use kite_platform as platform;

/// Prelude module for common imports.
pub mod prelude {
    pub use kite_core::{
        ConnectorConfig, Edition, ErrorKind, HealthState, InstallOptions, InstallStep, KiteAdapter,
        KiteClient, KiteConnector, KiteError, RequestOptions, Response, RunOptions, Subscription,
    };
    pub use kite_platform::{
        Platform, connector_for_current_platform, detect_platform, select_adapter,
    };
}
