#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # kite-core
//!
//! Health reconciliation for the local Kite daemon.
//!
//! This crate provides the platform-independent half of the connector:
//!
//! - [`HealthState`], the ordered readiness ladder of the daemon
//! - [`KiteError`] with its [`ErrorKind`] discriminant
//! - [`KiteAdapter`], implemented once per operating system
//! - [`KiteClient`] and the reqwest-backed [`HttpClient`]
//! - [`KiteConnector`], which runs the health pipeline and guards requests
//!
//! ## Example
//!
//! ```rust,ignore
//! use kite_core::{ConnectorConfig, HealthState, KiteConnector};
//!
//! let kite = KiteConnector::from_config(adapter, ConnectorConfig::default())?;
//! if kite.check_health().await? == HealthState::NotRunning {
//!     kite.run_kite_and_wait(&Default::default(), 10, Duration::from_millis(500)).await?;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

pub mod adapter;
pub mod client;
pub mod combinators;
pub mod config;
pub mod connector;
pub mod error;
pub mod events;
pub mod platform;
pub mod state;

pub use adapter::{DEFAULT_CHANNEL, InstallOptions, InstallStep, KiteAdapter, RunOptions};
pub use client::{
    Cookie, CookieJar, HttpClient, KiteClient, Method, RequestOptions, Response, TracingClient,
    TransportError,
};
pub use combinators::{any_ok, negate, retry};
pub use config::{ConfigError, ConnectorConfig, DEFAULT_PORT};
pub use connector::KiteConnector;
pub use error::{ErrorKind, KiteError, ProcessFailure, Result};
pub use events::{FailureListeners, Subscription};
pub use platform::{Platform, detect_platform};
pub use state::{Edition, HealthState};
