#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # kite-test
//!
//! Test doubles for the Kite daemon connector.
//!
//! This crate provides:
//! - **[`KiteSetup`]**: declarative daemon state with implied facts filled in
//! - **[`TestAdapter`]**: adapter answering from that state and recording calls
//! - **[`TestClient`]**: routed in-memory transport with a 404 fallback
//! - **[`KiteTestHarness`]**: a connector wired to both
//!
//! ## Example
//!
//! ```rust,ignore
//! use kite_test::{KiteSetup, with_kite};
//!
//! let kite = with_kite(KiteSetup::new().running(true));
//! assert_eq!(kite.connector.check_health().await?, HealthState::Unreachable);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod client;
pub mod harness;
pub mod setup;

pub use adapter::{AdapterCall, CheckFailure, TestAdapter};
pub use client::{RecordedRequest, TestClient, fake_response};
pub use harness::{KiteTestHarness, TEST_USER, with_kite};
pub use setup::{KiteSetup, KiteState};
