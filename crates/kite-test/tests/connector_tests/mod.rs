//! Connector behavior, grouped by concern.

// Allow test-specific patterns that are denied in production code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod health;
mod http;
mod lifecycle;
mod listeners;
mod platform;
mod requests;
