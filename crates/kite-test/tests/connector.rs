//! Behavioral tests for the Kite connector.
//!
//! Every test drives a real `KiteConnector` through the scripted adapter
//! and transport from this crate, or against a local mock HTTP server.

mod connector_tests;
