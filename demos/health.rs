// Demos are allowed to use expect/unwrap for simplicity
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Kite Health Demo
//!
//! Reports the daemon's health on this machine and optionally starts it.
//!
//! # Usage
//!
//! ```bash
//! # Print the current health state
//! cargo run --example health
//!
//! # Start Kite if it is installed but stopped, then wait for it
//! cargo run --example health -- --run
//!
//! # Read connector settings from a TOML file
//! cargo run --example health -- --config kite.toml
//!
//! # Log every request
//! RUST_LOG=kite_core=debug cargo run --example health -- --debug
//! ```

use std::time::Duration;

use kite_connect::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Kite Health Demo");
        println!();
        println!("Usage: health [OPTIONS]");
        println!();
        println!("Options:");
        println!("  --run            Start Kite if it is installed but not running");
        println!("  --config <FILE>  Load connector settings from a TOML file");
        println!("  --debug          Log every request and response");
        println!("  -h, --help       Print this help");
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match args.iter().position(|a| a == "--config") {
        Some(i) => ConnectorConfig::load(args.get(i + 1).expect("--config needs a path"))?,
        None => ConnectorConfig::default(),
    };
    if args.iter().any(|a| a == "--debug") {
        config = config.with_request_debug(true);
    }

    let kite = connector_for_current_platform(config)?;
    let adapter = kite.adapter();
    println!("platform:  {} ({})", adapter.platform(), adapter.arch());
    println!("admin:     {}", adapter.is_admin().await);
    for edition in Edition::ALL {
        let paths = adapter.install_paths(edition).await;
        println!("{:<10} {paths:?}", edition.name());
    }

    let _sub = kite.on_did_fail_request(|e| eprintln!("request failed: {e}"));

    let mut state = kite.check_health().await?;
    println!("health:    {state}");

    if args.iter().any(|a| a == "--run") && state == HealthState::NotRunning {
        println!("starting kite...");
        kite.run_kite_and_wait(&RunOptions::default(), 20, Duration::from_millis(500))
            .await?;
        state = kite.check_health().await?;
        println!("health:    {state}");
    }

    if state == HealthState::Ready {
        let user = kite.is_user_authenticated().await?;
        println!("user:      {user}");
    }
    Ok(())
}
