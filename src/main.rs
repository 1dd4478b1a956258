// src/main.rs

//! The main entry point for the opsrelay daemon.

use anyhow::Result;
use opsrelay::config::Config;
use opsrelay::server;
use std::env;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    const VERSION: &str = env!("OPSRELAY_VERSION");

    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.iter().any(|arg| arg == "--version") {
        println!("opsrelay version {VERSION}");
        return Ok(());
    }

    // Load the configuration from the environment. The relay cannot run
    // without its credential and principal, so a failure here is fatal.
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    // Get the log filter from RUST_LOG, falling back to the configured level.
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());

    tracing_subscriber::registry()
        .with(EnvFilter::new(log_filter))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true), // Enable ANSI color codes for log levels.
        )
        .init();

    info!("Starting opsrelay {VERSION}");

    if let Err(e) = server::run(config).await {
        error!("Relay runtime error: {:#}", e);
        return Err(e);
    }

    Ok(())
}
