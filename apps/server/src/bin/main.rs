//! Pagedriver server binary entry point.
//!
//! Loads the user directory and the JSON configuration document, validates
//! it into a driver, and runs the axum server with graceful shutdown on
//! ctrl-c.

use anyhow::Result;
use clap::Parser;
use driver::Driver;
use pagedriver_server::{AppState, Registry, UserDirectory, document};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

/// Serve pages through the page driver.
#[derive(Debug, Parser)]
#[command(name = "pagedriver", version, about)]
struct Cli {
    /// Configuration document (JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// User directory (JSON) providing the `credentials` and `levels`
    /// callbacks.
    #[arg(short, long)]
    users: Option<PathBuf>,

    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Seconds a session may stay idle before it is dropped.
    #[arg(long, default_value_t = 3600)]
    idle: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG (default: info).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let cli = Cli::parse();

    let mut registry = Registry::default();
    if let Some(path) = &cli.users {
        let directory = UserDirectory::load(path)?;
        tracing::info!("loaded {} users from {}", directory.len(), path.display());
        registry.extend(Arc::new(directory).registry());
    }

    let doc = document::load(&cli.config, &registry)?;
    let driver = Driver::from_value(&doc)?;
    tracing::info!(
        "loaded configuration from {} ({} routes, auth {})",
        cli.config.display(),
        driver.config().routes.len(),
        if driver.config().requires_auth() { "on" } else { "off" }
    );

    pagedriver_server::serve(
        AppState::new(driver),
        &cli.bind,
        Duration::from_secs(cli.idle),
    )
    .await
}
