//! gradebook service entry point.
//!
//! Loads configuration (TOML file plus environment), initializes
//! tracing, and runs the HTTP server until shutdown.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use gradebook_core::Config;
use gradebook_server::run_server;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::var_os("GRADEBOOK_CONFIG").map(PathBuf::from);
    let config = Config::load(config_path.as_deref())
        .context("failed to load configuration")?;

    run_server(config).await.context("server exited with error")
}
