mod app;
mod config;
mod routes;

use anyhow::Context;
use clap::Parser;

use crate::app::App;
use crate::config::Cli;

/// Trains the models, opens the sensor and serves the dashboard.
///
/// Startup happens before the async runtime exists, so the blocking training and serial settle
/// time never stall request handling.
fn main() -> anyhow::Result<()> {
    // Initialize logging, `info` unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse the command line and environment
    let config = Cli::parse().into_config();
    log::debug!("Configuration: {config:?}");

    // Train the models and open the sensor (and map an error to an anyhow::Error)
    let app = App::new(config).context("dashboard startup failed")?;

    // Run the dashboard on a fresh tokio runtime
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app.run())
}
