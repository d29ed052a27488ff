pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Relay service module
mod utils;

use anyhow::Context;
use modules::logger;
use tracing::{error, info};

/// Load configuration, serve until Ctrl-C, then shut down
pub async fn run() -> anyhow::Result<()> {
    let config = modules::config::load_app_config().context("Failed to load configuration")?;

    // Initialize logger
    logger::init_logger(config.file_logging);

    config
        .proxy
        .validate()
        .context("Invalid relay configuration")?;

    let (server, handle) = proxy::AxumServer::start(config.proxy)
        .await
        .context("Failed to start relay server")?;

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    server.stop();
    handle.await.context("Relay server task panicked")?;
    info!("Relay shut down");
    Ok(())
}
