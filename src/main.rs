use anyhow::Result;
use tokio::sync::broadcast;

use sunspec_export::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let options = Options::new();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
        if let Err(e) = shutdown_tx_clone.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    });

    if let Err(e) = sunspec_export::app(shutdown_rx, options).await {
        error!("Application error: {:#}", e);
        eprintln!("Application error: {:#}", e);
        std::process::exit(255);
    }

    Ok(())
}
