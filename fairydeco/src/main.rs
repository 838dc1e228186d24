mod server;

use anyhow::Result;
use tracing::info;

use fairydeco_core::{bootstrap::load_config, logging, CompletionBroker};

use server::FairyDecoServer;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load and validate configuration
    let config = load_config()?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("FairyDeco server starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Build the completion broker shared by both book endpoints
    let broker = CompletionBroker::new(config.notification.broker_config());
    info!(
        idle_timeout_seconds = config.notification.idle_timeout_seconds,
        close_superseded = config.notification.close_superseded,
        "Completion broker initialized"
    );

    // 4. Serve until shutdown
    FairyDecoServer::new(config, broker).start().await
}
