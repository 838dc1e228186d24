//! Server lifecycle management
//!
//! Starts the HTTP server and drives graceful shutdown. Open book
//! subscriptions are closed before the HTTP server drains, otherwise the
//! long-lived event streams would keep it waiting forever.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use fairydeco_api::{create_router, AppState};
use fairydeco_core::{CompletionBroker, Config};

/// How long to wait for in-flight requests after the shutdown signal
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// `FairyDeco` server - owns the HTTP listener and the completion broker
pub struct FairyDecoServer {
    config: Config,
    broker: CompletionBroker,
}

impl FairyDecoServer {
    /// Create a new server instance
    pub const fn new(config: Config, broker: CompletionBroker) -> Self {
        Self { config, broker }
    }

    /// Start the HTTP server and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut http_handle = self.start_http_server(shutdown_rx).await?;

        tokio::select! {
            _ = &mut http_handle => {
                error!("HTTP server stopped unexpectedly");
                return Err(anyhow::anyhow!("HTTP server stopped unexpectedly"));
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        // Stop accepting, then end every pending event stream so connections can drain.
        // Subscribes still in flight after this see a closed broker and end at once.
        let _ = shutdown_tx.send(true);
        let closed = self.broker.close_all();
        info!(closed, "Pending book subscriptions closed");

        match tokio::time::timeout(DRAIN_TIMEOUT, http_handle).await {
            Ok(Ok(())) => info!("FairyDeco server shut down complete"),
            Ok(Err(e)) => error!("HTTP server task failed: {}", e),
            Err(_) => warn!(
                "Drain timeout of {}s reached, exiting with connections still open",
                DRAIN_TIMEOUT.as_secs()
            ),
        }

        Ok(())
    }

    /// Bind the listener and spawn the HTTP server with graceful shutdown support
    async fn start_http_server(
        &self,
        shutdown_rx: watch::Receiver<bool>,
    ) -> anyhow::Result<JoinHandle<()>> {
        let http_address = self.config.http_address();
        let http_addr: std::net::SocketAddr = http_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid HTTP address '{http_address}': {e}"))?;

        let listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind HTTP address {http_addr}: {e}"))?;

        let router = create_router(AppState::new(
            self.broker.clone(),
            self.config.notification.clone(),
        ));

        info!("HTTP server listening on {}", http_addr);

        let handle = tokio::spawn(async move {
            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", e);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
