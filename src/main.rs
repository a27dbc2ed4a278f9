//! Refresh Cache host
//!
//! Runs a cache service with its background sweeper until the process is
//! asked to stop.

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use refresh_cache::{CacheService, Config};

/// Main entry point for the cache host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build the cache service (backend, engine, sweeper)
/// 4. Start the sweeper
/// 5. Wait for SIGINT/SIGTERM, then stop the sweeper and report stats
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "refresh_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Refresh Cache host");

    let config = Config::from_env();
    info!(
        "Configuration loaded: backend={}, check_interval={:?}, initial_capacity={}, default_ttl={:?}",
        config.backend, config.check_interval, config.initial_capacity, config.default_ttl
    );

    let service = CacheService::<String>::from_config(&config)
        .context("failed to build cache service")?;
    service.start().context("failed to start cache sweeper")?;

    shutdown_signal().await?;

    service.stop().await;

    let stats = serde_json::to_string(&service.stats())?;
    info!(stats = %stats, "Cache host shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> anyhow::Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<anyhow::Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Received Ctrl+C, initiating shutdown...");
        }
        result = terminate => {
            result?;
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
    Ok(())
}
