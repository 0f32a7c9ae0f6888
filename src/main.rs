//! rqcache node
//!
//! Runs one cache node serving a demo `scores` group to its peers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rqcache::{create_router, AppState, Config, Getter, GetterFn, GroupRegistry, HttpPool};

/// Main entry point for a cache node.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Register the demo group
/// 4. Build the peer pool and hand it to the group
/// 5. Start HTTP server on configured port
/// 6. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rqcache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rqcache node");

    let config = Config::from_env();
    info!(
        "Configuration loaded: node={}, peers={:?}, cache_bytes={}, replicas={}, port={}",
        config.node_addr, config.peers, config.cache_bytes, config.replicas, config.server_port
    );

    let registry = GroupRegistry::new();
    let scores = registry.new_group("scores", config.cache_bytes, demo_getter())?;

    let pool = Arc::new(HttpPool::with_options(
        config.node_addr.clone(),
        config.pool_options(),
    ));
    pool.set_peers(config.peers.clone());
    scores.register_peers(pool.clone())?;

    let app = create_router(AppState::new(registry), pool.base_path());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("rqcache is running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Node shutdown complete");
    Ok(())
}

/// Slow-database stand-in backing the `scores` group.
fn demo_getter() -> Arc<dyn Getter> {
    let db: HashMap<&'static str, &'static str> =
        HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]);

    Arc::new(GetterFn(move |key: String| {
        info!("[SlowDB] search key {}", key);
        std::future::ready(
            db.get(key.as_str())
                .map(|v| v.as_bytes().to_vec())
                .ok_or_else(|| anyhow::anyhow!("{} not exist", key)),
        )
    }))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
