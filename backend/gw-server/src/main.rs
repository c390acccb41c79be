use gw_server::startup::{load_keys, start_key_watcher};
use gw_server::{GatewayState, ShutdownCoordinator, build_router, logger};

use gw_auth::{KeyStore, RateLimiterFactory, RedisBucketStore};

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use tokio::net::TcpListener;

const BUCKET_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // Load and validate configuration
    let config = gw_config::Config::load()?;
    config.validate()?;

    // Initialize logger (before any other logging)
    logger::initialize(
        config.logging.level,
        config.log_file_path()?,
        config.logging.colored,
    )?;

    info!("Starting gw-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let key_store = Arc::new(KeyStore::new());
    let key_path = config.key_store_path()?;
    load_keys(&key_store, &key_path);

    let watcher = if config.key_store.watch {
        start_key_watcher(Arc::clone(&key_store), &key_path)
    } else {
        info!("Key file watching disabled");
        None
    };

    // Rate limit buckets are shared through Redis when configured
    let factory = match &config.rate_limit_store.redis_url {
        Some(url) => RateLimiterFactory::with_store(
            Arc::new(RedisBucketStore::new(url)?),
            Duration::from_millis(config.rate_limit_store.timeout_ms),
        ),
        None => RateLimiterFactory::new(),
    };

    let state = GatewayState::from_routes(&config.routes, key_store, &factory)?;
    info!("{} routes configured", state.guards.len());

    let shutdown = ShutdownCoordinator::new();

    // Periodically drop idle local buckets
    let state_for_sweep = state.clone();
    let mut sweep_guard = shutdown.subscribe_guard();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(BUCKET_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => state_for_sweep.retain_recent(),
                _ = sweep_guard.wait() => break,
            }
        }
    });

    let app = build_router(state);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    let actual_addr = listener.local_addr()?;
    info!("Server listening on {}", actual_addr);

    // Spawn signal handler for graceful shutdown
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                shutdown_for_signal.shutdown();
            }
            Err(e) => {
                error!("Failed to listen for SIGINT: {}", e);
            }
        }
    });

    info!("Server ready to accept connections");
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown.subscribe_guard().wait().await;
        info!("Graceful shutdown complete");
    })
    .await;

    // Release the watch even when the server failed
    if let Some(watcher) = watcher {
        watcher.shutdown().await;
    }

    served?;
    Ok(())
}
