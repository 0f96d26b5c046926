//! Turnstile server binary: wires the counter store, queue, worker pool,
//! and admission endpoints, then serves until interrupted.

use std::sync::Arc;

use turnstile::config::EngineConfig;
use turnstile::core::{AppResult, Catalog, SEAT_POOL_KEY};
use turnstile::http::{build_router, AppState};
use turnstile::pubsub::{run_listener, Broadcast, RedisBroadcast, DEFAULT_CHANNEL};
use turnstile::queue::{InMemoryJobQueue, JobQueue, RedisJobQueue};
use turnstile::store::{CounterStore, InMemoryStore, RedisStore};
use turnstile::util::telemetry::init_tracing;

#[tokio::main]
async fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = EngineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Prefer the configured store; a connection failure is logged and the
    // process falls back to in-memory backends rather than refusing to start.
    let (store, queue): (Arc<dyn CounterStore>, Arc<dyn JobQueue>) =
        match RedisStore::connect(&config.store.url).await {
            Ok(redis_store) => {
                tracing::info!("counter store connected at {}", config.store.url);
                let redis_queue =
                    RedisJobQueue::connect(&config.store.url, config.queue.max_depth).await?;
                spawn_channel_listener(&config.store.url).await;
                (
                    Arc::new(redis_store) as Arc<dyn CounterStore>,
                    Arc::new(redis_queue) as Arc<dyn JobQueue>,
                )
            }
            Err(e) => {
                tracing::warn!(
                    "counter store not connected to the server: {}; using in-memory backends",
                    e
                );
                (
                    Arc::new(InMemoryStore::new()) as Arc<dyn CounterStore>,
                    Arc::new(InMemoryJobQueue::new(config.queue.max_depth)) as Arc<dyn JobQueue>,
                )
            }
        };

    // Fresh committed counter for the seat pool on startup. A store that
    // connected but cannot be written is logged, not fatal.
    if let Err(e) = store.write(SEAT_POOL_KEY, 0).await {
        tracing::error!("failed to seed the seat counter: {}", e);
    }

    let catalog = Catalog::new(config.seats.capacity, Catalog::builtin_products());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, store, queue, catalog);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server running on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Background subscriber on the engine's broadcast channel; terminates on
/// the kill sentinel like any other listener.
async fn spawn_channel_listener(url: &str) {
    match RedisBroadcast::connect(url).await {
        Ok(bus) => match bus.subscribe(DEFAULT_CHANNEL).await {
            Ok(subscription) => {
                tokio::spawn(async move {
                    run_listener(subscription).await;
                    tracing::info!("channel listener terminated by sentinel");
                });
            }
            Err(e) => tracing::warn!("channel subscription failed: {}", e),
        },
        Err(e) => tracing::warn!("broadcast transport not connected: {}", e),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
